use std::fs;
use std::path::{Path, PathBuf};

use crate::io::catalog_io::JsonFileStore;
use crate::io::config_io::{self, CONFIG_FILE, ConfigError};
use crate::io::image_store::FsImageStore;
use crate::model::LarderConfig;

/// Name of the directory holding the catalog, its config and images
pub const DATA_DIR_NAME: &str = "larder";

#[derive(Debug, thiserror::Error)]
pub enum DataDirError {
    #[error("no larder/ directory found (run `larder init`)")]
    NotFound,
    #[error("{0} already exists")]
    AlreadyExists(PathBuf),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Walk up from `start` to the first directory containing `larder/`.
/// Returns the path of the `larder/` directory itself.
pub fn discover_data_dir(start: &Path) -> Result<PathBuf, DataDirError> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(DATA_DIR_NAME);
        if candidate.is_dir() {
            return Ok(candidate);
        }
        if !current.pop() {
            return Err(DataDirError::NotFound);
        }
    }
}

/// Create `root/larder/` with a config file and an empty catalog.
pub fn init_data_dir(root: &Path, config_text: &str) -> Result<PathBuf, DataDirError> {
    let dir = root.join(DATA_DIR_NAME);
    if dir.exists() {
        return Err(DataDirError::AlreadyExists(dir));
    }
    fs::create_dir_all(&dir)?;
    fs::write(dir.join(CONFIG_FILE), config_text)?;
    let config = config_io::read_config(&dir)?;
    fs::write(
        dir.join(&config.storage.data_file),
        "{\n  \"foods\": [],\n  \"tags\": [],\n  \"categories\": []\n}\n",
    )?;
    Ok(dir)
}

/// An opened data directory and its configuration.
#[derive(Debug, Clone)]
pub struct DataDir {
    pub path: PathBuf,
    pub config: LarderConfig,
}

impl DataDir {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DataDirError> {
        let path = path.into();
        let config = config_io::read_config(&path)?;
        Ok(DataDir { path, config })
    }

    pub fn discover(start: &Path) -> Result<Self, DataDirError> {
        DataDir::open(discover_data_dir(start)?)
    }

    pub fn catalog_store(&self) -> JsonFileStore {
        JsonFileStore::new(&self.path, &self.config.storage.data_file)
    }

    pub fn image_store(&self) -> FsImageStore {
        FsImageStore::new(
            &self.path,
            &self.config.storage.images_dir,
            self.config.images.clone(),
        )
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.path.join(&self.config.storage.backups_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn init_then_discover_from_subdirectory() {
        let tmp = TempDir::new().unwrap();
        let dir = init_data_dir(tmp.path(), "").unwrap();
        assert!(dir.join("data.json").exists());
        assert!(dir.join(CONFIG_FILE).exists());

        let nested = tmp.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        assert_eq!(discover_data_dir(&nested).unwrap(), dir);
    }

    #[test]
    fn init_refuses_existing_dir() {
        let tmp = TempDir::new().unwrap();
        init_data_dir(tmp.path(), "").unwrap();
        assert!(matches!(
            init_data_dir(tmp.path(), ""),
            Err(DataDirError::AlreadyExists(_))
        ));
    }

    #[test]
    fn discover_fails_without_data_dir() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(discover_data_dir(tmp.path()), Err(DataDirError::NotFound)));
    }

    #[test]
    fn open_honors_storage_config() {
        let tmp = TempDir::new().unwrap();
        let dir = init_data_dir(tmp.path(), "[storage]\ndata_file = \"pantry.json\"\nbackups_dir = \"bk\"\n")
            .unwrap();
        assert!(dir.join("pantry.json").exists());
        let data = DataDir::open(&dir).unwrap();
        assert_eq!(data.catalog_store().path(), dir.join("pantry.json"));
        assert_eq!(data.backups_dir(), dir.join("bk"));
    }
}
