use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::io::recovery::atomic_write;
use crate::model::{IdGenerator, ImageConfig};

#[derive(Debug, thiserror::Error)]
pub enum ImageIoError {
    #[error("unsupported image format '{0}'")]
    UnsupportedFormat(String),
    #[error("image is too large ({size} bytes, max {max})")]
    TooLarge { size: u64, max: u64 },
    #[error("image path '{0}' is outside the data directory")]
    OutsideRoot(String),
    #[error("image io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Image files referenced by `Food.image_url`.
pub trait ImageStore {
    /// Store the bytes and return the path to put in `image_url`.
    fn save(&mut self, bytes: &[u8], original_name: &str) -> Result<String, ImageIoError>;
    /// Remove a stored image. Deleting a path that does not exist succeeds.
    fn delete(&mut self, path: &str) -> Result<(), ImageIoError>;
}

/// Embedded `data:` URIs are part of the document, not files.
pub fn is_inline_image(url: &str) -> bool {
    url.trim_start().starts_with("data:")
}

/// Whether a url refers to a stored file that deleting its food should remove.
pub fn is_stored_image(url: &str) -> bool {
    !url.trim().is_empty() && !is_inline_image(url)
}

fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

// ---------------------------------------------------------------------------
// Filesystem
// ---------------------------------------------------------------------------

/// Images stored as `<images_dir>/food_<millis>.<ext>` under the data directory.
#[derive(Debug)]
pub struct FsImageStore {
    root: PathBuf,
    images_dir: String,
    config: ImageConfig,
    ids: IdGenerator,
}

impl FsImageStore {
    pub fn new(root: impl Into<PathBuf>, images_dir: impl Into<String>, config: ImageConfig) -> Self {
        FsImageStore {
            root: root.into(),
            images_dir: images_dir.into(),
            config,
            ids: IdGenerator::new(),
        }
    }

    /// Resolve a relative image path, refusing anything that could escape
    /// the data directory.
    fn resolve(&self, path: &str) -> Result<PathBuf, ImageIoError> {
        let rel = Path::new(path);
        let escapes = rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if path.trim().is_empty() || escapes {
            return Err(ImageIoError::OutsideRoot(path.to_string()));
        }
        Ok(self.root.join(rel))
    }
}

impl ImageStore for FsImageStore {
    fn save(&mut self, bytes: &[u8], original_name: &str) -> Result<String, ImageIoError> {
        let ext = extension_of(original_name).unwrap_or_default();
        if !self.config.supported_formats.iter().any(|f| f.eq_ignore_ascii_case(&ext)) {
            return Err(ImageIoError::UnsupportedFormat(ext));
        }
        let size = bytes.len() as u64;
        if size > self.config.max_file_size {
            return Err(ImageIoError::TooLarge {
                size,
                max: self.config.max_file_size,
            });
        }

        let dir = self.root.join(&self.images_dir);
        std::fs::create_dir_all(&dir)?;
        let mut name = format!("food_{}.{}", self.ids.next(), ext);
        while dir.join(&name).exists() {
            name = format!("food_{}.{}", self.ids.next(), ext);
        }
        atomic_write(&dir.join(&name), bytes)?;
        let rel = format!("{}/{}", self.images_dir, name);
        debug!(path = %rel, size, "image saved");
        Ok(rel)
    }

    fn delete(&mut self, path: &str) -> Result<(), ImageIoError> {
        let full = self.resolve(path)?;
        match std::fs::remove_file(&full) {
            Ok(()) => {
                debug!(path, "image deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
