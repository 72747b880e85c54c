use std::fs;
use std::path::{Path, PathBuf};

use crate::model::LarderConfig;

pub const CONFIG_FILE: &str = "larder.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse larder.toml: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Read `larder.toml` from the data directory. A missing file means all
/// defaults.
pub fn read_config(data_dir: &Path) -> Result<LarderConfig, ConfigError> {
    let path = data_dir.join(CONFIG_FILE);
    let text = match fs::read_to_string(&path) {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(LarderConfig::default()),
        Err(e) => return Err(ConfigError::Read { path, source: e }),
    };
    Ok(toml::from_str(&text)?)
}
