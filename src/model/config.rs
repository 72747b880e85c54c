use serde::{Deserialize, Serialize};

/// Configuration from larder.toml. Every key is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LarderConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub images: ImageConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// File names inside the data directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_file")]
    pub data_file: String,
    #[serde(default = "default_images_dir")]
    pub images_dir: String,
    #[serde(default = "default_backups_dir")]
    pub backups_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            data_file: default_data_file(),
            images_dir: default_images_dir(),
            backups_dir: default_backups_dir(),
        }
    }
}

/// Length and count limits checked before any mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_food_name_max")]
    pub food_name_max: usize,
    #[serde(default = "default_tag_name_max")]
    pub tag_name_max: usize,
    #[serde(default = "default_max_tags_per_food")]
    pub max_tags_per_food: usize,
    #[serde(default = "default_max_total_tags")]
    pub max_total_tags: usize,
    #[serde(default = "default_max_total_foods")]
    pub max_total_foods: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        ValidationConfig {
            food_name_max: default_food_name_max(),
            tag_name_max: default_tag_name_max(),
            max_tags_per_food: default_max_tags_per_food(),
            max_total_tags: default_max_total_tags(),
            max_total_foods: default_max_total_foods(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Lowercase file extensions accepted by the image store
    #[serde(default = "default_supported_formats")]
    pub supported_formats: Vec<String>,
    /// Maximum image size in bytes
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

impl Default for ImageConfig {
    fn default() -> Self {
        ImageConfig {
            supported_formats: default_supported_formats(),
            max_file_size: default_max_file_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// One of "error", "warn", "info", "debug", "trace"
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: default_log_level(),
        }
    }
}

fn default_data_file() -> String {
    "data.json".to_string()
}

fn default_images_dir() -> String {
    "images".to_string()
}

fn default_backups_dir() -> String {
    "backups".to_string()
}

fn default_food_name_max() -> usize {
    100
}

fn default_tag_name_max() -> usize {
    50
}

fn default_max_tags_per_food() -> usize {
    10
}

fn default_max_total_tags() -> usize {
    100
}

fn default_max_total_foods() -> usize {
    1000
}

fn default_supported_formats() -> Vec<String> {
    ["jpg", "jpeg", "png", "gif", "webp"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// 5 MB
fn default_max_file_size() -> u64 {
    5 * 1024 * 1024
}

fn default_log_level() -> String {
    "warn".to_string()
}
