use std::path::Path;

use crate::io::data_dir;

const LARDER_TOML_TEMPLATE: &str = r##"# larder configuration. Every key is optional; the values below are the
# defaults.

[storage]
# data_file = "data.json"
# images_dir = "images"
# backups_dir = "backups"

[validation]
# food_name_max = 100
# tag_name_max = 50
# max_tags_per_food = 10
# max_total_tags = 100
# max_total_foods = 1000

[images]
# supported_formats = ["jpg", "jpeg", "png", "gif", "webp"]
# max_file_size = 5242880

[log]
# one of "error", "warn", "info", "debug", "trace"
# level = "warn"
"##;

pub fn cmd_init(root: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let dir = data_dir::init_data_dir(root, LARDER_TOML_TEMPLATE)?;
    println!("Initialized {}", dir.display());
    Ok(())
}
