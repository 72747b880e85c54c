pub mod backup;
pub mod catalog_io;
pub mod config_io;
pub mod data_dir;
pub mod image_store;
pub mod recovery;
pub mod save_queue;
