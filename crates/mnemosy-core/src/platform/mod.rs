//! Platform-specific paths.

mod paths;

pub use paths::{config_dir, default_store_path};
