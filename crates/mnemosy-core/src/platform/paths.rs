//! Platform-specific path utilities.

use crate::config::{AppConfig, StoreConfig};
use crate::error::{MnemosyError, Result};
use std::path::PathBuf;

/// Get the per-user Mnemosy configuration directory.
///
/// # Platform Behavior
/// - **Linux**: `~/.config/mnemosy`
/// - **Windows**: `%APPDATA%\mnemosy`
/// - **macOS**: `~/Library/Application Support/mnemosy`
pub fn config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir().ok_or_else(|| MnemosyError::Config {
        message: "Could not determine config directory".to_string(),
    })?;
    Ok(base.join(AppConfig::CONFIG_DIR_NAME))
}

/// Default location of the known-libraries database.
pub fn default_store_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(StoreConfig::DB_FILENAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_store_path_shape() {
        // Headless CI may lack a config dir; only check shape when it exists.
        if let Ok(path) = default_store_path() {
            assert!(path.ends_with("mnemosy/libraries.db"));
        }
    }
}
