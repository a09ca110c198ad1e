//! Centralized configuration for the Mnemosy library core.
//!
//! This module provides configuration constants for on-disk library layout,
//! thumbnail caching and the known-libraries store.

/// Application-level configuration.
pub struct AppConfig;

impl AppConfig {
    pub const APP_NAME: &'static str = "Mnemosy";
    /// Directory created under the platform config dir.
    pub const CONFIG_DIR_NAME: &'static str = "mnemosy";
}

/// On-disk library layout and naming defaults.
pub struct LibraryConfig;

impl LibraryConfig {
    /// Library-level metadata file at the root of every collection.
    pub const LIBRARY_DATA_FILENAME: &'static str = "MnemosyMaterialLibraryData.mnsydata";
    /// Per-entry metadata file inside every package directory.
    pub const ENTRY_METADATA_FILENAME: &'static str = "entry.mnsydata";
    /// Bumped whenever the library data file layout changes.
    pub const DATA_FORMAT_VERSION: u32 = 1;

    pub const ROOT_FOLDER_NAME: &'static str = "Root";
    pub const DEFAULT_FOLDER_NAME: &'static str = "New Folder";
    pub const DEFAULT_MATERIAL_NAME: &'static str = "New Material";
    pub const DEFAULT_TEXTURE_NAME: &'static str = "New Texture";
    pub const DEFAULT_SKYBOX_NAME: &'static str = "New Skybox";
    pub const DEFAULT_LIBRARY_NAME: &'static str = "New Library";

    /// Longest display name accepted before truncation.
    pub const MAX_NAME_LENGTH: usize = 96;
}

/// Thumbnail cache configuration.
pub struct ThumbnailConfig;

impl ThumbnailConfig {
    pub const THUMBNAIL_FILENAME: &'static str = "thumbnail.png";
    /// Edge length of rendered thumbnails in pixels.
    pub const THUMBNAIL_SIZE: u32 = 128;
    /// Maximum number of decoded thumbnails held at once.
    pub const DEFAULT_CAPACITY: usize = 256;
    /// Thumbnails loaded or rendered per frame.
    pub const DEFAULT_FRAME_BUDGET: usize = 4;
}

/// Known-libraries store configuration.
pub struct StoreConfig;

impl StoreConfig {
    pub const DB_FILENAME: &'static str = "libraries.db";
    pub const BUSY_TIMEOUT_MS: u32 = 5000;
    /// Settings key holding the id of the last active library.
    pub const ACTIVE_LIBRARY_KEY: &'static str = "active_library";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_filenames_differ() {
        assert_ne!(
            LibraryConfig::LIBRARY_DATA_FILENAME,
            LibraryConfig::ENTRY_METADATA_FILENAME
        );
        assert!(LibraryConfig::LIBRARY_DATA_FILENAME.ends_with(".mnsydata"));
    }

    #[test]
    fn test_thumbnail_budget_is_reasonable() {
        assert!(ThumbnailConfig::DEFAULT_FRAME_BUDGET > 0);
        assert!(ThumbnailConfig::DEFAULT_CAPACITY >= ThumbnailConfig::DEFAULT_FRAME_BUDGET);
    }
}
