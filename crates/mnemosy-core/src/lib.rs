//! Mnemosy Core - Headless material library registry.
//!
//! This crate owns the hierarchical material library behind the Mnemosy
//! editor: folder trees of PBR materials, unlit textures and skyboxes,
//! their on-disk packages, the list of known libraries, keyword search and
//! preview thumbnails. The GUI and renderer only read registry state and
//! call registry methods.
//!
//! # Example
//!
//! ```rust,no_run
//! use mnemosy_core::{LibEntryType, MaterialLibraryRegistry};
//! use std::path::Path;
//!
//! fn main() -> mnemosy_core::Result<()> {
//!     let mut registry = MaterialLibraryRegistry::in_memory()?;
//!     registry.create_new_entry("Studio", Path::new("/tmp/studio-library"))?;
//!
//!     let root = registry.active_collection().map(|c| c.tree().root_id());
//!     if let Some(root) = root {
//!         let bricks = registry.create_subfolder(root, "Bricks")?;
//!         registry.create_entry(bricks, "Red Brick", LibEntryType::PbrMaterial)?;
//!     }
//!
//!     let found = registry.search_lib_entries_for_keyword("brick");
//!     println!("Search found anything: {}", found);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod library;
pub mod metadata;
pub mod platform;
pub mod registry;
pub mod thumbnails;

// Re-export commonly used types
pub use error::{MnemosyError, Result};
pub use library::{
    DeleteConfirmation, EntryId, FolderId, FolderNode, FolderTree, LibCollection, LibEntry,
    LibEntryType, LibraryHealth, MaterialParameters, PackageMetadata, RemovedItems,
    TextureChannel,
};
pub use registry::{CollectionStore, DragPayload, MaterialLibraryRegistry, StoredCollection};
pub use thumbnails::{PlaceholderRenderer, Thumbnail, ThumbnailManager, ThumbnailRenderer, ThumbnailState};
