//! Library registry and the store of known collections.
//!
//! - [`MaterialLibraryRegistry`] owns the open collections and all
//!   mutation of their trees.
//! - [`CollectionStore`] remembers which collections exist and which one
//!   was active, in a SQLite database under the per-user config directory:
//!   - **Linux**: `~/.config/mnemosy/libraries.db`
//!   - **Windows**: `%APPDATA%\mnemosy\libraries.db`
//!   - **macOS**: `~/Library/Application Support/mnemosy/libraries.db`

pub mod collection_store;
pub mod material_registry;

pub use collection_store::{CollectionStore, StoredCollection};
pub use material_registry::{DragPayload, MaterialLibraryRegistry};
