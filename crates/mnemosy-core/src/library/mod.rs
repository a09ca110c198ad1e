//! Library data model: folder tree, entries, packages and collections.

pub mod collection;
pub mod confirm;
pub mod naming;
pub mod package;
pub mod persistence;
pub mod search;
pub mod tree;
pub mod types;

pub use collection::{LibCollection, LibraryHealth};
pub use confirm::DeleteConfirmation;
pub use naming::{names_equal, sanitize_name, unique_name};
pub use package::{ChannelSlot, MaterialParameters, PackageMetadata};
pub use persistence::{load_library_data, save_library_data, LibraryData};
pub use search::{search_entries, SearchState};
pub use tree::{FolderNode, FolderTree, LibEntry, NodeRef, RemovedItems};
pub use types::{EntryId, FolderId, LibEntryType, TextureChannel};
