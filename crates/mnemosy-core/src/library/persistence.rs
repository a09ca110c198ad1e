//! Library data file: the persisted shape of a folder tree.
//!
//! The file records folder nesting, display order, entry names and entry
//! types. Directory scanning alone cannot recover ordering or tell a
//! texture package from a skybox, so the tree is always rebuilt from here.
//! Runtime IDs are not persisted; a loaded tree gets fresh ones.

use crate::config::LibraryConfig;
use crate::error::{MnemosyError, Result};
use crate::library::naming::{names_equal, sanitize_name};
use crate::library::tree::FolderTree;
use crate::library::types::{FolderId, LibEntryType};
use crate::metadata::{atomic_read_json, atomic_write_json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root of the library data file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryData {
    pub format_version: u32,
    #[serde(default)]
    pub saved_at: Option<String>,
    pub root: FolderData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderData {
    pub name: String,
    #[serde(default)]
    pub folders: Vec<FolderData>,
    #[serde(default)]
    pub entries: Vec<EntryData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryData {
    pub name: String,
    #[serde(rename = "type")]
    pub entry_type: LibEntryType,
}

/// Location of the data file for a library rooted at `library_root`.
pub fn data_file_path(library_root: &Path) -> PathBuf {
    library_root.join(LibraryConfig::LIBRARY_DATA_FILENAME)
}

/// Snapshot the shape of `tree`.
pub fn tree_to_data(tree: &FolderTree) -> LibraryData {
    fn folder(tree: &FolderTree, id: FolderId) -> FolderData {
        match tree.find_node_by_id(id) {
            Some(node) => FolderData {
                name: node.name().to_string(),
                folders: node.sub_nodes().iter().map(|c| folder(tree, *c)).collect(),
                entries: node
                    .sub_entries()
                    .iter()
                    .filter_map(|e| tree.find_entry_by_id(*e))
                    .map(|e| EntryData {
                        name: e.name().to_string(),
                        entry_type: e.entry_type(),
                    })
                    .collect(),
            },
            None => FolderData {
                name: String::new(),
                folders: Vec::new(),
                entries: Vec::new(),
            },
        }
    }

    LibraryData {
        format_version: LibraryConfig::DATA_FORMAT_VERSION,
        saved_at: Some(Utc::now().to_rfc3339()),
        root: folder(tree, tree.root_id()),
    }
}

/// Rebuild a tree from persisted data, validating names on the way.
pub fn tree_from_data(data: &LibraryData, source: &Path) -> Result<FolderTree> {
    let corrupt = |message: String| MnemosyError::CorruptLibraryData {
        path: source.to_path_buf(),
        message,
    };

    if data.format_version > LibraryConfig::DATA_FORMAT_VERSION {
        return Err(corrupt(format!(
            "format version {} is newer than supported version {}",
            data.format_version,
            LibraryConfig::DATA_FORMAT_VERSION
        )));
    }

    let root_name = if data.root.name.trim().is_empty() {
        LibraryConfig::ROOT_FOLDER_NAME
    } else {
        data.root.name.as_str()
    };
    let mut tree = FolderTree::new(root_name);
    let root = tree.root_id();
    fill_folder(&mut tree, root, &data.root, &corrupt)?;
    Ok(tree)
}

fn fill_folder(
    tree: &mut FolderTree,
    id: FolderId,
    data: &FolderData,
    corrupt: &dyn Fn(String) -> MnemosyError,
) -> Result<()> {
    for child in &data.folders {
        check_name(tree, id, &child.name, corrupt)?;
        let child_id = tree.insert_folder(id, &child.name)?;
        fill_folder(tree, child_id, child, corrupt)?;
    }
    for entry in &data.entries {
        check_name(tree, id, &entry.name, corrupt)?;
        tree.insert_entry(id, &entry.name, entry.entry_type)?;
    }
    Ok(())
}

fn check_name(
    tree: &FolderTree,
    parent: FolderId,
    name: &str,
    corrupt: &dyn Fn(String) -> MnemosyError,
) -> Result<()> {
    if name.is_empty() || sanitize_name(name, "") != name {
        return Err(corrupt(format!("invalid name '{}'", name)));
    }
    let duplicate = tree
        .find_node_by_id(parent)
        .map(|node| {
            node.sub_nodes()
                .iter()
                .filter_map(|c| tree.find_node_by_id(*c))
                .any(|c| names_equal(c.name(), name))
                || node
                    .sub_entries()
                    .iter()
                    .filter_map(|e| tree.find_entry_by_id(*e))
                    .any(|e| names_equal(e.name(), name))
        })
        .unwrap_or(false);
    if duplicate {
        return Err(corrupt(format!("duplicate name '{}'", name)));
    }
    Ok(())
}

/// Load the tree of the library rooted at `library_root`.
///
/// A missing or unparseable data file is reported as `CorruptLibraryData`.
pub fn load_library_data(library_root: &Path) -> Result<FolderTree> {
    let path = data_file_path(library_root);
    let data: LibraryData = match atomic_read_json(&path) {
        Ok(Some(data)) => data,
        Ok(None) => {
            return Err(MnemosyError::CorruptLibraryData {
                path,
                message: "library data file is missing".to_string(),
            })
        }
        Err(MnemosyError::Json { message, .. }) => {
            return Err(MnemosyError::CorruptLibraryData { path, message })
        }
        Err(e) => return Err(e),
    };
    tree_from_data(&data, &path)
}

/// Persist the tree of the library rooted at `library_root`.
pub fn save_library_data(library_root: &Path, tree: &FolderTree) -> Result<()> {
    atomic_write_json(&data_file_path(library_root), &tree_to_data(tree), true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn sample_tree() -> FolderTree {
        let mut tree = FolderTree::new("Root");
        let root = tree.root_id();
        let bricks = tree.insert_folder(root, "Bricks").unwrap();
        tree.insert_folder(root, "Metals").unwrap();
        tree.insert_entry(bricks, "Red Brick", LibEntryType::PbrMaterial).unwrap();
        tree.insert_entry(bricks, "Mortar", LibEntryType::UnlitTexture).unwrap();
        tree.insert_entry(root, "Sunset", LibEntryType::Skybox).unwrap();
        tree
    }

    #[test]
    fn test_save_and_load_preserves_shape_and_order() {
        let temp_dir = TempDir::new().unwrap();
        let tree = sample_tree();

        save_library_data(temp_dir.path(), &tree).unwrap();
        let loaded = load_library_data(temp_dir.path()).unwrap();

        let mut expected = tree_to_data(&tree);
        let mut actual = tree_to_data(&loaded);
        expected.saved_at = None;
        actual.saved_at = None;
        assert_eq!(expected, actual);
        assert!(loaded.check_invariants().is_ok());
    }

    #[test]
    fn test_missing_file_is_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let result = load_library_data(temp_dir.path());
        assert!(matches!(result, Err(MnemosyError::CorruptLibraryData { .. })));
    }

    #[test]
    fn test_unparseable_file_is_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(data_file_path(temp_dir.path()), "][").unwrap();
        let result = load_library_data(temp_dir.path());
        assert!(matches!(result, Err(MnemosyError::CorruptLibraryData { .. })));
    }

    #[test]
    fn test_duplicate_sibling_names_are_corrupt() {
        let data = LibraryData {
            format_version: 1,
            saved_at: None,
            root: FolderData {
                name: "Root".into(),
                folders: vec![FolderData {
                    name: "Stone".into(),
                    folders: vec![],
                    entries: vec![],
                }],
                entries: vec![EntryData {
                    name: "stone".into(),
                    entry_type: LibEntryType::PbrMaterial,
                }],
            },
        };
        let result = tree_from_data(&data, Path::new("x"));
        assert!(matches!(result, Err(MnemosyError::CorruptLibraryData { .. })));
    }

    #[test]
    fn test_path_separator_in_name_is_corrupt() {
        let data = LibraryData {
            format_version: 1,
            saved_at: None,
            root: FolderData {
                name: "Root".into(),
                folders: vec![FolderData {
                    name: "../escape".into(),
                    folders: vec![],
                    entries: vec![],
                }],
                entries: vec![],
            },
        };
        assert!(tree_from_data(&data, Path::new("x")).is_err());
    }

    #[test]
    fn test_newer_format_is_rejected() {
        let mut data = tree_to_data(&sample_tree());
        data.format_version = LibraryConfig::DATA_FORMAT_VERSION + 1;
        assert!(tree_from_data(&data, Path::new("x")).is_err());
    }

    #[test]
    fn test_entry_type_uses_type_key() {
        let json = serde_json::to_value(tree_to_data(&sample_tree())).unwrap();
        assert_eq!(json["root"]["entries"][0]["type"], "skybox");
    }
}
