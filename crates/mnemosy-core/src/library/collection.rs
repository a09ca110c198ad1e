//! One material library: a folder tree bound to a directory on disk.
//!
//! Every mutation runs in the same order: validate, change the filesystem,
//! change the in-memory tree, re-save the library data file. A failing
//! filesystem step therefore leaves the tree exactly as it was.

use crate::config::LibraryConfig;
use crate::error::{MnemosyError, Result};
use crate::library::naming::{names_equal, sanitize_name, unique_name};
use crate::library::package::{self, MaterialParameters, PackageMetadata};
use crate::library::persistence::{data_file_path, load_library_data, save_library_data};
use crate::library::tree::{FolderTree, NodeRef, RemovedItems};
use crate::library::types::{EntryId, FolderId, LibEntryType, TextureChannel};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

/// Result of comparing a collection's tree with its directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LibraryHealth {
    /// Folders whose directory is gone.
    pub missing_folders: Vec<FolderId>,
    /// Entries whose package directory is gone.
    pub missing_packages: Vec<EntryId>,
    /// Directories no folder or entry accounts for.
    pub orphan_dirs: Vec<PathBuf>,
}

impl LibraryHealth {
    pub fn is_healthy(&self) -> bool {
        self.missing_folders.is_empty() && self.missing_packages.is_empty() && self.orphan_dirs.is_empty()
    }
}

/// A library collection: display name, root directory and folder tree.
#[derive(Debug)]
pub struct LibCollection {
    id: String,
    name: String,
    root_path: PathBuf,
    tree: FolderTree,
}

impl LibCollection {
    /// Start a brand-new, empty library at `root_path`.
    ///
    /// The directory is created if missing; an existing directory must be
    /// empty.
    pub fn create_new(name: &str, root_path: impl Into<PathBuf>) -> Result<Self> {
        let root_path = root_path.into();
        if root_path.exists() {
            if !root_path.is_dir() {
                return Err(MnemosyError::InvalidPath {
                    path: root_path,
                    reason: "not a directory".to_string(),
                });
            }
            let mut contents = fs::read_dir(&root_path)
                .map_err(|e| MnemosyError::io_with_path(e, &root_path))?;
            if contents.next().is_some() {
                return Err(MnemosyError::InvalidPath {
                    path: root_path,
                    reason: "directory is not empty".to_string(),
                });
            }
        } else {
            fs::create_dir_all(&root_path).map_err(|e| {
                MnemosyError::io_context(
                    format!("Failed to create library directory {}", root_path.display()),
                    &root_path,
                    e,
                )
            })?;
        }

        let tree = FolderTree::new(LibraryConfig::ROOT_FOLDER_NAME);
        save_library_data(&root_path, &tree)?;
        info!("Created library '{}' at {}", name, root_path.display());

        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            root_path,
            tree,
        })
    }

    /// Attach an existing library by reading its data file.
    pub fn open_existing(name: &str, root_path: impl Into<PathBuf>) -> Result<Self> {
        let root_path = root_path.into();
        if !root_path.is_dir() {
            return Err(MnemosyError::InvalidPath {
                path: root_path,
                reason: "not an existing directory".to_string(),
            });
        }

        let tree = load_library_data(&root_path)?;
        info!(
            "Opened library '{}' at {} ({} folders, {} entries)",
            name,
            root_path.display(),
            tree.folder_count(),
            tree.entry_count()
        );

        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            root_path,
            tree,
        })
    }

    pub(crate) fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    /// Stable identifier shared with the collection store.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn data_file(&self) -> PathBuf {
        data_file_path(&self.root_path)
    }

    pub fn tree(&self) -> &FolderTree {
        &self.tree
    }

    pub(crate) fn tree_mut(&mut self) -> &mut FolderTree {
        &mut self.tree
    }

    /// Absolute directory of a folder.
    pub fn folder_path(&self, id: FolderId) -> Result<PathBuf> {
        Ok(self.root_path.join(self.tree.relative_folder_path(id)?))
    }

    /// Absolute package directory of an entry.
    pub fn package_path(&self, id: EntryId) -> Result<PathBuf> {
        Ok(self.root_path.join(self.tree.relative_entry_path(id)?))
    }

    /// Write the library data file.
    pub fn save(&self) -> Result<()> {
        save_library_data(&self.root_path, &self.tree)
    }

    /// Save after a mutation that already happened; a failure here cannot
    /// undo the mutation, so it is logged and retried on the next save.
    fn persist(&self) {
        if let Err(e) = self.save() {
            error!("Failed to save library data for '{}': {}", self.name, e);
        }
    }

    // ========================================
    // Folders
    // ========================================

    /// Create a sub-folder, suffixing the name if a sibling already uses it.
    pub fn create_subfolder(&mut self, parent: FolderId, proposed: &str) -> Result<FolderId> {
        self.tree.node(parent)?;
        let name = sanitize_name(proposed, LibraryConfig::DEFAULT_FOLDER_NAME);
        let name = self.tree.unique_child_name(parent, &name, None);
        let path = self.folder_path(parent)?.join(&name);

        fs::create_dir(&path).map_err(|e| {
            MnemosyError::io_context(format!("Failed to create folder {}", path.display()), &path, e)
        })?;

        let id = self.tree.insert_folder(parent, &name)?;
        debug!("Created folder {} '{}'", id, name);
        self.persist();
        Ok(id)
    }

    /// Move a folder under `destination`.
    ///
    /// Rejects moves of the root, moves into the folder's own subtree and
    /// moves onto a sibling with the same name.
    pub fn move_folder(&mut self, source: FolderId, destination: FolderId) -> Result<()> {
        self.tree.check_move_folder(source, destination)?;
        let name = self.tree.node(source)?.name().to_string();
        let from = self.folder_path(source)?;
        let to = self.folder_path(destination)?.join(&name);

        rename_dir(&from, &to, false)?;

        if let Err(e) = self.tree.move_folder(source, destination) {
            rollback_rename(&to, &from);
            return Err(e);
        }
        debug!("Moved folder {} to {}", source, destination);
        self.persist();
        Ok(())
    }

    /// Rename a folder; returns the final (possibly suffixed) name.
    pub fn rename_folder(&mut self, id: FolderId, new_name: &str) -> Result<String> {
        let node = self.tree.node(id)?;
        let parent = node
            .parent()
            .ok_or_else(|| MnemosyError::invalid_operation("the root folder cannot be renamed"))?;
        let old_name = node.name().to_string();

        let name = sanitize_name(new_name, "");
        if name.is_empty() {
            return Err(MnemosyError::invalid_operation("folder name is empty"));
        }
        if name == old_name {
            return Ok(name);
        }
        let name = self
            .tree
            .unique_child_name(parent, &name, Some(NodeRef::Folder(id)));

        let from = self.folder_path(id)?;
        let to = self.folder_path(parent)?.join(&name);
        rename_dir(&from, &to, names_equal(&old_name, &name))?;

        self.tree.rename_folder(id, &name)?;
        debug!("Renamed folder {} '{}' -> '{}'", id, old_name, name);
        self.persist();
        Ok(name)
    }

    /// Delete a folder but hand its sub-folders and entries to its parent.
    ///
    /// Children whose names clash with the parent's existing children are
    /// suffixed. Every directory move is rolled back if a later one fails.
    pub fn delete_folder_keep_children(&mut self, id: FolderId) -> Result<()> {
        let node = self.tree.node(id)?;
        let parent = node
            .parent()
            .ok_or_else(|| MnemosyError::invalid_operation("the root folder cannot be deleted"))?;
        let node_path = self.folder_path(id)?;
        let parent_path = self.folder_path(parent)?;

        let mut children: Vec<(NodeRef, String)> = Vec::new();
        for child in node.sub_nodes() {
            children.push((NodeRef::Folder(*child), self.tree.node(*child)?.name().to_string()));
        }
        for entry in node.sub_entries() {
            children.push((NodeRef::Entry(*entry), self.tree.entry(*entry)?.name().to_string()));
        }

        // The dissolved folder's own directory still exists while children
        // move out, so its name stays reserved.
        let mut planned: Vec<(NodeRef, String, String)> = Vec::with_capacity(children.len());
        for (item, old_name) in children {
            let new_name = unique_name(&old_name, |candidate| {
                self.tree.child_name_taken(parent, candidate, None)
                    || planned.iter().any(|(_, _, taken)| names_equal(taken, candidate))
            });
            planned.push((item, old_name, new_name));
        }

        let mut moved: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(planned.len());
        for (_, old_name, new_name) in &planned {
            let from = node_path.join(old_name);
            let to = parent_path.join(new_name);
            if let Err(e) = rename_dir(&from, &to, false) {
                for (done_from, done_to) in moved.iter().rev() {
                    rollback_rename(done_to, done_from);
                }
                return Err(e);
            }
            moved.push((from, to));
        }

        if let Err(e) = fs::remove_dir(&node_path) {
            warn!(
                "Folder directory {} left behind after dissolving: {}",
                node_path.display(),
                e
            );
        }

        for (item, old_name, new_name) in &planned {
            if old_name == new_name {
                continue;
            }
            match item {
                NodeRef::Folder(folder) => self.tree.rename_folder(*folder, new_name)?,
                NodeRef::Entry(entry) => {
                    self.tree.rename_entry(*entry, new_name)?;
                    let entry_type = self.tree.entry(*entry)?.entry_type();
                    if let Err(e) = package::set_package_name(&parent_path.join(new_name), new_name, entry_type) {
                        warn!("Failed to update package name for {}: {}", entry, e);
                    }
                }
            }
        }
        self.tree.dissolve_folder(id)?;
        debug!("Dissolved folder {} into {}", id, parent);
        self.persist();
        Ok(())
    }

    /// Delete a folder, everything below it and every package on disk.
    ///
    /// Packages are removed children-first. If removal fails part-way, the
    /// parts already gone from disk are pruned from the tree too before the
    /// error is returned, so tree and disk never disagree.
    pub fn delete_hierarchy(&mut self, id: FolderId) -> Result<RemovedItems> {
        if self.tree.node(id)?.is_root() {
            return Err(MnemosyError::invalid_operation("the root folder cannot be deleted"));
        }

        let mut removed = RemovedItems::default();
        let mut failure = None;

        'folders: for folder in self.tree.postorder_folders(id) {
            let entries = self.tree.node(folder)?.sub_entries().to_vec();
            for entry in entries {
                let path = self.package_path(entry)?;
                if let Err(e) = remove_dir_all_if_present(&path) {
                    failure = Some(e);
                    break 'folders;
                }
                removed.entries.push(entry);
            }
            let path = self.folder_path(folder)?;
            if let Err(e) = remove_dir_all_if_present(&path) {
                failure = Some(e);
                break 'folders;
            }
            removed.folders.push(folder);
        }

        if let Some(e) = failure {
            for entry in &removed.entries {
                self.tree.remove_entry(*entry)?;
            }
            for folder in &removed.folders {
                self.tree.remove_leaf_folder(*folder)?;
            }
            warn!(
                "Hierarchy deletion of {} stopped after {} folders and {} entries",
                id,
                removed.folders.len(),
                removed.entries.len()
            );
            self.persist();
            return Err(e);
        }

        let removed = self.tree.remove_subtree(id)?;
        debug!(
            "Deleted hierarchy {} ({} folders, {} entries)",
            id,
            removed.folders.len(),
            removed.entries.len()
        );
        self.persist();
        Ok(removed)
    }

    // ========================================
    // Entries
    // ========================================

    /// Create an entry and scaffold its package.
    pub fn create_entry(&mut self, folder: FolderId, proposed: &str, entry_type: LibEntryType) -> Result<EntryId> {
        self.tree.node(folder)?;
        let name = sanitize_name(proposed, entry_type.default_name());
        let name = self.tree.unique_child_name(folder, &name, None);
        let path = self.folder_path(folder)?.join(&name);

        package::scaffold_package(&path, &name, entry_type)?;

        let id = self.tree.insert_entry(folder, &name, entry_type)?;
        debug!("Created {} {} '{}'", entry_type, id, name);
        self.persist();
        Ok(id)
    }

    /// Move an entry to `destination`; returns its (possibly suffixed) name.
    pub fn move_entry(&mut self, entry: EntryId, destination: FolderId) -> Result<String> {
        let record = self.tree.entry(entry)?;
        self.tree.node(destination)?;
        let old_name = record.name().to_string();
        let entry_type = record.entry_type();
        if record.folder() == destination {
            return Ok(old_name);
        }

        let name = self.tree.unique_child_name(destination, &old_name, None);
        let from = self.package_path(entry)?;
        let to = self.folder_path(destination)?.join(&name);

        rename_dir(&from, &to, false)?;
        if name != old_name {
            if let Err(e) = package::set_package_name(&to, &name, entry_type) {
                warn!("Failed to update package name for {}: {}", entry, e);
            }
        }

        self.tree.move_entry(entry, destination, &name)?;
        debug!("Moved {} to {} as '{}'", entry, destination, name);
        self.persist();
        Ok(name)
    }

    /// Delete an entry and its package.
    pub fn delete_entry(&mut self, entry: EntryId) -> Result<()> {
        let path = self.package_path(entry)?;
        remove_dir_all_if_present(&path)?;
        self.tree.remove_entry(entry)?;
        debug!("Deleted {}", entry);
        self.persist();
        Ok(())
    }

    /// Rename an entry; returns the final (possibly suffixed) name.
    pub fn rename_entry(&mut self, entry: EntryId, new_name: &str) -> Result<String> {
        let record = self.tree.entry(entry)?;
        let folder = record.folder();
        let entry_type = record.entry_type();
        let old_name = record.name().to_string();

        let name = sanitize_name(new_name, "");
        if name.is_empty() {
            return Err(MnemosyError::invalid_operation("entry name is empty"));
        }
        if name == old_name {
            return Ok(name);
        }
        let name = self
            .tree
            .unique_child_name(folder, &name, Some(NodeRef::Entry(entry)));

        let from = self.package_path(entry)?;
        let to = self.folder_path(folder)?.join(&name);
        rename_dir(&from, &to, names_equal(&old_name, &name))?;
        if let Err(e) = package::set_package_name(&to, &name, entry_type) {
            warn!("Failed to update package name for {}: {}", entry, e);
        }

        self.tree.rename_entry(entry, &name)?;
        debug!("Renamed {} '{}' -> '{}'", entry, old_name, name);
        self.persist();
        Ok(name)
    }

    // ========================================
    // Packages
    // ========================================

    pub fn read_package(&self, entry: EntryId) -> Result<PackageMetadata> {
        package::read_package(&self.package_path(entry)?)
    }

    pub fn write_material(&self, entry: EntryId, params: MaterialParameters) -> Result<PackageMetadata> {
        package::write_material(&self.package_path(entry)?, params)
    }

    pub fn assign_channel(&self, entry: EntryId, channel: TextureChannel, source: &Path) -> Result<String> {
        package::assign_channel(&self.package_path(entry)?, channel, source)
    }

    /// Copy an entry's package into `destination_dir`.
    pub fn export_entry(&self, entry: EntryId, destination_dir: &Path) -> Result<PathBuf> {
        let name = self.tree.entry(entry)?.name().to_string();
        let source = self.package_path(entry)?;
        let target = destination_dir.join(&name);
        package::copy_package(&source, &target)?;
        info!("Exported '{}' to {}", name, target.display());
        Ok(target)
    }

    /// Copy an external package into `folder` as a new entry.
    pub fn import_entry(&mut self, folder: FolderId, source_dir: &Path) -> Result<EntryId> {
        self.tree.node(folder)?;
        let metadata = package::read_package(source_dir)?;
        let fallback = source_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| metadata.entry_type.default_name().to_string());
        let name = sanitize_name(&metadata.name, &fallback);
        let name = self.tree.unique_child_name(folder, &name, None);
        let target = self.folder_path(folder)?.join(&name);

        package::copy_package(source_dir, &target)?;
        if name != metadata.name {
            if let Err(e) = package::set_package_name(&target, &name, metadata.entry_type) {
                warn!("Failed to update imported package name: {}", e);
            }
        }

        let id = self.tree.insert_entry(folder, &name, metadata.entry_type)?;
        info!("Imported '{}' from {}", name, source_dir.display());
        self.persist();
        Ok(id)
    }

    // ========================================
    // Verification
    // ========================================

    /// Compare the tree with the directory layout on disk.
    pub fn verify(&self) -> Result<LibraryHealth> {
        let mut health = LibraryHealth::default();
        let mut folder_dirs: HashSet<PathBuf> = HashSet::new();
        let mut package_dirs: HashMap<PathBuf, EntryId> = HashMap::new();

        for folder in self.tree.preorder_folders(self.tree.root_id()) {
            let path = self.folder_path(folder)?;
            if !path.is_dir() {
                health.missing_folders.push(folder);
            }
            folder_dirs.insert(path);
            for entry in self.tree.node(folder)?.sub_entries() {
                let path = self.package_path(*entry)?;
                if !path.is_dir() {
                    health.missing_packages.push(*entry);
                }
                package_dirs.insert(path, *entry);
            }
        }

        let mut walker = WalkDir::new(&self.root_path).min_depth(1).into_iter();
        while let Some(item) = walker.next() {
            let item = match item {
                Ok(item) => item,
                Err(e) => {
                    warn!("Skipping unreadable path during verification: {}", e);
                    continue;
                }
            };
            if !item.file_type().is_dir() {
                continue;
            }
            let path = item.path().to_path_buf();
            if package_dirs.contains_key(&path) {
                walker.skip_current_dir();
            } else if !folder_dirs.contains(&path) {
                health.orphan_dirs.push(path);
                walker.skip_current_dir();
            }
        }

        Ok(health)
    }
}

/// Rename a directory, refusing to land on anything already present unless
/// the rename only changes letter case.
fn rename_dir(from: &Path, to: &Path, case_only: bool) -> Result<()> {
    if !case_only && to.exists() {
        return Err(MnemosyError::io_context(
            format!("Target {} already exists on disk", to.display()),
            to,
            io::Error::new(io::ErrorKind::AlreadyExists, "target exists"),
        ));
    }
    fs::rename(from, to).map_err(|e| {
        MnemosyError::io_context(
            format!("Failed to move {} to {}", from.display(), to.display()),
            from,
            e,
        )
    })
}

fn rollback_rename(moved_to: &Path, original: &Path) {
    if let Err(e) = fs::rename(moved_to, original) {
        error!(
            "Failed to roll back {} to {}: {}",
            moved_to.display(),
            original.display(),
            e
        );
    }
}

fn remove_dir_all_if_present(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!("Directory {} was already missing", path.display());
            Ok(())
        }
        Err(e) => Err(MnemosyError::io_context(
            format!("Failed to remove {}", path.display()),
            path,
            e,
        )),
    }
}
