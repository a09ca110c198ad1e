//! The material library registry.
//!
//! Owns every open library collection and the transient state the GUI reads
//! each frame: the active collection, the open folder, the active entry,
//! search mode and the pending hierarchy deletion. All mutation goes
//! through here so thumbnails and search results follow the tree.
//!
//! Every public operation reports failure as a `Result` and logs it once:
//! rejections as warnings, environment failures as errors.

use crate::config::{LibraryConfig, ThumbnailConfig};
use crate::error::{MnemosyError, Result};
use crate::library::{
    DeleteConfirmation, EntryId, FolderId, LibCollection, LibEntryType, LibraryHealth,
    MaterialParameters, PackageMetadata, RemovedItems, SearchState, TextureChannel,
};
use crate::library::naming::unique_name;
use crate::registry::collection_store::CollectionStore;
use crate::thumbnails::ThumbnailManager;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// What a drag carries between the frame it starts and the frame it drops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragPayload {
    Folder(FolderId),
    Entries(Vec<EntryId>),
}

pub struct MaterialLibraryRegistry {
    store: CollectionStore,
    thumbnails: ThumbnailManager,
    collections: Vec<LibCollection>,
    active: Option<usize>,
    open_folder: Option<FolderId>,
    pending_open: Option<FolderId>,
    active_entry: Option<EntryId>,
    search: SearchState,
    confirmation: DeleteConfirmation,
    frame_budget: usize,
}

fn logged<T>(operation: &str, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        if e.is_rejection() {
            warn!("{} rejected: {}", operation, e);
        } else {
            error!("{} failed: {}", operation, e);
        }
    }
    result
}

fn no_active() -> MnemosyError {
    MnemosyError::invalid_operation("no active library collection")
}

fn active_in(collections: &mut [LibCollection], active: Option<usize>) -> Result<&mut LibCollection> {
    match active {
        Some(index) => collections.get_mut(index).ok_or_else(no_active),
        None => Err(no_active()),
    }
}

fn collection_display_name(proposed: &str) -> String {
    let trimmed = proposed.split_whitespace().collect::<Vec<_>>().join(" ");
    if trimmed.is_empty() {
        LibraryConfig::DEFAULT_LIBRARY_NAME.to_string()
    } else {
        trimmed
    }
}

fn same_path(a: &Path, b: &Path) -> bool {
    let canonical = |p: &Path| p.canonicalize().unwrap_or_else(|_| p.to_path_buf());
    canonical(a) == canonical(b)
}

fn render_thumbnail(thumbnails: &mut ThumbnailManager, collection: &LibCollection, entry: EntryId) {
    let result = collection
        .tree()
        .entry(entry)
        .map(|record| record.entry_type())
        .and_then(|entry_type| Ok((collection.package_path(entry)?, entry_type)))
        .and_then(|(dir, entry_type)| thumbnails.render(entry, &dir, entry_type));
    if let Err(e) = result {
        warn!("Thumbnail for {} not rendered: {}", entry, e);
    }
}

impl MaterialLibraryRegistry {
    pub fn new(store: CollectionStore, thumbnails: ThumbnailManager) -> Self {
        Self {
            store,
            thumbnails,
            collections: Vec::new(),
            active: None,
            open_folder: None,
            pending_open: None,
            active_entry: None,
            search: SearchState::default(),
            confirmation: DeleteConfirmation::default(),
            frame_budget: ThumbnailConfig::DEFAULT_FRAME_BUDGET,
        }
    }

    /// Registry over a throwaway in-memory store.
    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(
            CollectionStore::open_in_memory()?,
            ThumbnailManager::default(),
        ))
    }

    pub fn store(&self) -> &CollectionStore {
        &self.store
    }

    pub fn thumbnails(&self) -> &ThumbnailManager {
        &self.thumbnails
    }

    pub fn thumbnails_mut(&mut self) -> &mut ThumbnailManager {
        &mut self.thumbnails
    }

    pub fn set_frame_budget(&mut self, budget: usize) {
        self.frame_budget = budget;
    }

    // ========================================
    // Collections
    // ========================================

    /// Reopen every remembered collection and restore the active one.
    ///
    /// Collections whose data cannot be read are skipped with a warning and
    /// stay remembered. Returns how many were opened.
    pub fn load(&mut self) -> Result<usize> {
        let stored = logged("load", self.store.list())?;
        let remembered = self.store.active_collection().unwrap_or_else(|e| {
            warn!("Could not read the last active library: {}", e);
            None
        });

        self.collections.clear();
        self.active = None;
        self.reset_frame_state();

        for entry in stored {
            match LibCollection::open_existing(&entry.name, &entry.path) {
                Ok(collection) => self.collections.push(collection.with_id(entry.id)),
                Err(e) => warn!(
                    "Skipping library '{}' at {}: {}",
                    entry.name,
                    entry.path.display(),
                    e
                ),
            }
        }

        let index = remembered
            .and_then(|id| self.collections.iter().position(|c| c.id() == id))
            .or(if self.collections.is_empty() { None } else { Some(0) });
        if let Some(index) = index {
            self.activate(index);
        }

        info!("Loaded {} library collections", self.collections.len());
        Ok(self.collections.len())
    }

    pub fn collections(&self) -> &[LibCollection] {
        &self.collections
    }

    pub fn collection_count(&self) -> usize {
        self.collections.len()
    }

    pub fn collection(&self, index: usize) -> Result<&LibCollection> {
        self.collections
            .get(index)
            .ok_or_else(|| MnemosyError::not_found(format!("library #{}", index)))
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active_collection(&self) -> Option<&LibCollection> {
        self.active.and_then(|i| self.collections.get(i))
    }

    fn active_root(&self) -> Option<FolderId> {
        self.active_collection().map(|c| c.tree().root_id())
    }

    /// First free variant of `proposed` across the collection list.
    pub fn unique_collection_name(&self, proposed: &str, exclude: Option<usize>) -> String {
        unique_name(proposed, |candidate| {
            self.collections
                .iter()
                .enumerate()
                .any(|(i, c)| Some(i) != exclude && c.name() == candidate)
        })
    }

    /// Start a new empty library at `path` and add it to the list.
    pub fn create_new_entry(&mut self, name: &str, path: &Path) -> Result<usize> {
        let name = self.unique_collection_name(&collection_display_name(name), None);
        let collection = logged("create_new_entry", LibCollection::create_new(&name, path))?;
        self.add_collection(collection, "create_new_entry")
    }

    /// Add an existing on-disk library to the list.
    pub fn create_new_entry_from_existing(&mut self, name: &str, path: &Path) -> Result<usize> {
        if self.collections.iter().any(|c| same_path(c.root_path(), path)) {
            return logged(
                "create_new_entry_from_existing",
                Err(MnemosyError::InvalidPath {
                    path: path.to_path_buf(),
                    reason: "library is already in the list".to_string(),
                }),
            );
        }
        let name = self.unique_collection_name(&collection_display_name(name), None);
        let collection = logged(
            "create_new_entry_from_existing",
            LibCollection::open_existing(&name, path),
        )?;
        self.add_collection(collection, "create_new_entry_from_existing")
    }

    fn add_collection(&mut self, collection: LibCollection, operation: &str) -> Result<usize> {
        let stored = logged(
            operation,
            self.store
                .register(collection.id(), collection.root_path(), collection.name()),
        )?;
        self.collections.push(collection.with_id(stored.id));
        let index = self.collections.len() - 1;
        if self.active.is_none() {
            self.activate(index);
        }
        Ok(index)
    }

    /// Make the collection at `index` the active one.
    pub fn switch_active_collection(&mut self, index: usize) -> Result<()> {
        logged("switch_active_collection", self.collection(index).map(|_| ()))?;
        self.activate(index);
        Ok(())
    }

    fn activate(&mut self, index: usize) {
        self.active = Some(index);
        self.reset_frame_state();
        if let Some(collection) = self.collections.get(index) {
            self.open_folder = Some(collection.tree().root_id());
            let id = collection.id().to_string();
            debug!("Activated library '{}'", collection.name());
            if let Err(e) = self.store.touch(&id) {
                warn!("Could not touch library {}: {}", id, e);
            }
            if let Err(e) = self.store.set_active_collection(Some(&id)) {
                warn!("Could not remember the active library: {}", e);
            }
        }
    }

    fn reset_frame_state(&mut self) {
        self.open_folder = None;
        self.pending_open = None;
        self.active_entry = None;
        self.search.clear();
        self.confirmation.cancel();
        self.thumbnails.invalidate_all();
    }

    /// Forget the collection at `index`. Its files stay on disk.
    pub fn remove_entry_from_list(&mut self, index: usize) -> Result<LibCollection> {
        let id = logged("remove_entry_from_list", self.collection(index))?
            .id()
            .to_string();
        logged("remove_entry_from_list", self.store.unregister(&id))?;
        let removed = self.collections.remove(index);

        match self.active {
            Some(active) if active == index => {
                self.active = None;
                self.reset_frame_state();
                if self.collections.is_empty() {
                    if let Err(e) = self.store.set_active_collection(None) {
                        warn!("Could not clear the active library: {}", e);
                    }
                } else {
                    self.activate(0);
                }
            }
            Some(active) if active > index => self.active = Some(active - 1),
            _ => {}
        }

        info!("Removed library '{}' from the list", removed.name());
        Ok(removed)
    }

    /// Rename the collection at `index`; returns the final name.
    pub fn rename_collection(&mut self, index: usize, name: &str) -> Result<String> {
        let id = logged("rename_collection", self.collection(index))?
            .id()
            .to_string();
        let name = self.unique_collection_name(&collection_display_name(name), Some(index));
        logged("rename_collection", self.store.rename(&id, &name))?;
        if let Some(collection) = self.collections.get_mut(index) {
            collection.set_name(&name);
        }
        Ok(name)
    }

    /// Re-save every collection's data file.
    pub fn save_all(&mut self) -> Result<()> {
        let mut first_error = None;
        for collection in &self.collections {
            if let Err(e) = collection.save() {
                error!("Failed to save library '{}': {}", collection.name(), e);
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
        let active_id = self.active_collection().map(|c| c.id().to_string());
        if let Err(e) = self.store.set_active_collection(active_id.as_deref()) {
            warn!("Could not remember the active library: {}", e);
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    // ========================================
    // Folders
    // ========================================

    pub fn create_subfolder(&mut self, parent: FolderId, name: &str) -> Result<FolderId> {
        let collection = logged("create_subfolder", active_in(&mut self.collections, self.active))?;
        logged("create_subfolder", collection.create_subfolder(parent, name))
    }

    /// Move a folder. A same-named child at the destination is a
    /// `NameCollision`.
    pub fn move_folder(&mut self, source: FolderId, destination: FolderId) -> Result<()> {
        let collection = logged("move_folder", active_in(&mut self.collections, self.active))?;
        let affected = collection.tree().preorder_entries(source);
        logged("move_folder", collection.move_folder(source, destination))?;
        for entry in affected {
            self.thumbnails.invalidate(entry);
        }
        self.refresh_search();
        Ok(())
    }

    pub fn rename_folder(&mut self, id: FolderId, name: &str) -> Result<String> {
        let collection = logged("rename_folder", active_in(&mut self.collections, self.active))?;
        let affected = collection.tree().preorder_entries(id);
        let name = logged("rename_folder", collection.rename_folder(id, name))?;
        for entry in affected {
            self.thumbnails.invalidate(entry);
        }
        self.refresh_search();
        Ok(name)
    }

    /// Delete a folder, handing its children to its parent.
    pub fn delete_folder_keep_children(&mut self, id: FolderId) -> Result<()> {
        let op = "delete_folder_keep_children";
        let collection = logged(op, active_in(&mut self.collections, self.active))?;
        let parent = logged(op, collection.tree().node(id))?.parent();
        let affected = collection.tree().preorder_entries(id);
        logged(op, collection.delete_folder_keep_children(id))?;

        for entry in affected {
            self.thumbnails.invalidate(entry);
        }
        if self.open_folder == Some(id) {
            self.open_folder = parent;
        }
        if self.pending_open == Some(id) {
            self.pending_open = None;
        }
        if self.confirmation.target() == Some(id) {
            self.confirmation.cancel();
        }
        self.refresh_search();
        Ok(())
    }

    // ========================================
    // Hierarchy deletion (arm, then commit)
    // ========================================

    /// Arm deletion of `id` and its whole subtree. Replaces any earlier
    /// pending target.
    pub fn arm_delete_hierarchy(&mut self, id: FolderId) -> Result<()> {
        let op = "arm_delete_hierarchy";
        let collection = logged(op, self.active_collection().ok_or_else(no_active))?;
        if logged(op, collection.tree().node(id))?.is_root() {
            return logged(
                op,
                Err(MnemosyError::invalid_operation("the root folder cannot be deleted")),
            );
        }
        self.confirmation.arm(id);
        debug!("Armed hierarchy deletion of {}", id);
        Ok(())
    }

    pub fn cancel_delete_hierarchy(&mut self) {
        self.confirmation.cancel();
    }

    pub fn pending_delete(&self) -> Option<FolderId> {
        self.confirmation.target()
    }

    /// Commit the armed deletion.
    pub fn confirm_delete_hierarchy(&mut self) -> Result<RemovedItems> {
        match self.confirmation.take() {
            Some(target) => self.delete_armed(target),
            None => logged(
                "confirm_delete_hierarchy",
                Err(MnemosyError::invalid_operation("no hierarchy deletion is armed")),
            ),
        }
    }

    /// Delete `id` and everything below it. Only allowed once `id` is armed.
    pub fn delete_hierarchy(&mut self, id: FolderId) -> Result<RemovedItems> {
        if self.confirmation.target() != Some(id) {
            return logged(
                "delete_hierarchy",
                Err(MnemosyError::invalid_operation(format!(
                    "deleting {} requires confirmation",
                    id
                ))),
            );
        }
        self.confirmation.cancel();
        self.delete_armed(id)
    }

    fn delete_armed(&mut self, target: FolderId) -> Result<RemovedItems> {
        let op = "delete_hierarchy";
        let collection = logged(op, active_in(&mut self.collections, self.active))?;
        let parent = logged(op, collection.tree().node(target))?.parent();
        let entries_before = collection.tree().preorder_entries(target);
        let folders_before = collection.tree().preorder_folders(target);

        let result = collection.delete_hierarchy(target);

        // Even a failed deletion may have removed part of the subtree.
        let tree = collection.tree();
        let gone_entries: Vec<EntryId> = entries_before
            .into_iter()
            .filter(|e| tree.find_entry_by_id(*e).is_none())
            .collect();
        let gone_folders: Vec<FolderId> = folders_before
            .into_iter()
            .filter(|f| tree.find_node_by_id(*f).is_none())
            .collect();
        let fallback = if tree.find_node_by_id(target).is_some() {
            Some(target)
        } else {
            parent
        };

        for entry in &gone_entries {
            self.thumbnails.invalidate(*entry);
            if self.active_entry == Some(*entry) {
                self.active_entry = None;
            }
        }
        if self.open_folder.is_some_and(|f| gone_folders.contains(&f)) {
            self.open_folder = fallback;
        }
        if self.pending_open.is_some_and(|f| gone_folders.contains(&f)) {
            self.pending_open = None;
        }
        self.refresh_search();
        logged(op, result)
    }

    // ========================================
    // Entries
    // ========================================

    /// Create an entry with a scaffolded package and a first thumbnail.
    pub fn create_entry(&mut self, folder: FolderId, name: &str, entry_type: LibEntryType) -> Result<EntryId> {
        let collection = logged("create_entry", active_in(&mut self.collections, self.active))?;
        let id = logged("create_entry", collection.create_entry(folder, name, entry_type))?;
        render_thumbnail(&mut self.thumbnails, collection, id);
        self.refresh_search();
        Ok(id)
    }

    pub fn move_entry(&mut self, entry: EntryId, destination: FolderId) -> Result<String> {
        let result = self.move_entry_inner(entry, destination);
        logged("move_entry", result)
    }

    fn move_entry_inner(&mut self, entry: EntryId, destination: FolderId) -> Result<String> {
        let collection = active_in(&mut self.collections, self.active)?;
        let name = collection.move_entry(entry, destination)?;
        self.thumbnails.invalidate(entry);
        self.refresh_search();
        Ok(name)
    }

    pub fn delete_entry(&mut self, entry: EntryId) -> Result<()> {
        let result = self.delete_entry_inner(entry);
        logged("delete_entry", result)
    }

    fn delete_entry_inner(&mut self, entry: EntryId) -> Result<()> {
        let collection = active_in(&mut self.collections, self.active)?;
        collection.delete_entry(entry)?;
        self.thumbnails.invalidate(entry);
        if self.active_entry == Some(entry) {
            self.active_entry = None;
        }
        self.refresh_search();
        Ok(())
    }

    pub fn rename_entry(&mut self, entry: EntryId, name: &str) -> Result<String> {
        let collection = logged("rename_entry", active_in(&mut self.collections, self.active))?;
        let name = logged("rename_entry", collection.rename_entry(entry, name))?;
        self.thumbnails.invalidate(entry);
        self.refresh_search();
        Ok(name)
    }

    // ========================================
    // Selection and bulk operations
    // ========================================

    pub fn set_entry_selected(&mut self, entry: EntryId, selected: bool) -> Result<()> {
        let collection = logged("set_entry_selected", active_in(&mut self.collections, self.active))?;
        logged("set_entry_selected", collection.tree_mut().set_selected(entry, selected))
    }

    /// Select `entry` and deselect everything else.
    pub fn select_only(&mut self, entry: EntryId) -> Result<()> {
        let collection = logged("select_only", active_in(&mut self.collections, self.active))?;
        logged("select_only", collection.tree().entry(entry).map(|_| ()))?;
        collection.tree_mut().clear_selection();
        logged("select_only", collection.tree_mut().set_selected(entry, true))
    }

    pub fn clear_selection(&mut self) {
        if let Ok(collection) = active_in(&mut self.collections, self.active) {
            collection.tree_mut().clear_selection();
        }
    }

    /// Selected entries of the active tree, in pre-order.
    pub fn selected_entries(&self) -> Vec<EntryId> {
        self.active_collection()
            .map(|c| c.tree().selected_entries(c.tree().root_id()))
            .unwrap_or_default()
    }

    /// Selected entries directly inside `folder`.
    pub fn selected_entries_in(&self, folder: FolderId) -> Result<Vec<EntryId>> {
        let collection = self.active_collection().ok_or_else(no_active)?;
        Ok(collection
            .tree()
            .entries_in(folder)?
            .into_iter()
            .filter(|e| e.is_selected())
            .map(|e| e.id())
            .collect())
    }

    /// Delete every selected entry. Returns how many were deleted.
    ///
    /// Identities are captured before the first deletion; each removal
    /// resolves its entry afresh.
    pub fn delete_selected_entries(&mut self) -> Result<usize> {
        let selected = self.selected_entries();
        let mut deleted = 0;
        for entry in selected {
            logged("delete_selected_entries", self.delete_entry_inner(entry))?;
            deleted += 1;
        }
        debug!("Deleted {} selected entries", deleted);
        Ok(deleted)
    }

    /// Move every selected entry into `destination`. Returns how many moved.
    pub fn move_selected_entries(&mut self, destination: FolderId) -> Result<usize> {
        let collection = logged("move_selected_entries", self.active_collection().ok_or_else(no_active))?;
        logged("move_selected_entries", collection.tree().node(destination).map(|_| ()))?;
        let selected: Vec<EntryId> = self
            .selected_entries()
            .into_iter()
            .filter(|e| {
                collection
                    .tree()
                    .find_entry_by_id(*e)
                    .is_some_and(|record| record.folder() != destination)
            })
            .collect();

        let mut moved = 0;
        for entry in selected {
            logged("move_selected_entries", self.move_entry_inner(entry, destination))?;
            moved += 1;
        }
        Ok(moved)
    }

    /// Apply a drag-and-drop onto `destination`.
    ///
    /// Dragged entries deleted since the drag started are skipped.
    pub fn drop_payload(&mut self, payload: DragPayload, destination: FolderId) -> Result<()> {
        match payload {
            DragPayload::Folder(folder) => self.move_folder(folder, destination),
            DragPayload::Entries(entries) => {
                let collection = logged("drop_payload", self.active_collection().ok_or_else(no_active))?;
                logged("drop_payload", collection.tree().node(destination).map(|_| ()))?;
                for entry in entries {
                    match self.move_entry_inner(entry, destination) {
                        Ok(_) => {}
                        Err(e @ MnemosyError::NotFound { .. }) => {
                            warn!("Dropped {} is gone: {}", entry, e);
                        }
                        Err(e) => return logged("drop_payload", Err(e)),
                    }
                }
                Ok(())
            }
        }
    }

    // ========================================
    // Search
    // ========================================

    /// Search the active collection; returns whether anything matched.
    ///
    /// A blank keyword leaves search mode.
    pub fn search_lib_entries_for_keyword(&mut self, keyword: &str) -> bool {
        let found = match self.active.and_then(|i| self.collections.get(i)) {
            Some(collection) => self.search.run(collection.tree(), keyword),
            None => {
                self.search.clear();
                false
            }
        };
        if !self.search.in_search_mode() {
            self.open_folder = self.active_root();
        }
        self.thumbnails.invalidate_all();
        found
    }

    /// Leave search mode and show the tree from the root again.
    pub fn clear_search(&mut self) {
        self.search.clear();
        self.open_folder = self.active_root();
        self.thumbnails.invalidate_all();
    }

    pub fn in_search_mode(&self) -> bool {
        self.search.in_search_mode()
    }

    pub fn search_keyword(&self) -> Option<&str> {
        self.search.keyword()
    }

    pub fn search_results(&self) -> &[EntryId] {
        self.search.results()
    }

    fn refresh_search(&mut self) {
        if let Some(collection) = self.active.and_then(|i| self.collections.get(i)) {
            self.search.refresh(collection.tree());
        }
    }

    // ========================================
    // Frame state
    // ========================================

    pub fn open_folder(&self) -> Option<FolderId> {
        self.open_folder
    }

    /// Ask for `id` to become the open folder on the next frame.
    pub fn request_open_folder(&mut self, id: FolderId) {
        self.pending_open = Some(id);
    }

    pub fn pending_open_folder(&self) -> Option<FolderId> {
        self.pending_open
    }

    /// Entries the GUI shows this frame.
    pub fn visible_entries(&self) -> Vec<EntryId> {
        if self.search.in_search_mode() {
            return self.search.results().to_vec();
        }
        match (self.active_collection(), self.open_folder) {
            (Some(collection), Some(folder)) => collection
                .tree()
                .find_node_by_id(folder)
                .map(|node| node.sub_entries().to_vec())
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    /// Start a frame: apply a pending open request, queue thumbnails of
    /// visible entries and load a budgeted batch of them.
    ///
    /// Only as many visible entries as the thumbnail cache can hold are
    /// requested, so an unchanged view settles to zero loads per frame.
    ///
    /// Returns how many thumbnails were processed.
    pub fn begin_frame(&mut self) -> usize {
        if let Some(id) = self.pending_open.take() {
            let exists = self
                .active_collection()
                .is_some_and(|c| c.tree().find_node_by_id(id).is_some());
            if !exists {
                warn!("Requested folder {} no longer exists", id);
            } else if self.open_folder != Some(id) {
                self.open_folder = Some(id);
                self.thumbnails.invalidate_all();
            }
        }

        let visible = self.visible_entries();
        let window = self.thumbnails.capacity();
        if let Some(collection) = self.active.and_then(|i| self.collections.get(i)) {
            for entry in visible.into_iter().take(window) {
                if let (Ok(record), Ok(dir)) = (collection.tree().entry(entry), collection.package_path(entry)) {
                    self.thumbnails.request(entry, &dir, record.entry_type());
                    self.thumbnails.reload(entry);
                }
            }
        }
        self.thumbnails.process_pending(self.frame_budget)
    }

    pub fn active_entry(&self) -> Option<EntryId> {
        self.active_entry
    }

    /// Load `entry` for preview.
    pub fn set_active_entry(&mut self, entry: EntryId) -> Result<()> {
        let collection = logged("set_active_entry", self.active_collection().ok_or_else(no_active))?;
        logged("set_active_entry", collection.tree().entry(entry).map(|_| ()))?;
        self.active_entry = Some(entry);
        Ok(())
    }

    pub fn clear_active_entry(&mut self) {
        self.active_entry = None;
    }

    // ========================================
    // Packages
    // ========================================

    pub fn export_entry(&self, entry: EntryId, destination_dir: &Path) -> Result<PathBuf> {
        let collection = logged("export_entry", self.active_collection().ok_or_else(no_active))?;
        logged("export_entry", collection.export_entry(entry, destination_dir))
    }

    pub fn import_entry(&mut self, folder: FolderId, source_dir: &Path) -> Result<EntryId> {
        let collection = logged("import_entry", active_in(&mut self.collections, self.active))?;
        let id = logged("import_entry", collection.import_entry(folder, source_dir))?;
        render_thumbnail(&mut self.thumbnails, collection, id);
        self.refresh_search();
        Ok(id)
    }

    pub fn assign_channel(&mut self, entry: EntryId, channel: TextureChannel, source: &Path) -> Result<String> {
        let collection = logged("assign_channel", active_in(&mut self.collections, self.active))?;
        let file = logged("assign_channel", collection.assign_channel(entry, channel, source))?;
        render_thumbnail(&mut self.thumbnails, collection, entry);
        Ok(file)
    }

    pub fn read_material(&self, entry: EntryId) -> Result<PackageMetadata> {
        let collection = logged("read_material", self.active_collection().ok_or_else(no_active))?;
        logged("read_material", collection.read_package(entry))
    }

    pub fn write_material(&mut self, entry: EntryId, params: MaterialParameters) -> Result<PackageMetadata> {
        let collection = logged("write_material", active_in(&mut self.collections, self.active))?;
        let metadata = logged("write_material", collection.write_material(entry, params))?;
        render_thumbnail(&mut self.thumbnails, collection, entry);
        Ok(metadata)
    }

    /// Compare the active collection with its directory on disk.
    pub fn verify_collection(&self) -> Result<LibraryHealth> {
        let collection = logged("verify_collection", self.active_collection().ok_or_else(no_active))?;
        let health = logged("verify_collection", collection.verify())?;
        if !health.is_healthy() {
            warn!(
                "Library '{}' drifted from disk: {} missing folders, {} missing packages, {} orphan directories",
                collection.name(),
                health.missing_folders.len(),
                health.missing_packages.len(),
                health.orphan_dirs.len()
            );
        }
        Ok(health)
    }
}
