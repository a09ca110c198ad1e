//! In-memory folder tree of one material library.
//!
//! Nodes and entries live in ID-keyed arenas. Parents own their children by
//! listing their IDs in display order; children point back at their parent
//! by ID. Nothing outside this module can rewire those links, so the
//! single-parent and acyclicity invariants are maintained here alone.
//!
//! The tree knows nothing about the filesystem. [`crate::library::LibCollection`]
//! performs the disk side of every mutation first and only then calls in here.

use crate::error::{MnemosyError, Result};
use crate::library::naming::{names_equal, unique_name};
use crate::library::types::{EntryId, FolderId, LibEntryType};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

/// A directory-like node grouping sub-folders and entries.
#[derive(Debug, Clone, PartialEq)]
pub struct FolderNode {
    id: FolderId,
    name: String,
    parent: Option<FolderId>,
    sub_nodes: Vec<FolderId>,
    sub_entries: Vec<EntryId>,
}

impl FolderNode {
    pub fn id(&self) -> FolderId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<FolderId> {
        self.parent
    }

    /// Child folders in display order.
    pub fn sub_nodes(&self) -> &[FolderId] {
        &self.sub_nodes
    }

    /// Entries in display order.
    pub fn sub_entries(&self) -> &[EntryId] {
        &self.sub_entries
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_empty(&self) -> bool {
        self.sub_nodes.is_empty() && self.sub_entries.is_empty()
    }
}

/// A leaf asset record: one material, texture or skybox.
#[derive(Debug, Clone, PartialEq)]
pub struct LibEntry {
    id: EntryId,
    name: String,
    entry_type: LibEntryType,
    folder: FolderId,
    selected: bool,
}

impl LibEntry {
    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entry_type(&self) -> LibEntryType {
        self.entry_type
    }

    /// Folder currently owning this entry.
    pub fn folder(&self) -> FolderId {
        self.folder
    }

    /// Transient UI selection flag; never persisted.
    pub fn is_selected(&self) -> bool {
        self.selected
    }
}

/// Either kind of tree item, used where folders and entries share a namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef {
    Folder(FolderId),
    Entry(EntryId),
}

/// Everything removed by a subtree deletion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemovedItems {
    pub folders: Vec<FolderId>,
    pub entries: Vec<EntryId>,
}

/// The folder tree of one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct FolderTree {
    root: FolderId,
    nodes: HashMap<FolderId, FolderNode>,
    entries: HashMap<EntryId, LibEntry>,
    /// Monotonic; IDs are never handed out twice.
    next_id: u64,
}

impl FolderTree {
    /// Create a tree holding only a root folder.
    pub fn new(root_name: &str) -> Self {
        let root = FolderId(1);
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            FolderNode {
                id: root,
                name: root_name.to_string(),
                parent: None,
                sub_nodes: Vec::new(),
                sub_entries: Vec::new(),
            },
        );
        Self {
            root,
            nodes,
            entries: HashMap::new(),
            next_id: 2,
        }
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    // ========================================
    // Lookup
    // ========================================

    pub fn root_id(&self) -> FolderId {
        self.root
    }

    pub fn root(&self) -> &FolderNode {
        // The root is inserted in `new` and can never be removed.
        &self.nodes[&self.root]
    }

    /// Resolve a folder ID to the live node, if it still exists.
    pub fn find_node_by_id(&self, id: FolderId) -> Option<&FolderNode> {
        self.nodes.get(&id)
    }

    /// Resolve an entry ID to the live entry, if it still exists.
    pub fn find_entry_by_id(&self, id: EntryId) -> Option<&LibEntry> {
        self.entries.get(&id)
    }

    /// Like [`Self::find_node_by_id`] but reports `NotFound`.
    pub fn node(&self, id: FolderId) -> Result<&FolderNode> {
        self.nodes
            .get(&id)
            .ok_or_else(|| MnemosyError::not_found(id.to_string()))
    }

    /// Like [`Self::find_entry_by_id`] but reports `NotFound`.
    pub fn entry(&self, id: EntryId) -> Result<&LibEntry> {
        self.entries
            .get(&id)
            .ok_or_else(|| MnemosyError::not_found(id.to_string()))
    }

    fn node_mut(&mut self, id: FolderId) -> Result<&mut FolderNode> {
        self.nodes
            .get_mut(&id)
            .ok_or_else(|| MnemosyError::not_found(id.to_string()))
    }

    fn entry_mut(&mut self, id: EntryId) -> Result<&mut LibEntry> {
        self.entries
            .get_mut(&id)
            .ok_or_else(|| MnemosyError::not_found(id.to_string()))
    }

    pub fn folder_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Entries of `folder` in display order.
    pub fn entries_in(&self, folder: FolderId) -> Result<Vec<&LibEntry>> {
        let node = self.node(folder)?;
        Ok(node
            .sub_entries
            .iter()
            .filter_map(|id| self.entries.get(id))
            .collect())
    }

    /// Whether `node` is `ancestor` or lies somewhere below it.
    pub fn is_descendant_or_self(&self, ancestor: FolderId, node: FolderId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(&id).and_then(|n| n.parent);
        }
        false
    }

    /// Folder IDs from the root down to `id`, inclusive.
    pub fn ancestry(&self, id: FolderId) -> Result<Vec<FolderId>> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(folder) = current {
            chain.push(folder);
            current = self.node(folder)?.parent;
        }
        chain.reverse();
        Ok(chain)
    }

    /// Directory of `id` relative to the library root (empty for the root).
    pub fn relative_folder_path(&self, id: FolderId) -> Result<PathBuf> {
        let mut path = PathBuf::new();
        for folder in self.ancestry(id)?.into_iter().skip(1) {
            path.push(&self.node(folder)?.name);
        }
        Ok(path)
    }

    /// Package directory of `id` relative to the library root.
    pub fn relative_entry_path(&self, id: EntryId) -> Result<PathBuf> {
        let entry = self.entry(id)?;
        Ok(self.relative_folder_path(entry.folder)?.join(&entry.name))
    }

    /// Slash-separated display path, e.g. `Root/Bricks/Red`.
    pub fn display_path(&self, id: FolderId) -> Result<String> {
        let names = self
            .ancestry(id)?
            .into_iter()
            .map(|f| self.node(f).map(|n| n.name.clone()))
            .collect::<Result<Vec<_>>>()?;
        Ok(names.join("/"))
    }

    /// Resolve a slash-separated path below the root (`""` or `"/"` is the root).
    pub fn find_folder_by_path(&self, path: &str) -> Option<FolderId> {
        let mut current = self.root;
        for part in path.split('/').filter(|p| !p.trim().is_empty()) {
            let node = self.nodes.get(&current)?;
            current = *node.sub_nodes.iter().find(|child| {
                self.nodes
                    .get(child)
                    .is_some_and(|c| names_equal(&c.name, part.trim()))
            })?;
        }
        Some(current)
    }

    /// Find an entry by name directly inside `folder`.
    pub fn find_entry_in(&self, folder: FolderId, name: &str) -> Option<EntryId> {
        let node = self.nodes.get(&folder)?;
        node.sub_entries
            .iter()
            .copied()
            .find(|id| self.entries.get(id).is_some_and(|e| names_equal(&e.name, name)))
    }

    /// Current index of `id` among its parent's sub-folders.
    pub fn position_in_parent(&self, id: FolderId) -> Option<usize> {
        let parent = self.nodes.get(&id)?.parent?;
        self.nodes.get(&parent)?.sub_nodes.iter().position(|c| *c == id)
    }

    // ========================================
    // Traversal
    // ========================================

    /// Folders below and including `from`, parents before children.
    pub fn preorder_folders(&self, from: FolderId) -> Vec<FolderId> {
        let mut order = Vec::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get(&id) {
                order.push(id);
                stack.extend(node.sub_nodes.iter().rev());
            }
        }
        order
    }

    /// Folders below and including `from`, children before parents.
    pub fn postorder_folders(&self, from: FolderId) -> Vec<FolderId> {
        fn visit(tree: &FolderTree, id: FolderId, out: &mut Vec<FolderId>) {
            if let Some(node) = tree.nodes.get(&id) {
                for child in &node.sub_nodes {
                    visit(tree, *child, out);
                }
                out.push(id);
            }
        }
        let mut order = Vec::new();
        visit(self, from, &mut order);
        order
    }

    /// Entries below `from` in pre-order: a folder's own entries first, then
    /// each sub-folder in turn.
    pub fn preorder_entries(&self, from: FolderId) -> Vec<EntryId> {
        self.preorder_folders(from)
            .into_iter()
            .filter_map(|f| self.nodes.get(&f))
            .flat_map(|n| n.sub_entries.iter().copied())
            .collect()
    }

    // ========================================
    // Names
    // ========================================

    /// Whether `name` is used by any sub-folder or entry of `folder`,
    /// ignoring `exclude`.
    pub fn child_name_taken(&self, folder: FolderId, name: &str, exclude: Option<NodeRef>) -> bool {
        let Some(node) = self.nodes.get(&folder) else {
            return false;
        };
        let folder_hit = node.sub_nodes.iter().any(|id| {
            exclude != Some(NodeRef::Folder(*id))
                && self.nodes.get(id).is_some_and(|n| names_equal(&n.name, name))
        });
        folder_hit
            || node.sub_entries.iter().any(|id| {
                exclude != Some(NodeRef::Entry(*id))
                    && self.entries.get(id).is_some_and(|e| names_equal(&e.name, name))
            })
    }

    /// First free variant of `proposed` among the children of `folder`.
    pub fn unique_child_name(&self, folder: FolderId, proposed: &str, exclude: Option<NodeRef>) -> String {
        unique_name(proposed, |candidate| {
            self.child_name_taken(folder, candidate, exclude)
        })
    }

    // ========================================
    // Mutation (crate-internal: disk goes first)
    // ========================================

    pub(crate) fn insert_folder(&mut self, parent: FolderId, name: &str) -> Result<FolderId> {
        self.node(parent)?;
        let id = FolderId(self.allocate_id());
        self.nodes.insert(
            id,
            FolderNode {
                id,
                name: name.to_string(),
                parent: Some(parent),
                sub_nodes: Vec::new(),
                sub_entries: Vec::new(),
            },
        );
        self.node_mut(parent)?.sub_nodes.push(id);
        Ok(id)
    }

    pub(crate) fn insert_entry(&mut self, folder: FolderId, name: &str, entry_type: LibEntryType) -> Result<EntryId> {
        self.node(folder)?;
        let id = EntryId(self.allocate_id());
        self.entries.insert(
            id,
            LibEntry {
                id,
                name: name.to_string(),
                entry_type,
                folder,
                selected: false,
            },
        );
        self.node_mut(folder)?.sub_entries.push(id);
        Ok(id)
    }

    /// Validate a folder move without touching anything.
    pub fn check_move_folder(&self, source: FolderId, destination: FolderId) -> Result<()> {
        let node = self.node(source)?;
        let dest = self.node(destination)?;
        if node.is_root() {
            return Err(MnemosyError::invalid_operation("the root folder cannot be moved"));
        }
        if self.is_descendant_or_self(source, destination) {
            return Err(MnemosyError::invalid_operation(format!(
                "cannot move '{}' into itself or one of its descendants",
                node.name
            )));
        }
        if node.parent == Some(destination) {
            return Err(MnemosyError::invalid_operation(format!(
                "'{}' is already inside '{}'",
                node.name, dest.name
            )));
        }
        if self.child_name_taken(destination, &node.name, None) {
            return Err(MnemosyError::NameCollision {
                name: node.name.clone(),
                parent: dest.name.clone(),
            });
        }
        Ok(())
    }

    pub(crate) fn move_folder(&mut self, source: FolderId, destination: FolderId) -> Result<()> {
        self.check_move_folder(source, destination)?;
        let old_parent = self.node(source)?.parent.ok_or_else(|| {
            MnemosyError::invalid_operation("the root folder cannot be moved")
        })?;
        self.node_mut(old_parent)?.sub_nodes.retain(|c| *c != source);
        self.node_mut(destination)?.sub_nodes.push(source);
        self.node_mut(source)?.parent = Some(destination);
        Ok(())
    }

    /// Transfer `entry` to the end of `destination`, renaming it on the way.
    pub(crate) fn move_entry(&mut self, entry: EntryId, destination: FolderId, new_name: &str) -> Result<()> {
        self.node(destination)?;
        let source = self.entry(entry)?.folder;
        // Removal by identity: positions are resolved now, not remembered.
        self.node_mut(source)?.sub_entries.retain(|e| *e != entry);
        self.node_mut(destination)?.sub_entries.push(entry);
        let record = self.entry_mut(entry)?;
        record.folder = destination;
        record.name = new_name.to_string();
        Ok(())
    }

    pub(crate) fn rename_folder(&mut self, id: FolderId, name: &str) -> Result<()> {
        self.node_mut(id)?.name = name.to_string();
        Ok(())
    }

    pub(crate) fn rename_entry(&mut self, id: EntryId, name: &str) -> Result<()> {
        self.entry_mut(id)?.name = name.to_string();
        Ok(())
    }

    /// Remove `id` and hand its children to its parent, placing the
    /// sub-folders where `id` used to sit and appending the entries.
    pub(crate) fn dissolve_folder(&mut self, id: FolderId) -> Result<()> {
        let node = self.node(id)?;
        let parent = node
            .parent
            .ok_or_else(|| MnemosyError::invalid_operation("the root folder cannot be deleted"))?;
        let position = self.position_in_parent(id).ok_or_else(|| {
            MnemosyError::invalid_operation(format!("{} is detached from its parent", id))
        })?;

        let removed = self.nodes.remove(&id).ok_or_else(|| MnemosyError::not_found(id.to_string()))?;

        for child in &removed.sub_nodes {
            self.node_mut(*child)?.parent = Some(parent);
        }
        for entry in &removed.sub_entries {
            self.entry_mut(*entry)?.folder = parent;
        }

        let parent_node = self.node_mut(parent)?;
        parent_node.sub_nodes.remove(position);
        for (offset, child) in removed.sub_nodes.iter().enumerate() {
            parent_node.sub_nodes.insert(position + offset, *child);
        }
        parent_node.sub_entries.extend(removed.sub_entries.iter().copied());
        Ok(())
    }

    /// Remove `id` and everything below it.
    pub(crate) fn remove_subtree(&mut self, id: FolderId) -> Result<RemovedItems> {
        let parent = self
            .node(id)?
            .parent
            .ok_or_else(|| MnemosyError::invalid_operation("the root folder cannot be deleted"))?;

        let mut removed = RemovedItems::default();
        for folder in self.postorder_folders(id) {
            if let Some(node) = self.nodes.remove(&folder) {
                for entry in node.sub_entries {
                    self.entries.remove(&entry);
                    removed.entries.push(entry);
                }
                removed.folders.push(folder);
            }
        }
        self.node_mut(parent)?.sub_nodes.retain(|c| *c != id);
        Ok(removed)
    }

    pub(crate) fn remove_entry(&mut self, id: EntryId) -> Result<LibEntry> {
        let folder = self.entry(id)?.folder;
        self.node_mut(folder)?.sub_entries.retain(|e| *e != id);
        self.entries
            .remove(&id)
            .ok_or_else(|| MnemosyError::not_found(id.to_string()))
    }

    /// Drop an empty, entry-less folder that is a leaf. Used to prune a
    /// partially deleted hierarchy.
    pub(crate) fn remove_leaf_folder(&mut self, id: FolderId) -> Result<()> {
        let node = self.node(id)?;
        if !node.is_empty() {
            return Err(MnemosyError::invalid_operation(format!("{} is not empty", id)));
        }
        let parent = node
            .parent
            .ok_or_else(|| MnemosyError::invalid_operation("the root folder cannot be deleted"))?;
        self.nodes.remove(&id);
        self.node_mut(parent)?.sub_nodes.retain(|c| *c != id);
        Ok(())
    }

    // ========================================
    // Selection
    // ========================================

    pub fn set_selected(&mut self, id: EntryId, selected: bool) -> Result<()> {
        self.entry_mut(id)?.selected = selected;
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        for entry in self.entries.values_mut() {
            entry.selected = false;
        }
    }

    /// Selected entries below `from`, in pre-order.
    pub fn selected_entries(&self, from: FolderId) -> Vec<EntryId> {
        self.preorder_entries(from)
            .into_iter()
            .filter(|id| self.entries.get(id).is_some_and(|e| e.selected))
            .collect()
    }

    // ========================================
    // Invariants
    // ========================================

    /// Walk from the root and confirm every node and entry is reachable
    /// exactly once with consistent back-links.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        let root = self.nodes.get(&self.root).ok_or("root missing")?;
        if root.parent.is_some() {
            return Err("root has a parent".into());
        }

        let mut seen_folders = HashSet::new();
        let mut seen_entries = HashSet::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if !seen_folders.insert(id) {
                return Err(format!("{} reachable twice", id));
            }
            let node = self.nodes.get(&id).ok_or(format!("{} dangling", id))?;
            for child in &node.sub_nodes {
                let child_node = self.nodes.get(child).ok_or(format!("{} dangling", child))?;
                if child_node.parent != Some(id) {
                    return Err(format!("{} has wrong parent link", child));
                }
                stack.push(*child);
            }
            for entry in &node.sub_entries {
                let record = self.entries.get(entry).ok_or(format!("{} dangling", entry))?;
                if record.folder != id {
                    return Err(format!("{} has wrong folder link", entry));
                }
                if !seen_entries.insert(*entry) {
                    return Err(format!("{} listed twice", entry));
                }
            }
        }

        if seen_folders.len() != self.nodes.len() {
            return Err(format!(
                "{} folders unreachable",
                self.nodes.len() - seen_folders.len()
            ));
        }
        if seen_entries.len() != self.entries.len() {
            return Err(format!(
                "{} entries unreachable",
                self.entries.len() - seen_entries.len()
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> (FolderTree, FolderId, FolderId, FolderId) {
        let mut tree = FolderTree::new("Root");
        let root = tree.root_id();
        let a = tree.insert_folder(root, "A").unwrap();
        let b = tree.insert_folder(a, "B").unwrap();
        let c = tree.insert_folder(a, "C").unwrap();
        (tree, a, b, c)
    }

    #[test]
    fn test_new_tree_has_only_root() {
        let tree = FolderTree::new("Root");
        assert_eq!(tree.folder_count(), 1);
        assert!(tree.root().is_root());
        assert_eq!(tree.root().name(), "Root");
        assert!(tree.check_invariants().is_ok());
    }

    #[test]
    fn test_ids_are_monotonic_and_not_reused() {
        let (mut tree, a, b, c) = sample_tree();
        assert!(a < b && b < c);
        tree.remove_subtree(c).unwrap();
        let d = tree.insert_folder(a, "D").unwrap();
        assert!(d > c);
    }

    #[test]
    fn test_relative_paths() {
        let (mut tree, a, b, _) = sample_tree();
        let entry = tree.insert_entry(b, "Brick", LibEntryType::PbrMaterial).unwrap();
        assert_eq!(tree.relative_folder_path(tree.root_id()).unwrap(), PathBuf::new());
        assert_eq!(tree.relative_folder_path(b).unwrap(), PathBuf::from("A").join("B"));
        assert_eq!(
            tree.relative_entry_path(entry).unwrap(),
            PathBuf::from("A").join("B").join("Brick")
        );
        assert_eq!(tree.display_path(a).unwrap(), "Root/A");
    }

    #[test]
    fn test_find_folder_by_path() {
        let (tree, a, b, _) = sample_tree();
        assert_eq!(tree.find_folder_by_path(""), Some(tree.root_id()));
        assert_eq!(tree.find_folder_by_path("/a"), Some(a));
        assert_eq!(tree.find_folder_by_path("A/B/"), Some(b));
        assert_eq!(tree.find_folder_by_path("A/Z"), None);
    }

    #[test]
    fn test_move_folder_rejects_cycle() {
        let (mut tree, a, b, _) = sample_tree();
        let before = tree.clone();
        let result = tree.move_folder(a, b);
        assert!(matches!(result, Err(MnemosyError::InvalidOperation { .. })));
        assert!(matches!(tree.move_folder(a, a), Err(MnemosyError::InvalidOperation { .. })));
        assert_eq!(tree, before);
    }

    #[test]
    fn test_move_folder_rejects_root_and_collision() {
        let (mut tree, a, b, c) = sample_tree();
        let root = tree.root_id();
        assert!(matches!(tree.move_folder(root, a), Err(MnemosyError::InvalidOperation { .. })));

        let other_b = tree.insert_folder(c, "b").unwrap();
        assert!(matches!(
            tree.move_folder(other_b, a),
            Err(MnemosyError::NameCollision { .. })
        ));
        assert_eq!(tree.node(b).unwrap().parent(), Some(a));
    }

    #[test]
    fn test_move_folder_reparents() {
        let (mut tree, a, b, c) = sample_tree();
        tree.move_folder(b, c).unwrap();
        assert_eq!(tree.node(a).unwrap().sub_nodes(), &[c]);
        assert_eq!(tree.node(c).unwrap().sub_nodes(), &[b]);
        assert_eq!(tree.node(b).unwrap().parent(), Some(c));
        assert!(tree.check_invariants().is_ok());
    }

    #[test]
    fn test_dissolve_folder_keeps_position() {
        let mut tree = FolderTree::new("Root");
        let root = tree.root_id();
        let first = tree.insert_folder(root, "First").unwrap();
        let a = tree.insert_folder(root, "A").unwrap();
        let last = tree.insert_folder(root, "Last").unwrap();
        let b = tree.insert_folder(a, "B").unwrap();
        let c = tree.insert_folder(a, "C").unwrap();
        let existing = tree.insert_entry(root, "existing", LibEntryType::Skybox).unwrap();
        let e1 = tree.insert_entry(a, "e1", LibEntryType::UnlitTexture).unwrap();
        let e2 = tree.insert_entry(a, "e2", LibEntryType::UnlitTexture).unwrap();

        tree.dissolve_folder(a).unwrap();

        assert_eq!(tree.root().sub_nodes(), &[first, b, c, last]);
        assert_eq!(tree.root().sub_entries(), &[existing, e1, e2]);
        assert_eq!(tree.entry(e1).unwrap().folder(), root);
        assert!(tree.find_node_by_id(a).is_none());
        assert!(tree.check_invariants().is_ok());
    }

    #[test]
    fn test_remove_subtree_reports_everything() {
        let (mut tree, a, b, c) = sample_tree();
        let e = tree.insert_entry(b, "e", LibEntryType::Skybox).unwrap();
        let removed = tree.remove_subtree(a).unwrap();
        assert_eq!(removed.folders, vec![b, c, a]);
        assert_eq!(removed.entries, vec![e]);
        assert_eq!(tree.folder_count(), 1);
        assert_eq!(tree.entry_count(), 0);
        assert!(tree.check_invariants().is_ok());
    }

    #[test]
    fn test_preorder_entries_groups_by_folder() {
        let (mut tree, a, b, c) = sample_tree();
        let root = tree.root_id();
        let r1 = tree.insert_entry(root, "r1", LibEntryType::PbrMaterial).unwrap();
        let c1 = tree.insert_entry(c, "c1", LibEntryType::PbrMaterial).unwrap();
        let b1 = tree.insert_entry(b, "b1", LibEntryType::PbrMaterial).unwrap();
        let a1 = tree.insert_entry(a, "a1", LibEntryType::PbrMaterial).unwrap();
        assert_eq!(tree.preorder_entries(root), vec![r1, a1, b1, c1]);
    }

    #[test]
    fn test_child_names_share_namespace() {
        let (mut tree, a, _, _) = sample_tree();
        assert!(tree.child_name_taken(a, "b", None));
        tree.insert_entry(a, "Tile", LibEntryType::PbrMaterial).unwrap();
        assert_eq!(tree.unique_child_name(a, "TILE", None), "TILE (1)");
        assert_eq!(tree.unique_child_name(a, "D", None), "D");
    }

    #[test]
    fn test_selection_roundtrip() {
        let (mut tree, a, _, _) = sample_tree();
        let x = tree.insert_entry(a, "x", LibEntryType::PbrMaterial).unwrap();
        let y = tree.insert_entry(a, "y", LibEntryType::PbrMaterial).unwrap();
        tree.set_selected(y, true).unwrap();
        assert_eq!(tree.selected_entries(tree.root_id()), vec![y]);
        tree.set_selected(x, true).unwrap();
        tree.clear_selection();
        assert!(tree.selected_entries(tree.root_id()).is_empty());
    }
}
