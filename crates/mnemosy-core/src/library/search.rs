//! Keyword search over the entries of a tree.

use crate::library::tree::FolderTree;
use crate::library::types::EntryId;

/// Entries whose name contains `keyword`, ignoring case, in pre-order.
pub fn search_entries(tree: &FolderTree, keyword: &str) -> Vec<EntryId> {
    let needle = keyword.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    tree.preorder_entries(tree.root_id())
        .into_iter()
        .filter(|id| {
            tree.find_entry_by_id(*id)
                .is_some_and(|e| e.name().to_lowercase().contains(&needle))
        })
        .collect()
}

/// Search mode of the registry: the last keyword and its result list.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    keyword: Option<String>,
    results: Vec<EntryId>,
}

impl SearchState {
    /// Run `keyword` against `tree` and enter search mode.
    ///
    /// A blank keyword leaves search mode instead. Returns whether anything
    /// matched.
    pub fn run(&mut self, tree: &FolderTree, keyword: &str) -> bool {
        if keyword.trim().is_empty() {
            self.clear();
            return false;
        }
        self.keyword = Some(keyword.to_string());
        self.results = search_entries(tree, keyword);
        !self.results.is_empty()
    }

    /// Rebuild the results after the tree changed.
    pub fn refresh(&mut self, tree: &FolderTree) {
        if let Some(keyword) = &self.keyword {
            self.results = search_entries(tree, keyword);
        }
    }

    pub fn clear(&mut self) {
        self.keyword = None;
        self.results.clear();
    }

    pub fn in_search_mode(&self) -> bool {
        self.keyword.is_some()
    }

    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref()
    }

    pub fn results(&self) -> &[EntryId] {
        &self.results
    }
}
