//! Thumbnail cache keyed by entry.
//!
//! Loading is frame-driven: callers `request` thumbnails while drawing and
//! the pending queue is drained a few items per frame by
//! [`ThumbnailManager::process_pending`]. Decoded images form a bounded
//! active set; when it overflows the oldest loaded thumbnail is unloaded.

use crate::config::ThumbnailConfig;
use crate::error::Result;
use crate::library::package;
use crate::library::types::{EntryId, LibEntryType};
use crate::thumbnails::renderer::{PlaceholderRenderer, ThumbnailRenderer};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Decoded RGBA thumbnail.
#[derive(Debug, Clone, PartialEq)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Load state of an entry's thumbnail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailState {
    /// Not requested yet.
    NotGenerated,
    /// Queued for the next `process_pending`.
    Pending,
    Ready,
    Failed,
    /// Loaded once, then unloaded to make room. Only [`ThumbnailManager::reload`]
    /// queues it again.
    Evicted,
}

struct Slot {
    state: ThumbnailState,
    thumbnail: Option<Thumbnail>,
    package_dir: PathBuf,
    entry_type: LibEntryType,
}

pub struct ThumbnailManager {
    renderer: Box<dyn ThumbnailRenderer>,
    slots: HashMap<EntryId, Slot>,
    pending: VecDeque<EntryId>,
    /// Loaded thumbnails, oldest first.
    active: VecDeque<EntryId>,
    capacity: usize,
}

impl Default for ThumbnailManager {
    fn default() -> Self {
        Self::new(
            Box::new(PlaceholderRenderer::default()),
            ThumbnailConfig::DEFAULT_CAPACITY,
        )
    }
}

impl ThumbnailManager {
    pub fn new(renderer: Box<dyn ThumbnailRenderer>, capacity: usize) -> Self {
        Self {
            renderer,
            slots: HashMap::new(),
            pending: VecDeque::new(),
            active: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn state(&self, entry: EntryId) -> ThumbnailState {
        self.slots
            .get(&entry)
            .map(|s| s.state)
            .unwrap_or(ThumbnailState::NotGenerated)
    }

    pub fn get(&self, entry: EntryId) -> Option<&Thumbnail> {
        self.slots.get(&entry).and_then(|s| s.thumbnail.as_ref())
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn loaded_count(&self) -> usize {
        self.active.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Queue the thumbnail of `entry` for loading.
    ///
    /// No-op while it is already pending, loaded, failed or evicted for the
    /// same package path.
    pub fn request(&mut self, entry: EntryId, package_dir: &Path, entry_type: LibEntryType) {
        if let Some(slot) = self.slots.get(&entry) {
            if slot.package_dir == package_dir && slot.state != ThumbnailState::NotGenerated {
                return;
            }
            self.invalidate(entry);
        }
        self.slots.insert(
            entry,
            Slot {
                state: ThumbnailState::Pending,
                thumbnail: None,
                package_dir: package_dir.to_path_buf(),
                entry_type,
            },
        );
        self.pending.push_back(entry);
    }

    /// Queue an evicted thumbnail for loading again.
    ///
    /// Returns whether anything was queued.
    pub fn reload(&mut self, entry: EntryId) -> bool {
        match self.slots.get_mut(&entry) {
            Some(slot) if slot.state == ThumbnailState::Evicted => {
                slot.state = ThumbnailState::Pending;
                self.pending.push_back(entry);
                true
            }
            _ => false,
        }
    }

    /// Render the thumbnail file of `entry` now and queue it for loading.
    pub fn render(&mut self, entry: EntryId, package_dir: &Path, entry_type: LibEntryType) -> Result<()> {
        self.invalidate(entry);
        let output = package::thumbnail_path(package_dir);
        let rendered = self.renderer.render(package_dir, entry_type, &output);
        self.request(entry, package_dir, entry_type);
        rendered
    }

    /// Re-render after the package contents changed.
    pub fn refresh(&mut self, entry: EntryId, package_dir: &Path, entry_type: LibEntryType) -> Result<()> {
        debug!("Refreshing thumbnail of {}", entry);
        self.render(entry, package_dir, entry_type)
    }

    /// Forget everything cached for `entry`.
    pub fn invalidate(&mut self, entry: EntryId) {
        if self.slots.remove(&entry).is_some() {
            self.pending.retain(|e| *e != entry);
            self.active.retain(|e| *e != entry);
        }
    }

    /// Forget every cached thumbnail.
    pub fn invalidate_all(&mut self) {
        self.slots.clear();
        self.pending.clear();
        self.active.clear();
    }

    /// Load up to `budget` pending thumbnails, rendering missing files.
    ///
    /// Returns how many were processed.
    pub fn process_pending(&mut self, budget: usize) -> usize {
        let mut processed = 0;
        while processed < budget {
            let Some(entry) = self.pending.pop_front() else {
                break;
            };
            let Some(slot) = self.slots.get(&entry) else {
                continue;
            };
            let loaded = self.load(&slot.package_dir, slot.entry_type);

            if let Some(slot) = self.slots.get_mut(&entry) {
                match loaded {
                    Ok(thumbnail) => {
                        slot.thumbnail = Some(thumbnail);
                        slot.state = ThumbnailState::Ready;
                        self.active.push_back(entry);
                    }
                    Err(e) => {
                        warn!("Thumbnail of {} failed: {}", entry, e);
                        slot.thumbnail = None;
                        slot.state = ThumbnailState::Failed;
                    }
                }
            }
            processed += 1;
        }
        self.evict_if_needed();
        processed
    }

    fn load(&self, package_dir: &Path, entry_type: LibEntryType) -> Result<Thumbnail> {
        let path = package::thumbnail_path(package_dir);
        if !path.is_file() {
            self.renderer.render(package_dir, entry_type, &path)?;
        }
        let image = image::open(&path)?.to_rgba8();
        Ok(Thumbnail {
            width: image.width(),
            height: image.height(),
            data: image.into_raw(),
        })
    }

    fn evict_if_needed(&mut self) {
        while self.active.len() > self.capacity {
            let Some(oldest) = self.active.pop_front() else {
                break;
            };
            if let Some(slot) = self.slots.get_mut(&oldest) {
                slot.thumbnail = None;
                slot.state = ThumbnailState::Evicted;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MnemosyError;
    use std::cell::Cell;
    use std::rc::Rc;
    use tempfile::TempDir;

    /// Renders swatches and counts how often it was asked to.
    struct CountingRenderer {
        calls: Rc<Cell<usize>>,
    }

    impl ThumbnailRenderer for CountingRenderer {
        fn render(&self, dir: &Path, entry_type: LibEntryType, output: &Path) -> Result<()> {
            self.calls.set(self.calls.get() + 1);
            PlaceholderRenderer::new(4).render(dir, entry_type, output)
        }
    }

    struct FailingRenderer;

    impl ThumbnailRenderer for FailingRenderer {
        fn render(&self, _: &Path, _: LibEntryType, _: &Path) -> Result<()> {
            Err(MnemosyError::Image {
                message: "no GPU".to_string(),
            })
        }
    }

    fn packages(count: usize) -> (TempDir, Vec<PathBuf>) {
        let temp_dir = TempDir::new().unwrap();
        let dirs = (0..count)
            .map(|i| {
                let dir = temp_dir.path().join(format!("m{}", i));
                package::scaffold_package(&dir, "m", LibEntryType::PbrMaterial).unwrap();
                dir
            })
            .collect();
        (temp_dir, dirs)
    }

    fn counting(capacity: usize) -> (ThumbnailManager, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let manager = ThumbnailManager::new(
            Box::new(CountingRenderer {
                calls: calls.clone(),
            }),
            capacity,
        );
        (manager, calls)
    }

    #[test]
    fn test_request_then_process_with_budget() {
        let (_temp_dir, dirs) = packages(3);
        let (mut manager, calls) = counting(10);
        for (i, dir) in dirs.iter().enumerate() {
            manager.request(EntryId(i as u64), dir, LibEntryType::PbrMaterial);
        }
        manager.request(EntryId(0), &dirs[0], LibEntryType::PbrMaterial);
        assert_eq!(manager.pending_count(), 3);

        assert_eq!(manager.process_pending(2), 2);
        assert_eq!(manager.state(EntryId(0)), ThumbnailState::Ready);
        assert_eq!(manager.state(EntryId(2)), ThumbnailState::Pending);

        assert_eq!(manager.process_pending(2), 1);
        assert_eq!(calls.get(), 3);
        assert_eq!(manager.get(EntryId(1)).unwrap().width, 4);
    }

    #[test]
    fn test_existing_file_is_not_rerendered() {
        let (_temp_dir, dirs) = packages(1);
        let (mut manager, calls) = counting(10);
        manager.render(EntryId(1), &dirs[0], LibEntryType::PbrMaterial).unwrap();
        manager.process_pending(1);

        assert_eq!(calls.get(), 1);
        assert_eq!(manager.state(EntryId(1)), ThumbnailState::Ready);
    }

    #[test]
    fn test_capacity_unloads_oldest() {
        let (_temp_dir, dirs) = packages(3);
        let (mut manager, _) = counting(2);
        for (i, dir) in dirs.iter().enumerate() {
            manager.request(EntryId(i as u64), dir, LibEntryType::PbrMaterial);
        }
        manager.process_pending(3);

        assert_eq!(manager.loaded_count(), 2);
        assert_eq!(manager.state(EntryId(0)), ThumbnailState::Evicted);
        assert!(manager.get(EntryId(2)).is_some());
    }

    #[test]
    fn test_evicted_is_not_requeued_by_request() {
        let (_temp_dir, dirs) = packages(3);
        let (mut manager, _) = counting(2);
        for (i, dir) in dirs.iter().enumerate() {
            manager.request(EntryId(i as u64), dir, LibEntryType::PbrMaterial);
        }
        manager.process_pending(3);

        for (i, dir) in dirs.iter().enumerate() {
            manager.request(EntryId(i as u64), dir, LibEntryType::PbrMaterial);
        }
        assert_eq!(manager.pending_count(), 0);
        assert_eq!(manager.process_pending(8), 0);

        assert!(manager.reload(EntryId(0)));
        assert!(!manager.reload(EntryId(1)));
        assert_eq!(manager.process_pending(8), 1);
        assert_eq!(manager.state(EntryId(0)), ThumbnailState::Ready);
        assert_eq!(manager.state(EntryId(1)), ThumbnailState::Evicted);
    }

    #[test]
    fn test_invalidate_drops_pending_and_loaded() {
        let (_temp_dir, dirs) = packages(2);
        let (mut manager, _) = counting(10);
        manager.request(EntryId(0), &dirs[0], LibEntryType::PbrMaterial);
        manager.request(EntryId(1), &dirs[1], LibEntryType::PbrMaterial);
        manager.process_pending(1);

        manager.invalidate(EntryId(0));
        manager.invalidate(EntryId(1));

        assert_eq!(manager.pending_count(), 0);
        assert_eq!(manager.loaded_count(), 0);
        assert!(manager.get(EntryId(0)).is_none());
    }

    #[test]
    fn test_moved_package_is_requeued() {
        let (_temp_dir, dirs) = packages(2);
        let (mut manager, _) = counting(10);
        manager.request(EntryId(0), &dirs[0], LibEntryType::PbrMaterial);
        manager.process_pending(1);

        manager.request(EntryId(0), &dirs[1], LibEntryType::PbrMaterial);

        assert_eq!(manager.state(EntryId(0)), ThumbnailState::Pending);
        assert_eq!(manager.loaded_count(), 0);
    }

    #[test]
    fn test_failed_render_marks_failed() {
        let (_temp_dir, dirs) = packages(1);
        let mut manager = ThumbnailManager::new(Box::new(FailingRenderer), 4);
        manager.request(EntryId(0), &dirs[0], LibEntryType::PbrMaterial);
        manager.process_pending(4);

        assert_eq!(manager.state(EntryId(0)), ThumbnailState::Failed);

        manager.invalidate_all();
        assert_eq!(manager.state(EntryId(0)), ThumbnailState::NotGenerated);
    }
}
