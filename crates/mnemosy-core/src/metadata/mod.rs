//! Metadata persistence.
//!
//! Library data files, per-entry package metadata and thumbnails all go
//! through the atomic write helpers here.

mod atomic;

pub use atomic::{atomic_read_json, atomic_write_json, backup_path};
