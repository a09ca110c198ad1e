//! Atomic file operations for crash-consistent metadata persistence.
//!
//! Writes go through:
//! 1. Serialize and re-parse to validate
//! 2. Write to a sibling temp file with a unique PID+TID suffix
//! 3. `sync_all` so data reaches disk
//! 4. Optional `.bak` copy of the previous file
//! 5. Atomic rename onto the target path
//!
//! A crash at any point leaves either the old file or the new one, never a
//! truncated mix.

use crate::{MnemosyError, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::thread;
use tracing::{debug, warn};

/// Read and parse a JSON metadata file.
///
/// Returns `None` if the file doesn't exist, or an error if parsing fails.
pub fn atomic_read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }

    let mut file = File::open(path)
        .map_err(|e| MnemosyError::io_context(format!("Failed to open {}", path.display()), path, e))?;

    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| MnemosyError::io_context(format!("Failed to read {}", path.display()), path, e))?;

    let data: T = serde_json::from_str(&contents).map_err(|e| MnemosyError::Json {
        message: format!("Failed to parse {}: {}", path.display(), e),
        source: Some(e),
    })?;

    Ok(Some(data))
}

/// Write data to a JSON metadata file atomically.
pub fn atomic_write_json<T: Serialize>(path: &Path, data: &T, keep_backup: bool) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| {
                MnemosyError::io_context(
                    format!("Failed to create directory {}", parent.display()),
                    parent,
                    e,
                )
            })?;
        }
    }

    let temp_path = sibling_with_suffix(path, &format!("{}.{}.tmp", process::id(), thread_id()));

    let serialized = serde_json::to_string_pretty(data).map_err(|e| MnemosyError::Json {
        message: format!("Failed to serialize data: {}", e),
        source: Some(e),
    })?;

    serde_json::from_str::<serde_json::Value>(&serialized).map_err(|e| MnemosyError::Json {
        message: format!("JSON validation failed: {}", e),
        source: Some(e),
    })?;

    if let Err(e) = write_synced(&temp_path, serialized.as_bytes()) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    if keep_backup && path.exists() {
        let backup_path = backup_path(path);
        if let Err(e) = fs::copy(path, &backup_path) {
            // Backup failure is not fatal
            warn!("Failed to create backup {}: {}", backup_path.display(), e);
        } else {
            debug!("Created backup: {}", backup_path.display());
        }
    }

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(MnemosyError::io_context(
            format!("Failed to rename {} to {}", temp_path.display(), path.display()),
            path,
            e,
        ));
    }

    debug!("Atomically wrote {}", path.display());
    Ok(())
}

/// Path of the `.bak` copy kept next to `path`.
pub fn backup_path(path: &Path) -> PathBuf {
    sibling_with_suffix(path, "bak")
}

fn write_synced(temp_path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(temp_path)
        .map_err(|e| {
            MnemosyError::io_context(
                format!("Failed to create temp file {}", temp_path.display()),
                temp_path,
                e,
            )
        })?;

    file.write_all(bytes).map_err(|e| {
        MnemosyError::io_context(
            format!("Failed to write temp file {}", temp_path.display()),
            temp_path,
            e,
        )
    })?;

    file.sync_all().map_err(|e| {
        MnemosyError::io_context(
            format!("Failed to sync temp file {}", temp_path.display()),
            temp_path,
            e,
        )
    })
}

/// `dir/name.ext` -> `dir/name.ext.<suffix>`
fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

fn thread_id() -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let mut hasher = DefaultHasher::new();
    format!("{:?}", thread::current().id()).hash(&mut hasher);
    hasher.finish()
}
