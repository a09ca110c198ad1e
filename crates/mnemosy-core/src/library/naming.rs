//! Display-name sanitising and unique-name generation.
//!
//! Folder and entry names double as directory names on disk, so every name
//! that reaches the tree has passed through [`sanitize_name`]. Sibling
//! collisions are resolved with [`unique_name`], which appends ` (n)`.

use crate::config::LibraryConfig;
use regex::Regex;
use std::sync::LazyLock;

/// Characters reserved on NTFS or used as path separators.
const RESERVED_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Reserved device names on Windows.
const NTFS_RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Matches `"Name (12)"`, capturing the base and the counter.
static NUMBERED_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*\S) \((\d+)\)$").unwrap());

/// Make a user-supplied name safe to use as a directory name.
///
/// Reserved and control characters are dropped, whitespace runs collapse to
/// one space, trailing dots and spaces are trimmed and Windows device names
/// get an underscore appended. An empty result falls back to `fallback`.
///
/// # Examples
///
/// ```
/// use mnemosy_core::library::sanitize_name;
///
/// assert_eq!(sanitize_name("  Red   Brick ", "x"), "Red Brick");
/// assert_eq!(sanitize_name("Metal/Rust:01", "x"), "MetalRust01");
/// assert_eq!(sanitize_name("...", "New Folder"), "New Folder");
/// ```
pub fn sanitize_name(name: &str, fallback: &str) -> String {
    let stripped: String = name
        .chars()
        .filter(|c| !RESERVED_CHARS.contains(c) && !c.is_control())
        .collect();

    let mut result = WHITESPACE_RUN.replace_all(&stripped, " ").to_string();
    result = result.trim().trim_end_matches(['.', ' ']).to_string();

    if result.chars().count() > LibraryConfig::MAX_NAME_LENGTH {
        result = result
            .chars()
            .take(LibraryConfig::MAX_NAME_LENGTH)
            .collect::<String>()
            .trim_end_matches(['.', ' '])
            .to_string();
    }

    if NTFS_RESERVED_NAMES.contains(&result.to_uppercase().as_str()) {
        result.push('_');
    }

    if result.is_empty() {
        return fallback.to_string();
    }

    result
}

/// Case-insensitive name comparison used for sibling collisions.
pub fn names_equal(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// Split `"Name (3)"` into `("Name", Some(3))`.
pub fn split_numbered_suffix(name: &str) -> (&str, Option<u32>) {
    match NUMBERED_SUFFIX.captures(name) {
        Some(caps) => {
            let base = caps.get(1).map_or(name, |m| m.as_str());
            let number = caps.get(2).and_then(|m| m.as_str().parse().ok());
            (base, number)
        }
        None => (name, None),
    }
}

/// Return `proposed` if it is free, otherwise the first free `"base (n)"`.
///
/// `taken` reports whether a candidate is already in use. An existing
/// numbered suffix on `proposed` is stripped first, so proposing
/// `"Material (1)"` when it is taken yields `"Material (2)"` rather than
/// `"Material (1) (1)"`.
pub fn unique_name(proposed: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(proposed) {
        return proposed.to_string();
    }

    let (base, _) = split_numbered_suffix(proposed);
    let mut counter: u32 = 1;
    loop {
        let candidate = format!("{} ({})", base, counter);
        if !taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}
