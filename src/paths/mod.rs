//! # Path Handling
//!
//! Sanitization, collision resolution, and length-bounded shortening of
//! archive entry paths. All functions here are pure computations over
//! strings; nothing in this module touches the filesystem.

pub mod resolve;
pub mod sanitize;
pub mod shorten;

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Hex length of collision suffixes and hashed filename stems.
pub const SUFFIX_HASH_LEN: usize = 8;
/// Hex length used when hashing whole segments during shortening.
pub const SEGMENT_HASH_LEN: usize = 6;

#[derive(Debug, Error)]
pub enum PathError {
    #[error("path too long even after shortening: {0}")]
    TooLong(String),
    #[error("cannot shorten path below {limit} characters: {path}")]
    CannotShorten { path: String, limit: usize },
    #[error("collision suffixes exhausted for {0}")]
    CollisionExhausted(String),
}

/// Length limits applied to every destination path in a run.
#[derive(Debug, Clone, Copy)]
pub struct PathLimits {
    /// Maximum length of a single path segment.
    pub max_segment_length: usize,
    /// Maximum length of the whole absolute destination path.
    pub max_total_path_length: usize,
}

impl Default for PathLimits {
    fn default() -> Self {
        Self {
            max_segment_length: 50,
            max_total_path_length: 260,
        }
    }
}

/// Stable short hash used for both collision suffixes and segment hashing.
pub(crate) fn short_hash(input: &str, len: usize) -> String {
    let digest = md5::compute(input.as_bytes());
    let mut hx = format!("{digest:x}");
    hx.truncate(len);
    hx
}

/// Split a filename into stem and extension at the last dot.
///
/// A dot at position zero does not start an extension, so hidden files
/// like `.gitignore` are treated as all stem.
pub(crate) fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}

/// Truncate a string to at most `max` characters, respecting char boundaries.
pub(crate) fn truncate_chars(value: &str, max: usize) -> &str {
    match value.char_indices().nth(max) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}

/// Number of characters in the platform string form of a path.
pub(crate) fn path_char_len(path: &Path) -> usize {
    path.to_string_lossy().chars().count()
}

/// Join sanitized segments under the output root.
pub(crate) fn join_segments(output_root: &Path, segments: &[String]) -> PathBuf {
    let mut path = output_root.to_path_buf();
    for segment in segments {
        path.push(segment);
    }
    path
}
