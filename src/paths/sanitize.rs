//! # Path Sanitizer
//!
//! Turns a raw archive entry path into a filesystem-safe relative path whose
//! segments and total length respect the configured limits.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use super::shorten::shorten;
use super::{
    join_segments, path_char_len, short_hash, split_extension, truncate_chars, PathError,
    PathLimits, SUFFIX_HASH_LEN,
};

const INVALID_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

static DRIVE_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z]:").expect("valid regex"));

/// Normalize a raw entry path: strip a drive-letter prefix and leading
/// slashes, convert backslashes to forward slashes.
pub fn normalize_entry_path(raw: &str) -> String {
    let stripped = DRIVE_PREFIX.replace(raw, "");
    let stripped = stripped.trim_start_matches(['/', '\\']);
    stripped.replace('\\', "/")
}

/// Sanitize a raw entry path into a relative destination path under
/// `output_root`.
///
/// Fails with [`PathError::TooLong`] when the absolute path exceeds the
/// total limit and shortening cannot bring it under the bound.
pub fn sanitize(
    raw_path: &str,
    output_root: &Path,
    limits: &PathLimits,
) -> Result<PathBuf, PathError> {
    let normalized = normalize_entry_path(raw_path);
    let mut segments = sanitize_segments(&normalized, limits);
    if segments.is_empty() {
        // Entries like "/" or "C:\" reduce to nothing; hash the raw name
        // so the entry still lands somewhere deterministic.
        segments.push(short_hash(raw_path, SUFFIX_HASH_LEN));
    }

    let full = join_segments(output_root, &segments);
    if path_char_len(&full) > limits.max_total_path_length {
        shorten(&mut segments, output_root, limits.max_total_path_length)
            .map_err(|_| PathError::TooLong(normalized))?;
    }

    Ok(segments.iter().collect())
}

fn sanitize_segments(normalized: &str, limits: &PathLimits) -> Vec<String> {
    let parts: Vec<&str> = normalized
        .split('/')
        .map(str::trim)
        .filter(|part| !part.is_empty() && *part != "." && *part != "..")
        .collect();

    let mut segments = Vec::with_capacity(parts.len());
    for (idx, part) in parts.iter().enumerate() {
        let cleaned = replace_invalid_chars(part);
        if idx == parts.len() - 1 {
            segments.push(sanitize_filename(&cleaned, limits));
        } else {
            segments.push(truncate_chars(&cleaned, limits.max_segment_length).to_string());
        }
    }
    segments
}

fn replace_invalid_chars(segment: &str) -> String {
    segment
        .chars()
        .map(|ch| if INVALID_CHARS.contains(&ch) { '_' } else { ch })
        .collect()
}

/// Bound a filename to the segment limit, preserving its extension. When the
/// extension alone leaves no room for a stem, the stem becomes a short hash
/// of its original value.
fn sanitize_filename(name: &str, limits: &PathLimits) -> String {
    let (stem, ext) = split_extension(name);
    let ext_len = ext.chars().count();
    if limits.max_segment_length < ext_len + 1 {
        format!("{}{ext}", short_hash(stem, SUFFIX_HASH_LEN))
    } else {
        let max_stem = limits.max_segment_length - ext_len;
        format!("{}{ext}", truncate_chars(stem, max_stem))
    }
}
