//! # Path Shortener
//!
//! Last-resort truncation and hashing of path segments when a destination
//! path exceeds the total length limit. Phase one truncates segments from
//! the innermost outward to keep shared directory names readable; phase two
//! replaces segments with short hashes from the outermost inward.

use std::path::{Path, PathBuf};

use super::{
    join_segments, path_char_len, short_hash, split_extension, truncate_chars, PathError,
    SEGMENT_HASH_LEN,
};

/// Segments longer than this are cut straight to it; shorter ones lose a
/// single character per pass, never dropping below one.
const TRUNCATED_SEGMENT_LEN: usize = 8;

/// Shorten `segments` in place until the joined absolute path fits within
/// `max_total_length` characters.
///
/// Returns the fitted absolute path, or [`PathError::CannotShorten`] when
/// even hashing every segment cannot satisfy the bound.
pub fn shorten(
    segments: &mut [String],
    output_root: &Path,
    max_total_length: usize,
) -> Result<PathBuf, PathError> {
    let full = join_segments(output_root, segments);
    if path_char_len(&full) <= max_total_length {
        return Ok(full);
    }

    // Phase one: truncate, innermost segment first.
    for idx in (0..segments.len()).rev() {
        let replacement = if idx == segments.len() - 1 {
            let (stem, ext) = split_extension(&segments[idx]);
            format!("{}{ext}", truncate_segment(stem))
        } else {
            truncate_segment(&segments[idx])
        };
        segments[idx] = replacement;

        let candidate = join_segments(output_root, segments);
        if path_char_len(&candidate) <= max_total_length {
            return Ok(candidate);
        }
    }

    // Phase two: hash whole segments, outermost first.
    for idx in 0..segments.len() {
        let hashed = short_hash(&segments[idx], SEGMENT_HASH_LEN);
        segments[idx] = hashed;

        let candidate = join_segments(output_root, segments);
        if path_char_len(&candidate) <= max_total_length {
            return Ok(candidate);
        }
    }

    let path = join_segments(output_root, segments);
    Err(PathError::CannotShorten {
        path: path.to_string_lossy().into_owned(),
        limit: max_total_length,
    })
}

fn truncate_segment(value: &str) -> String {
    let len = value.chars().count();
    if len > TRUNCATED_SEGMENT_LEN {
        truncate_chars(value, TRUNCATED_SEGMENT_LEN).to_string()
    } else {
        truncate_chars(value, len.saturating_sub(1).max(1)).to_string()
    }
}
