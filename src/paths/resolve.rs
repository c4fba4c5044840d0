//! # Collision Resolver
//!
//! Assigns a unique destination path when a sanitized candidate is already
//! claimed in this run or already present on disk. Renamed files get a
//! deterministic `_<hash>` suffix derived from the stem and a collision
//! counter, so the same input sequence always produces the same names.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::{short_hash, split_extension, truncate_chars, PathError, PathLimits, SUFFIX_HASH_LEN};

/// Collision attempts per entry before giving up on it.
pub const MAX_COLLISION_ATTEMPTS: u64 = 10_000;

/// Destination paths already assigned within the current run.
///
/// Run-scoped and threaded through both passes explicitly; grows
/// monotonically and is discarded at run end.
#[derive(Debug, Default)]
pub struct ClaimedPaths(HashSet<PathBuf>);

impl ClaimedPaths {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.0.contains(path)
    }

    pub fn insert(&mut self, path: PathBuf) -> bool {
        self.0.insert(path)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Resolve `candidate` to a destination not yet claimed in this run and not
/// present on disk, registering the accepted path before returning.
pub fn resolve_collision(
    candidate: PathBuf,
    claimed: &mut ClaimedPaths,
    limits: &PathLimits,
    exists_on_disk: impl Fn(&Path) -> bool,
) -> Result<PathBuf, PathError> {
    let mut dest = candidate.clone();
    let mut attempt: u64 = 0;

    while claimed.contains(&dest) || exists_on_disk(&dest) {
        attempt += 1;
        if attempt > MAX_COLLISION_ATTEMPTS {
            return Err(PathError::CollisionExhausted(
                candidate.to_string_lossy().into_owned(),
            ));
        }

        let name = dest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (stem, ext) = split_extension(&name);
        let suffix = short_hash(&format!("{stem}_{attempt}"), SUFFIX_HASH_LEN);

        // Leave room for `_<suffix>` and the extension within the segment limit.
        let reserved = ext.chars().count() + SUFFIX_HASH_LEN + 1;
        let max_stem = limits.max_segment_length.saturating_sub(reserved).max(1);
        let stem = truncate_chars(stem, max_stem);

        dest = dest.with_file_name(format!("{stem}_{suffix}{ext}"));
    }

    claimed.insert(dest.clone());
    Ok(dest)
}
