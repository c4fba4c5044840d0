//! # Utility Module
//!
//! Output-directory preflight checks.

use std::fs::OpenOptions;
use std::path::Path;

use anyhow::{anyhow, Result};
use tracing::warn;

/// Ensure the output directory exists and is writable, warning on unsafe
/// permissions. Failure here is fatal: the run does not start.
pub fn ensure_output_dir(path: &Path) -> Result<()> {
    if path.exists() {
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_dir() {
            return Err(anyhow!(
                "output path is not a directory: {}",
                path.display()
            ));
        }
    } else {
        std::fs::create_dir_all(path)?;
    }
    let metadata = std::fs::metadata(path)?;

    let probe_path = path.join(".ziprestore_write_probe");
    match OpenOptions::new().write(true).create(true).open(&probe_path) {
        Ok(_) => {
            let _ = std::fs::remove_file(&probe_path);
        }
        Err(err) => {
            return Err(anyhow!(
                "output directory is not writable: {} ({})",
                path.display(),
                err
            ));
        }
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = metadata.permissions().mode();
        if mode & 0o002 != 0 {
            warn!("output directory is world-writable: {}", path.display());
        }
    }
    #[cfg(not(unix))]
    let _ = metadata;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::ensure_output_dir;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn creates_missing_output_dir() {
        let dir = tempdir().expect("tempdir");
        let target = dir.path().join("nested").join("out");
        ensure_output_dir(&target).expect("ensure output dir");
        assert!(target.is_dir());
    }

    #[test]
    fn rejects_output_path_that_is_file() {
        let dir = tempdir().expect("tempdir");
        let file_path = dir.path().join("output.txt");
        let _ = File::create(&file_path).expect("create file");
        let err = ensure_output_dir(&file_path).expect_err("should fail");
        assert!(err.to_string().contains("not a directory"));
    }
}
