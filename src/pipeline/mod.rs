//! # Extraction Pipeline
//!
//! Drives the first pass over all archives: enumerate entries, place each
//! one through sanitize → resolve → shorten, copy its bytes, and record a
//! status row. Failures never abort the run; they are logged for the
//! recovery pass. Run state (claimed paths, counters) is threaded through
//! explicitly so parallel runs cannot leak into each other.

pub mod events;
pub mod recovery;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::archive::{open_archive, ArchiveError, ArchiveSource};
use crate::paths::resolve::{resolve_collision, ClaimedPaths};
use crate::paths::sanitize::{normalize_entry_path, sanitize};
use crate::paths::shorten::shorten;
use crate::paths::{path_char_len, PathError, PathLimits};
use crate::report::{self, ErrorRecord, FileStatusRecord, ReportWriter, RunSummary};

use events::{Phase, ProgressEvent, ProgressSink};

/// State carried across both passes of one run.
#[derive(Debug, Default)]
pub struct RunState {
    pub claimed: ClaimedPaths,
    pub summary: RunSummary,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Error)]
pub(crate) enum EntryError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Archive factory shared by both passes; tests swap in flaky sources.
pub(crate) type ArchiveOpener<'a> =
    &'a dyn Fn(&Path) -> Result<Box<dyn ArchiveSource>, ArchiveError>;

/// Run both passes end to end and write all reports.
///
/// The only fatal error before processing starts is being unable to write
/// into `output_root`; everything per-entry is recorded and skipped.
pub fn run_extraction(
    archives: &[PathBuf],
    output_root: &Path,
    limits: PathLimits,
    progress: &dyn ProgressSink,
    cancel: &AtomicBool,
) -> Result<RunSummary> {
    run_extraction_with(archives, &open_archive, output_root, limits, progress, cancel)
}

pub(crate) fn run_extraction_with(
    archives: &[PathBuf],
    opener: ArchiveOpener,
    output_root: &Path,
    limits: PathLimits,
    progress: &dyn ProgressSink,
    cancel: &AtomicBool,
) -> Result<RunSummary> {
    let reports = ReportWriter::create(output_root)
        .with_context(|| format!("creating status log in {}", output_root.display()))?;
    let mut state = RunState::new();

    let errors = run_first_pass(
        archives,
        opener,
        output_root,
        &limits,
        &reports,
        progress,
        cancel,
        &mut state,
    )?;

    if !errors.is_empty() && !cancel.load(Ordering::Relaxed) {
        let error_log = report::error_log_path(output_root);
        recovery::run_recovery_pass(
            &error_log,
            opener,
            output_root,
            &limits,
            &reports,
            progress,
            cancel,
            &mut state,
        )?;
    }

    reports.write_summary(&state.summary)?;
    reports.flush()?;
    progress.emit(ProgressEvent::Completed);

    info!(
        "run finished: total={} processed={} errors={}",
        state.summary.total_files, state.summary.files_processed, state.summary.files_errors
    );
    Ok(state.summary)
}

/// First pass: extract every entry of every archive in sequence.
///
/// Returns the error records collected along the way; the error log file
/// is written before returning when any exist.
pub(crate) fn run_first_pass(
    archives: &[PathBuf],
    opener: ArchiveOpener,
    output_root: &Path,
    limits: &PathLimits,
    reports: &ReportWriter,
    progress: &dyn ProgressSink,
    cancel: &AtomicBool,
    state: &mut RunState,
) -> Result<Vec<ErrorRecord>> {
    progress.emit(ProgressEvent::PhaseStarted {
        phase: Phase::Extracting,
    });

    let total = count_total_entries(archives, opener);
    state.summary.total_files = total;
    info!("first pass: {} entries across {} archives", total, archives.len());

    let mut errors: Vec<ErrorRecord> = Vec::new();
    let mut seen: u64 = 0;

    'archives: for archive_path in archives {
        let zip_name = archive_path.to_string_lossy().into_owned();
        let mut archive = match opener(archive_path) {
            Ok(archive) => archive,
            Err(err) => {
                warn!("cannot open archive {}: {err}", archive_path.display());
                state.summary.files_errors += 1;
                errors.push(ErrorRecord {
                    zip_file: zip_name,
                    file: String::new(),
                    error_message: format!("Error processing ZIP file: {err}"),
                });
                continue;
            }
        };
        let names = match archive.entry_names() {
            Ok(names) => names,
            Err(err) => {
                warn!("cannot enumerate {}: {err}", archive_path.display());
                state.summary.files_errors += 1;
                errors.push(ErrorRecord {
                    zip_file: zip_name,
                    file: String::new(),
                    error_message: format!("Error processing ZIP file: {err}"),
                });
                continue;
            }
        };

        for name in names {
            if cancel.load(Ordering::Relaxed) {
                warn!("cancellation requested, stopping extraction");
                break 'archives;
            }
            seen += 1;

            let record = process_entry(
                archive.as_mut(),
                &name,
                output_root,
                limits,
                &mut state.claimed,
            );
            if record.moved {
                state.summary.files_processed += 1;
            } else {
                state.summary.files_errors += 1;
                errors.push(ErrorRecord {
                    zip_file: zip_name.clone(),
                    file: name.clone(),
                    error_message: record.reason.clone(),
                });
            }
            reports.record_status(&record)?;

            let percent = if total > 0 {
                seen as f64 / total as f64 * 100.0
            } else {
                100.0
            };
            progress.emit(ProgressEvent::Extraction {
                total,
                processed: state.summary.files_processed,
                errored: state.summary.files_errors,
                percent,
            });
        }
    }

    reports.flush()?;
    if !errors.is_empty() {
        reports.write_error_log(&errors)?;
    }
    Ok(errors)
}

/// Count file entries across all archives, for progress reporting only.
/// Unreadable archives count zero here; the failure is recorded when the
/// archive is actually processed.
fn count_total_entries(archives: &[PathBuf], opener: ArchiveOpener) -> u64 {
    let mut total = 0u64;
    for path in archives {
        match opener(path).and_then(|mut a| a.entry_names()) {
            Ok(names) => total += names.len() as u64,
            Err(err) => debug!("skipping {} in entry count: {err}", path.display()),
        }
    }
    total
}

/// Where an entry ends up after sanitize → resolve → shorten.
pub(crate) struct EntryPlacement {
    pub original_dest: PathBuf,
    pub final_dest: PathBuf,
}

/// Compute a unique, length-bounded destination for one raw entry path and
/// claim it in the run state.
pub(crate) fn place_entry(
    raw_path: &str,
    output_root: &Path,
    limits: &PathLimits,
    claimed: &mut ClaimedPaths,
) -> Result<EntryPlacement, PathError> {
    let rel = sanitize(raw_path, output_root, limits)?;
    let original_dest = output_root.join(normalize_entry_path(raw_path));

    let candidate = output_root.join(&rel);
    let mut dest = resolve_collision(candidate, claimed, limits, |p| p.exists())?;

    // A collision suffix can push the path back over the limit.
    if path_char_len(&dest) > limits.max_total_path_length {
        let mut segments: Vec<String> = dest
            .strip_prefix(output_root)
            .unwrap_or(&dest)
            .iter()
            .map(|c| c.to_string_lossy().into_owned())
            .collect();
        shorten(&mut segments, output_root, limits.max_total_path_length)?;
        let shortened: PathBuf = output_root.join(segments.iter().collect::<PathBuf>());
        dest = resolve_collision(shortened, claimed, limits, |p| p.exists())?;
    }

    Ok(EntryPlacement {
        original_dest,
        final_dest: dest,
    })
}

/// Shared per-entry pipeline used by both passes: place, ensure the parent
/// directory, copy the bytes. Always yields a status record; failures are
/// carried in `moved` and `reason`.
pub(crate) fn process_entry(
    archive: &mut dyn ArchiveSource,
    entry_name: &str,
    output_root: &Path,
    limits: &PathLimits,
    claimed: &mut ClaimedPaths,
) -> FileStatusRecord {
    let mut record = FileStatusRecord {
        original_file_path: entry_name.to_string(),
        original_file_name: entry_basename(entry_name).to_string(),
        sanitized_file_name: String::new(),
        original_destination_path: String::new(),
        sanitized_destination_path: String::new(),
        moved: false,
        reason: String::new(),
    };

    match attempt_entry(archive, entry_name, output_root, limits, claimed, &mut record) {
        Ok(()) => record.moved = true,
        Err(err) => {
            debug!("entry {entry_name} failed: {err}");
            record.reason = err.to_string();
        }
    }
    record
}

fn attempt_entry(
    archive: &mut dyn ArchiveSource,
    entry_name: &str,
    output_root: &Path,
    limits: &PathLimits,
    claimed: &mut ClaimedPaths,
    record: &mut FileStatusRecord,
) -> Result<(), EntryError> {
    let placement = place_entry(entry_name, output_root, limits, claimed)?;

    record.sanitized_file_name = placement
        .final_dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    record.original_destination_path = placement.original_dest.to_string_lossy().into_owned();
    record.sanitized_destination_path = placement.final_dest.to_string_lossy().into_owned();

    if let Some(parent) = placement.final_dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut dest = File::create(&placement.final_dest)?;
    if let Err(err) = archive.copy_entry(entry_name, &mut dest) {
        // A failed copy leaves no partial file behind. The claim on the
        // destination stays; the retry resolves against it.
        drop(dest);
        let _ = std::fs::remove_file(&placement.final_dest);
        return Err(err.into());
    }
    Ok(())
}

pub(crate) fn entry_basename(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}
