//! # Error Recovery Pass
//!
//! Retries every first-pass failure exactly once, reading the error log
//! back from disk and running the same placement/copy pipeline as the
//! first pass. Archive-level records (empty entry path) are not retryable
//! and go straight to the final-errors report.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use tracing::{info, warn};

use crate::paths::PathLimits;
use crate::report::{self, ErrorRecord, FixedErrorRecord, ReportWriter};

use super::events::{Phase, ProgressEvent, ProgressSink};
use super::{process_entry, ArchiveOpener, RunState};

/// Retry each logged failure once and write the fixed/final reports.
///
/// Every input record ends up in exactly one of `fixed_errors.csv` or
/// `final_errors.csv`; nothing is silently dropped.
pub(crate) fn run_recovery_pass(
    error_log: &Path,
    opener: ArchiveOpener,
    output_root: &Path,
    limits: &PathLimits,
    reports: &ReportWriter,
    progress: &dyn ProgressSink,
    cancel: &AtomicBool,
    state: &mut RunState,
) -> Result<()> {
    progress.emit(ProgressEvent::PhaseStarted {
        phase: Phase::ProcessingErrors,
    });

    let errors = report::read_error_log(error_log)?;
    state.summary.total_errors = errors.len() as u64;
    info!("recovery pass: {} logged errors", errors.len());

    let mut fixed: Vec<FixedErrorRecord> = Vec::new();
    let mut finals: Vec<ErrorRecord> = Vec::new();

    for error in errors {
        if cancel.load(Ordering::Relaxed) {
            warn!("cancellation requested, remaining errors go to final report");
            state.summary.errors_failed += 1;
            finals.push(error);
            continue;
        }

        if error.file.is_empty() {
            state.summary.errors_failed += 1;
            finals.push(error);
            continue;
        }

        match retry_entry(&error, opener, output_root, limits, reports, state) {
            Ok(sanitized_file) => {
                state.summary.errors_fixed += 1;
                fixed.push(FixedErrorRecord {
                    zip_file: error.zip_file,
                    original_file: error.file,
                    sanitized_file,
                    status: "Fixed".to_string(),
                });
            }
            Err(message) => {
                state.summary.errors_failed += 1;
                finals.push(ErrorRecord {
                    zip_file: error.zip_file,
                    file: error.file,
                    error_message: message,
                });
            }
        }

        progress.emit(ProgressEvent::Recovery {
            total: state.summary.total_errors,
            fixed: state.summary.errors_fixed,
            failed: state.summary.errors_failed,
        });
    }

    if !fixed.is_empty() {
        reports.write_fixed_errors(&fixed)?;
    }
    if !finals.is_empty() {
        reports.write_final_errors(&finals)?;
    }
    reports.flush()?;

    info!(
        "recovery pass done: fixed={} failed={}",
        state.summary.errors_fixed, state.summary.errors_failed
    );
    Ok(())
}

/// One retry: reopen the archive and run the shared entry pipeline.
/// Returns the sanitized relative path on success, the failure reason
/// otherwise.
fn retry_entry(
    error: &ErrorRecord,
    opener: ArchiveOpener,
    output_root: &Path,
    limits: &PathLimits,
    reports: &ReportWriter,
    state: &mut RunState,
) -> std::result::Result<String, String> {
    let mut archive = match opener(Path::new(&error.zip_file)) {
        Ok(archive) => archive,
        Err(err) => return Err(format!("Error processing ZIP file: {err}")),
    };

    let record = process_entry(
        archive.as_mut(),
        &error.file,
        output_root,
        limits,
        &mut state.claimed,
    );
    if let Err(err) = reports.record_status(&record) {
        warn!("status log write failed during recovery: {err}");
    }

    if record.moved {
        let sanitized = Path::new(&record.sanitized_destination_path)
            .strip_prefix(output_root)
            .map(|rel| rel.to_string_lossy().into_owned())
            .unwrap_or_else(|_| record.sanitized_destination_path.clone());
        Ok(sanitized)
    } else {
        Err(record.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::open_archive;
    use crate::archive::tests::write_zip;
    use crate::pipeline::events::NullSink;
    use crate::report::{FILE_STATUS_CSV, FINAL_ERRORS_CSV, FIXED_ERRORS_CSV};
    use tempfile::tempdir;

    #[test]
    fn retries_logged_entries_and_reports_fixed() {
        let dir = tempdir().expect("tempdir");
        let out = dir.path().join("out");
        std::fs::create_dir_all(&out).expect("out dir");
        let zip_path = write_zip(dir.path(), "batch.zip", &[("a/b.txt", b"payload")]);
        let zip_name = zip_path.to_string_lossy().into_owned();

        // Simulate a first pass where the copy failed transiently.
        let reports = ReportWriter::create(&out).expect("reports");
        reports
            .write_error_log(&[ErrorRecord {
                zip_file: zip_name.clone(),
                file: "a/b.txt".to_string(),
                error_message: "io error: interrupted".to_string(),
            }])
            .expect("error log");

        let mut state = RunState::new();
        run_recovery_pass(
            &report::error_log_path(&out),
            &open_archive,
            &out,
            &PathLimits::default(),
            &reports,
            &NullSink,
            &AtomicBool::new(false),
            &mut state,
        )
        .expect("recovery");
        reports.flush().expect("flush");

        assert_eq!(state.summary.total_errors, 1);
        assert_eq!(state.summary.errors_fixed, 1);
        assert_eq!(state.summary.errors_failed, 0);
        assert_eq!(
            std::fs::read(out.join("a").join("b.txt")).expect("read"),
            b"payload"
        );

        let fixed = std::fs::read_to_string(out.join(FIXED_ERRORS_CSV)).expect("fixed csv");
        assert!(fixed.contains("a/b.txt"));
        assert!(fixed.contains("Fixed"));
        assert!(!out.join(FINAL_ERRORS_CSV).exists());

        // The retry appended a Moved=True row to the shared status log.
        let status = std::fs::read_to_string(out.join(FILE_STATUS_CSV)).expect("status csv");
        assert!(status.contains("True"));
    }

    #[test]
    fn archive_level_records_pass_straight_through() {
        let dir = tempdir().expect("tempdir");
        let out = dir.path().join("out");
        std::fs::create_dir_all(&out).expect("out dir");

        let reports = ReportWriter::create(&out).expect("reports");
        reports
            .write_error_log(&[ErrorRecord {
                zip_file: "broken.zip".to_string(),
                file: String::new(),
                error_message: "Error processing ZIP file: invalid".to_string(),
            }])
            .expect("error log");

        let mut state = RunState::new();
        run_recovery_pass(
            &report::error_log_path(&out),
            &open_archive,
            &out,
            &PathLimits::default(),
            &reports,
            &NullSink,
            &AtomicBool::new(false),
            &mut state,
        )
        .expect("recovery");

        assert_eq!(state.summary.errors_failed, 1);
        assert_eq!(state.summary.errors_fixed, 0);
        let finals = std::fs::read_to_string(out.join(FINAL_ERRORS_CSV)).expect("final csv");
        assert!(finals.contains("broken.zip"));
        assert!(!out.join(FIXED_ERRORS_CSV).exists());
    }

    #[test]
    fn retry_failure_lands_in_final_errors() {
        let dir = tempdir().expect("tempdir");
        let out = dir.path().join("out");
        std::fs::create_dir_all(&out).expect("out dir");
        let zip_path = write_zip(dir.path(), "batch.zip", &[("present.txt", b"x")]);

        let reports = ReportWriter::create(&out).expect("reports");
        reports
            .write_error_log(&[ErrorRecord {
                zip_file: zip_path.to_string_lossy().into_owned(),
                file: "gone.txt".to_string(),
                error_message: "io error: interrupted".to_string(),
            }])
            .expect("error log");

        let mut state = RunState::new();
        run_recovery_pass(
            &report::error_log_path(&out),
            &open_archive,
            &out,
            &PathLimits::default(),
            &reports,
            &NullSink,
            &AtomicBool::new(false),
            &mut state,
        )
        .expect("recovery");

        assert_eq!(state.summary.errors_failed, 1);
        let finals = std::fs::read_to_string(out.join(FINAL_ERRORS_CSV)).expect("final csv");
        assert!(finals.contains("gone.txt"));
    }
}
