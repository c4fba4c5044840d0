//! # Report Writer
//!
//! Audit-trail outputs for a run: the per-entry status log, the first-pass
//! error log, the recovery-pass fixed/final error reports, and the
//! plain-text summary. All CSV files are UTF-8 with a header row.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const FILE_STATUS_CSV: &str = "file_status.csv";
pub const ERROR_LOG_CSV: &str = "error_log.csv";
pub const FIXED_ERRORS_CSV: &str = "fixed_errors.csv";
pub const FINAL_ERRORS_CSV: &str = "final_errors.csv";
pub const SUMMARY_TXT: &str = "processing_summary.txt";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// One attempt at placing an entry, first pass or retry. Never mutated
/// after being written; a retried entry produces a second record.
#[derive(Debug, Clone)]
pub struct FileStatusRecord {
    pub original_file_path: String,
    pub original_file_name: String,
    pub sanitized_file_name: String,
    pub original_destination_path: String,
    pub sanitized_destination_path: String,
    pub moved: bool,
    pub reason: String,
}

/// A first-pass failure. An empty `file` means the archive itself could
/// not be read (not retryable).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorRecord {
    pub zip_file: String,
    pub file: String,
    pub error_message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FixedErrorRecord {
    pub zip_file: String,
    pub original_file: String,
    pub sanitized_file: String,
    pub status: String,
}

/// Aggregate counters written once at run end.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub total_files: u64,
    pub files_processed: u64,
    pub files_errors: u64,
    pub total_errors: u64,
    pub errors_fixed: u64,
    pub errors_failed: u64,
}

#[derive(Serialize)]
struct FileStatusCsv<'a> {
    original_file_path: &'a str,
    original_file_name: &'a str,
    sanitized_file_name: &'a str,
    original_destination_path: &'a str,
    sanitized_destination_path: &'a str,
    moved: &'static str,
    reason: &'a str,
}

pub struct ReportWriter {
    output_root: PathBuf,
    status_writer: Mutex<csv::Writer<File>>,
}

impl ReportWriter {
    /// Create the writer and start `file_status.csv` with its header row.
    pub fn create(output_root: &Path) -> Result<Self, ReportError> {
        let status_file = File::create(output_root.join(FILE_STATUS_CSV))?;
        let mut status_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(status_file);

        status_writer.write_record([
            "Original File Path",
            "Original File Name",
            "Sanitized File Name",
            "Original Destination Path",
            "Sanitized Destination Path",
            "Moved",
            "Reason",
        ])?;

        Ok(Self {
            output_root: output_root.to_path_buf(),
            status_writer: Mutex::new(status_writer),
        })
    }

    pub fn record_status(&self, record: &FileStatusRecord) -> Result<(), ReportError> {
        let row = FileStatusCsv {
            original_file_path: &record.original_file_path,
            original_file_name: &record.original_file_name,
            sanitized_file_name: &record.sanitized_file_name,
            original_destination_path: &record.original_destination_path,
            sanitized_destination_path: &record.sanitized_destination_path,
            moved: if record.moved { "True" } else { "False" },
            reason: &record.reason,
        };
        let mut guard = self.status_writer.lock().unwrap();
        guard.serialize(row)?;
        Ok(())
    }

    /// Written once after the first pass, only when failures occurred.
    pub fn write_error_log(&self, errors: &[ErrorRecord]) -> Result<(), ReportError> {
        let mut writer = csv::Writer::from_path(self.output_root.join(ERROR_LOG_CSV))?;
        for error in errors {
            writer.serialize(error)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn write_fixed_errors(&self, fixed: &[FixedErrorRecord]) -> Result<(), ReportError> {
        let mut writer = csv::Writer::from_path(self.output_root.join(FIXED_ERRORS_CSV))?;
        for record in fixed {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn write_final_errors(&self, errors: &[ErrorRecord]) -> Result<(), ReportError> {
        let mut writer = csv::Writer::from_path(self.output_root.join(FINAL_ERRORS_CSV))?;
        for error in errors {
            writer.serialize(error)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn write_summary(&self, summary: &RunSummary) -> Result<(), ReportError> {
        let mut file = File::create(self.output_root.join(SUMMARY_TXT))?;
        writeln!(file, "Total files processed: {}", summary.total_files)?;
        writeln!(file, "Files successfully extracted: {}", summary.files_processed)?;
        writeln!(file, "Files with errors: {}", summary.files_errors)?;
        if summary.total_errors > 0 {
            writeln!(file)?;
            writeln!(file, "Error Processing Summary:")?;
            writeln!(file, "Total errors: {}", summary.total_errors)?;
            writeln!(file, "Errors fixed: {}", summary.errors_fixed)?;
            writeln!(file, "Errors failed: {}", summary.errors_failed)?;
        }
        Ok(())
    }

    pub fn flush(&self) -> Result<(), ReportError> {
        let mut guard = self.status_writer.lock().unwrap();
        guard.flush()?;
        Ok(())
    }
}

pub fn error_log_path(output_root: &Path) -> PathBuf {
    output_root.join(ERROR_LOG_CSV)
}

/// Read back the first-pass error log for the recovery pass.
pub fn read_error_log(path: &Path) -> Result<Vec<ErrorRecord>, ReportError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut errors = Vec::new();
    for record in reader.deserialize() {
        errors.push(record?);
    }
    Ok(errors)
}
