//! # ziprestore
//!
//! Rebuilds a directory tree from the contents of one or more ZIP
//! archives. Every entry path is sanitized and bounded to the destination
//! filesystem's limits, name collisions are resolved deterministically,
//! and a full audit trail (status log, error logs, summary) is written
//! alongside the extracted files. Failed entries are retried once in a
//! second pass driven by the first pass's error log.

pub mod archive;
pub mod cli;
pub mod config;
pub mod logging;
pub mod paths;
pub mod pipeline;
pub mod report;
pub mod util;
