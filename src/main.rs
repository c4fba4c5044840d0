use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use ziprestore::pipeline::events::{ChannelSink, ProgressEvent};
use ziprestore::{cli, config, logging, pipeline, util};

fn main() -> Result<()> {
    logging::init_logging();

    let cli_opts = cli::parse();
    let loaded = config::load_config(cli_opts.config_path.as_deref())?;
    let mut cfg = loaded.config;
    if let Some(max_segment) = cli_opts.max_segment_len {
        cfg.max_segment_length = max_segment;
    }
    if let Some(max_path) = cli_opts.max_path_len {
        cfg.max_total_path_length = max_path;
    }
    debug!("config hash={}", loaded.config_hash);

    util::ensure_output_dir(&cli_opts.output)?;
    let output_root = std::path::absolute(&cli_opts.output)
        .with_context(|| format!("resolving output path {}", cli_opts.output.display()))?;

    info!(
        "starting run_id={} archives={} output={} max_segment={} max_path={}",
        cfg.run_id,
        cli_opts.input.len(),
        output_root.display(),
        cfg.max_segment_length,
        cfg.max_total_path_length
    );

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || {
            warn!("interrupt received, finishing current entry");
            cancel.store(true, Ordering::Relaxed);
        })
        .context("installing interrupt handler")?;
    }

    let (progress_tx, progress_rx) = crossbeam_channel::unbounded();
    let progress_handle = thread::spawn(move || {
        for event in progress_rx {
            match event {
                ProgressEvent::PhaseStarted { phase } => info!("{}", phase.label()),
                ProgressEvent::Extraction {
                    total,
                    processed,
                    errored,
                    percent,
                } => {
                    debug!(
                        "extracting: {processed} of {total} done, {errored} errors ({percent:.1}%)"
                    );
                }
                ProgressEvent::Recovery { total, fixed, failed } => {
                    info!("processing errors: {}/{total}, fixed: {fixed}, failed: {failed}", fixed + failed);
                }
                ProgressEvent::Completed => info!("processing complete"),
            }
        }
    });

    let sink = ChannelSink::new(progress_tx);
    let summary = pipeline::run_extraction(
        &cli_opts.input,
        &output_root,
        cfg.limits(),
        &sink,
        &cancel,
    )?;
    drop(sink);
    if progress_handle.join().is_err() {
        warn!("progress consumer thread panicked");
    }

    info!(
        "total files: {}, extracted: {}, errors: {}",
        summary.total_files, summary.files_processed, summary.files_errors
    );
    if summary.total_errors > 0 {
        info!(
            "second pass: {} errors, {} fixed, {} failed",
            summary.total_errors, summary.errors_fixed, summary.errors_failed
        );
    }
    Ok(())
}
