use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber. Respects `RUST_LOG`, defaults
/// to `info`.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
