use tracing_subscriber::EnvFilter;

/// Installs a `tracing_subscriber::fmt` subscriber driven by `RUST_LOG` (falling back to `info`),
/// and routes panics through `tracing` via `log_panics`. Call once, at process start.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    log_panics::init();
}
