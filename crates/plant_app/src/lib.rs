pub mod app;
pub mod cli;
pub mod notifier;

use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber. Falls back to `info` when the
/// configured filter does not parse.
pub fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
