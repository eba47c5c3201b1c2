//! `tracing` subscriber bootstrap for the binary.

use tracing_subscriber::EnvFilter;

/// Install a stderr `fmt` subscriber filtered by `filter`. An invalid
/// directive falls back to `warn`. Returns `false` if a global subscriber
/// was already installed.
pub fn init_logging(filter: &str) -> bool {
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|e| {
        eprintln!("invalid log filter {filter:?}: {e}; using warn");
        EnvFilter::new("warn")
    });
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}
