use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber, writing to stderr.
///
/// `RUST_LOG` wins over `directives` when set. Returns `false` when a global
/// subscriber was already installed, in which case the existing one is kept.
pub fn init(directives: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directives))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}
