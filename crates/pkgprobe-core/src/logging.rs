use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "PKGPROBE_LOG";

/// Installs the global fmt subscriber. Returns false if one was already installed.
pub fn init_tracing(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}
