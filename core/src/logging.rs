//! Subscriber set-up for binaries embedding the proxy.

use tracing_subscriber::EnvFilter;

use crate::config::Logging;
use crate::error::ProxyError;

/// Maps a configured level name to an `EnvFilter` directive.
pub fn level_directive(level: &str) -> &'static str {
    match level.to_ascii_uppercase().as_str() {
        "TRACE" => "trace",
        "DEBUG" => "debug",
        "INFO" => "info",
        "WARN" => "warn",
        "ERROR" => "error",
        _ => "warn",
    }
}

/// Installs a global `fmt` subscriber. `RUST_LOG` wins over the configured
/// level; output goes to `logging.path` when set, stderr otherwise.
pub fn init(logging: &Logging) -> Result<(), ProxyError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(&logging.level)));

    if let Some(path) = logging.path.as_deref().filter(|p| !p.is_empty()) {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .try_init()
            .map_err(|e| ProxyError::Config(format!("logging already initialised: {e}")))?;
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| ProxyError::Config(format!("logging already initialised: {e}")))
}
