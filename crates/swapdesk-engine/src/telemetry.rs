//! Logging initialization.

use swapdesk_types::{LogFormat, LoggingConfig, Result, SwapdeskError};
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` overrides `config.level` when set.
///
/// # Errors
/// `Configuration` if the level directive does not parse or a subscriber is
/// already installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| {
            SwapdeskError::Configuration(format!("invalid log level {:?}: {e}", config.level))
        })?;

    let installed = match config.format {
        LogFormat::Json => fmt().json().with_env_filter(filter).try_init(),
        LogFormat::Pretty => fmt().pretty().with_env_filter(filter).try_init(),
    };
    installed.map_err(|e| SwapdeskError::Configuration(format!("cannot install logger: {e}")))
}
