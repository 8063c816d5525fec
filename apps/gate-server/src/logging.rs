use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over the configured level unless `prefer_config`
/// is set (an explicit `-v` on the command line).
///
/// # Errors
/// Returns an error if the level is not a valid filter directive or a global
/// subscriber is already installed.
pub fn init(cfg: &LoggingConfig, prefer_config: bool) -> anyhow::Result<()> {
    let from_env = if prefer_config {
        None
    } else {
        EnvFilter::try_from_default_env().ok()
    };
    let filter = match from_env {
        Some(filter) => filter,
        None => EnvFilter::try_new(&cfg.level)
            .map_err(|e| anyhow::anyhow!("invalid log level '{}': {e}", cfg.level))?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match cfg.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
    .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))
}
