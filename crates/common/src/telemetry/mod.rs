//! Tracing subscriber setup
//!
//! `RUST_LOG` wins over the configured level when set. Logs go to stderr.

use crate::config::ObservabilityConfig;
use tracing_subscriber::EnvFilter;

/// Build the log filter for a configuration
pub fn env_filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
}

/// Install the global tracing subscriber.
///
/// Returns an error if a subscriber was already installed.
pub fn init_tracing(config: &ObservabilityConfig) -> anyhow::Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_writer(std::io::stderr)
        .with_target(true);

    if config.json_logging {
        builder
            .json()
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;
    } else {
        builder
            .compact()
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;
    }

    tracing::debug!(service = %config.service_name, "Tracing initialized");
    Ok(())
}
