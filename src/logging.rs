use anyhow::{Context, Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LoggingConfig;

pub fn init_tracing(logging_config: &LoggingConfig) -> Result<()> {
    if logging_config.filter.trim().is_empty() {
        return Err(anyhow!("logging.filter cannot be empty"));
    }

    let env_filter = build_env_filter(&logging_config.filter)?;

    fmt()
        .with_env_filter(env_filter)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!("failed to initialize tracing subscriber: {err}"))?;

    tracing::info!(
        target: "logging",
        filter = %logging_config.filter,
        "logging_initialized"
    );
    Ok(())
}

fn build_env_filter(filter: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(filter)
        .with_context(|| format!("failed to parse logging.filter '{}'", filter))
}
