//! # Observability
//!
//! Tracing subscriber setup. `RUST_LOG` takes precedence; otherwise the
//! configured level is applied to this crate and `warn` to everything else.

use crate::config::{LogFormat, SyncConfig};
use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber for this process.
///
/// # Errors
///
/// Returns an error if a global subscriber has already been installed.
pub fn init_tracing(config: &SyncConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(&config.log_level).into());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match config.log_format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.with_target(false).try_init(),
    }
    .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}

fn default_filter(level: &str) -> String {
    format!("warn,secret_template_sync={}", level.to_lowercase())
}
