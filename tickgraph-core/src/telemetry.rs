//! Tracing subscriber setup.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};

/// Install a global `fmt` subscriber.
///
/// `RUST_LOG` wins when set; otherwise the configured filter is used. Fails
/// instead of panicking if a global subscriber already exists.
pub fn init_tracing(config: &EngineConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init()
        .map_err(|e| EngineError::Telemetry(e.to_string()))
}
