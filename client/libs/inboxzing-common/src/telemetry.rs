//! Logging bootstrap
//!
//! `RUST_LOG` wins over the configured level when set.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ClientConfig;

/// Install the global `tracing` subscriber
///
/// Returns an error if a subscriber is already installed.
pub fn init_logging(config: &ClientConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.log_json {
        registry
            .with(fmt::layer().json().with_target(true))
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().with_target(true).with_level(true))
            .try_init()?;
    }

    tracing::info!(
        level = %config.log_level,
        json = config.log_json,
        "Logging initialized"
    );

    Ok(())
}
