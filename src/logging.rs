//! Caller-owned tracing setup
//!
//! The library only emits `tracing` events; nothing here runs unless the
//! caller asks for it. Requests made with TLS verification disabled log a
//! warning on [`INSECURE_TARGET`], which the filter built from
//! [`LoggingConfig`] can silence without touching any other target.

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Tracing target of the per-request "TLS verification disabled" warning
pub const INSECURE_TARGET: &str = "balancer_manager::insecure";

/// Build the event filter described by `config`
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    let mut directives = config.level.clone();
    if config.suppress_insecure_warnings {
        directives.push_str(&format!(",{INSECURE_TARGET}=off"));
    }
    EnvFilter::new(directives)
}

/// Install a process-wide subscriber
///
/// # Errors
///
/// Fails when a global subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let env_filter = env_filter(config);

    match config.format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()?;
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()?;
        }
    }

    Ok(())
}

/// Install a subscriber for the current thread until the guard drops
pub fn scoped(config: &LoggingConfig) -> tracing::subscriber::DefaultGuard {
    let env_filter = env_filter(config);

    match config.format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .set_default(),
        _ => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .set_default(),
    }
}
