//! Structured logging

use tracing_subscriber::EnvFilter;

use crate::{config::Config, error::Result};

/// Initialize JSON tracing at the configured log level
///
/// Calling this more than once is harmless: if a global subscriber is
/// already installed the existing one is kept.
pub fn init_tracing(config: &Config) -> Result<()> {
    let log_level = config.service.log_level.clone();

    let installed = tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();

    match installed {
        Ok(()) => tracing::info!("Tracing initialized for service: {}", config.service.name),
        Err(e) => tracing::debug!("Tracing already initialized: {}", e),
    }

    Ok(())
}

/// Flush and stop tracing
pub fn shutdown_tracing() {
    tracing::info!("Tracing shutdown complete");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_is_idempotent() {
        let mut config = Config::default();
        config.service.log_level = "not a level [".to_string();
        assert!(init_tracing(&config).is_ok());
        assert!(init_tracing(&config).is_ok());
        shutdown_tracing();
    }
}
