//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Pick the log level from `RUST_LOG`, falling back to configuration
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Human-readable fmt output on stdout
//! - Server diagnostics only; the `errors` directive's log is separate

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Filter used when `RUST_LOG` is not set.
pub fn default_filter(config: &ObservabilityConfig) -> String {
    let level = config.log_level.to_lowercase();
    format!("errorpages={level},tower_http={level}")
}

/// Install the global subscriber. Later calls are ignored.
pub fn init(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(config)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        let config = ObservabilityConfig {
            log_level: "DEBUG".into(),
            ..ObservabilityConfig::default()
        };
        assert_eq!(default_filter(&config), "errorpages=debug,tower_http=debug");
    }
}
