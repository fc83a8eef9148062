//! Configuration schema definitions.
//!
//! This module defines the server-level configuration read from TOML.
//! Directive configuration (the `errors` block) lives in a separate
//! directive file referenced by [`SiteConfig::directives`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration for the server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Site being served (document root, directive file).
    pub site: SiteConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Site configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Document root. Static files and error pages resolve against it.
    pub root: PathBuf,

    /// Optional directive file (e.g. containing an `errors { ... }` block).
    pub directives: Option<PathBuf>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            directives: None,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: ServerConfig = toml::from_str("[site]\nroot = \"/srv/www\"\n").unwrap();
        assert_eq!(config.site.root, PathBuf::from("/srv/www"));
        assert!(config.site.directives.is_none());
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.timeouts.request_secs, 30);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_full_toml() {
        let input = r#"
            [listener]
            bind_address = "127.0.0.1:9000"

            [site]
            root = "public"
            directives = "site.conf"

            [timeouts]
            request_secs = 5

            [observability]
            log_level = "debug"
            metrics_enabled = true
        "#;
        let config: ServerConfig = toml::from_str(input).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(config.site.directives, Some(PathBuf::from("site.conf")));
        assert_eq!(config.timeouts.request_secs, 5);
        assert!(config.observability.metrics_enabled);
        assert_eq!(config.observability.metrics_address, "0.0.0.0:9090");
    }
}
