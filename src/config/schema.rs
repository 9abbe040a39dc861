//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address, concurrency).
    pub listener: ListenerConfig,

    /// Alias bindings and dispatch behaviour.
    pub router: RouterConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum requests in flight (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 10_000,
        }
    }
}

/// One alias/route pair from the config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BindingConfig {
    /// Public alias template, e.g. `Article/<:num>`.
    pub alias: String,

    /// Internal route template, e.g. `Article/read/$1`.
    pub route: String,
}

/// Router configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Persistent cache file for bindings and memoized answers.
    pub cache_file: Option<String>,

    /// Write the cache file at every binding change (otherwise only on flush
    /// and shutdown).
    pub autosave: bool,

    /// Redirect requests to the canonical alias of their route.
    pub canonical_redirect: bool,

    /// URL prefix the application is mounted under.
    pub base_path: String,

    /// Controller used when the route is empty.
    pub default_controller: String,

    /// Action used when the route names only a controller.
    pub default_action: String,

    /// Bindings, applied in order (later entries take precedence).
    pub bindings: Vec<BindingConfig>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            cache_file: None,
            autosave: true,
            canonical_redirect: true,
            base_path: "/".to_string(),
            default_controller: "Index".to_string(),
            default_action: "index".to_string(),
            bindings: Vec::new(),
        }
    }
}

impl RouterConfig {
    /// Bindings as borrowed pairs, in file order.
    pub fn binding_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings
            .iter()
            .map(|b| (b.alias.as_str(), b.route.as_str()))
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert!(config.router.autosave);
        assert!(config.router.canonical_redirect);
        assert_eq!(config.router.default_controller, "Index");
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_bindings_keep_file_order() {
        let config: AppConfig = toml::from_str(
            r#"
            [router]
            cache_file = "cache/router.json"

            [[router.bindings]]
            alias = "<:end>"
            route = "Document"

            [[router.bindings]]
            alias = "Document/<:rest>"
            route = "Document/read/$1"

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        let pairs: Vec<_> = config.router.binding_pairs().collect();
        assert_eq!(
            pairs,
            vec![("<:end>", "Document"), ("Document/<:rest>", "Document/read/$1")]
        );
        assert_eq!(config.router.cache_file.as_deref(), Some("cache/router.json"));
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }
}
