//! Worker configuration loaded from environment variables.

use std::net::SocketAddr;
use std::time::Duration;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }
}

/// Packaging worker configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `DATABASE_URL`: PostgreSQL connection string (default: unset, in-memory store)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `text` or `json` (default: `"text"`)
/// - `METRICS_ADDR`: Prometheus listener (default: `"0.0.0.0:9100"`)
/// - `PACKAGE_TRANSPORT`: transport for package messages (default: `"ozon-package"`)
/// - `DELIVERY_TYPE`: delivery type of orders to pack (default: `"fbs-ozon"`)
/// - `SWEEP_INTERVAL_SECS`: seconds between supply total sweeps (default: `60`)
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub log_level: String,
    pub log_format: LogFormat,
    pub metrics_addr: SocketAddr,
    pub package_transport: String,
    pub delivery_type: String,
    pub sweep_interval: Duration,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: lookup("LOG_FORMAT")
                .map(|format| LogFormat::parse(&format))
                .unwrap_or(defaults.log_format),
            metrics_addr: lookup("METRICS_ADDR")
                .and_then(|addr| addr.parse().ok())
                .unwrap_or(defaults.metrics_addr),
            package_transport: lookup("PACKAGE_TRANSPORT").unwrap_or(defaults.package_transport),
            delivery_type: lookup("DELIVERY_TYPE").unwrap_or(defaults.delivery_type),
            sweep_interval: lookup("SWEEP_INTERVAL_SECS")
                .and_then(|secs| secs.parse().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.sweep_interval),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            metrics_addr: SocketAddr::from(([0, 0, 0, 0], 9100)),
            package_transport: "ozon-package".to_string(),
            delivery_type: "fbs-ozon".to_string(),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_values() {
        let config = Config::from_lookup(lookup(&[]));
        assert!(config.database_url.is_none());
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.metrics_addr.port(), 9100);
        assert_eq!(config.package_transport, "ozon-package");
        assert_eq!(config.delivery_type, "fbs-ozon");
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/packaging"),
            ("LOG_FORMAT", "JSON"),
            ("METRICS_ADDR", "127.0.0.1:9200"),
            ("PACKAGE_TRANSPORT", "packages"),
            ("SWEEP_INTERVAL_SECS", "15"),
        ]));
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/packaging")
        );
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.metrics_addr.to_string(), "127.0.0.1:9200");
        assert_eq!(config.package_transport, "packages");
        assert_eq!(config.sweep_interval, Duration::from_secs(15));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", ""),
            ("METRICS_ADDR", "not an address"),
            ("LOG_FORMAT", "xml"),
            ("SWEEP_INTERVAL_SECS", "0"),
        ]));
        assert!(config.database_url.is_none());
        assert_eq!(config.metrics_addr.port(), 9100);
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
    }
}
