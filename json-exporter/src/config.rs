//! Configuration for the JSON exporter.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] json5::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Complete exporter configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Outbound probe settings.
    #[serde(default)]
    pub probe: ProbeConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on (default: "0.0.0.0:9116").
    ///
    /// A bare `:port` binds on all interfaces.
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Path for the exporter's own metrics (default: "/metrics").
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,
}

fn default_listen() -> String {
    "0.0.0.0:9116".to_string()
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            metrics_path: default_metrics_path(),
        }
    }
}

impl ServerConfig {
    /// Resolve the listen address into a socket address.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let listen = if self.listen.starts_with(':') {
            format!("0.0.0.0{}", self.listen)
        } else {
            self.listen.clone()
        };

        listen.parse().map_err(|_| {
            ConfigError::Validation(format!("Invalid listen address: {}", self.listen))
        })
    }
}

/// Settings applied to every outbound probe request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// TCP connect timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Overall request timeout in seconds, body included.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Accept any TLS certificate presented by the target.
    ///
    /// Enabled by default so self-signed internal endpoints can be probed.
    #[serde(default = "default_insecure_skip_verify")]
    pub insecure_skip_verify: bool,

    /// Reject bodies that are not valid JSON instead of treating them as `null`.
    #[serde(default = "default_strict_json")]
    pub strict_json: bool,

    /// Query parameter prefix that marks a field definition.
    #[serde(default = "default_field_prefix")]
    pub field_prefix: String,

    /// User-Agent header sent to targets.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_timeout() -> u64 {
    10
}

fn default_insecure_skip_verify() -> bool {
    true
}

fn default_strict_json() -> bool {
    true
}

fn default_field_prefix() -> String {
    "jsonpath.".to_string()
}

fn default_user_agent() -> String {
    concat!("json-exporter/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            timeout_secs: default_timeout(),
            insecure_skip_verify: default_insecure_skip_verify(),
            strict_json: default_strict_json(),
            field_prefix: default_field_prefix(),
            user_agent: default_user_agent(),
        }
    }
}

impl ProbeConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format: "text" or "json".
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Paths served by the exporter itself; the metrics path may not shadow them.
const RESERVED_PATHS: &[&str] = &["/", "/probe", "/health"];

impl ExporterConfig {
    /// Load configuration from a JSON5 file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a JSON5 string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: ExporterConfig = json5::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.listen_addr()?;

        if !self.server.metrics_path.starts_with('/') {
            return Err(ConfigError::Validation(
                "Metrics path must start with /".to_string(),
            ));
        }

        if RESERVED_PATHS.contains(&self.server.metrics_path.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Metrics path {} is reserved",
                self.server.metrics_path
            )));
        }

        if self.probe.connect_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "connect_timeout_secs must be > 0".to_string(),
            ));
        }

        if self.probe.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "timeout_secs must be > 0".to_string(),
            ));
        }

        if self.probe.connect_timeout_secs > self.probe.timeout_secs {
            return Err(ConfigError::Validation(
                "connect_timeout_secs must not exceed timeout_secs".to_string(),
            ));
        }

        if self.probe.field_prefix.is_empty() {
            return Err(ConfigError::Validation(
                "field_prefix must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_minimal_config() {
        let config = ExporterConfig::parse("{}").unwrap();

        assert_eq!(config.server.listen, "0.0.0.0:9116");
        assert_eq!(config.server.metrics_path, "/metrics");
        assert_eq!(config.probe.connect_timeout_secs, 5);
        assert_eq!(config.probe.timeout_secs, 10);
        assert!(config.probe.insecure_skip_verify);
        assert!(config.probe.strict_json);
        assert_eq!(config.probe.field_prefix, "jsonpath.");
        assert!(config.probe.user_agent.starts_with("json-exporter/"));
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            server: {
                listen: "127.0.0.1:9200",
                metrics_path: "/internal/metrics"
            },
            probe: {
                connect_timeout_secs: 2,
                timeout_secs: 4,
                insecure_skip_verify: false,
                strict_json: false,
                field_prefix: "field.",
                user_agent: "probe-bot"
            },
            logging: {
                level: "debug",
                format: "json"
            }
        }"#;

        let config = ExporterConfig::parse(json).unwrap();

        assert_eq!(config.server.listen, "127.0.0.1:9200");
        assert_eq!(config.server.metrics_path, "/internal/metrics");
        assert_eq!(config.probe.connect_timeout(), Duration::from_secs(2));
        assert_eq!(config.probe.timeout(), Duration::from_secs(4));
        assert!(!config.probe.insecure_skip_verify);
        assert!(!config.probe.strict_json);
        assert_eq!(config.probe.field_prefix, "field.");
        assert_eq!(config.probe.user_agent, "probe-bot");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_listen_addr_port_only() {
        let config = ExporterConfig::parse(r#"{ server: { listen: ":9116" } }"#).unwrap();
        let addr = config.server.listen_addr().unwrap();

        assert_eq!(addr, "0.0.0.0:9116".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_validate_invalid_listen() {
        let result = ExporterConfig::parse(r#"{ server: { listen: "not-an-address" } }"#);

        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Invalid listen address")
        );
    }

    #[test]
    fn test_validate_invalid_path() {
        let result = ExporterConfig::parse(r#"{ server: { metrics_path: "metrics" } }"#);

        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("must start with /")
        );
    }

    #[test]
    fn test_validate_reserved_path() {
        let result = ExporterConfig::parse(r#"{ server: { metrics_path: "/probe" } }"#);

        assert!(result.unwrap_err().to_string().contains("reserved"));
    }

    #[test]
    fn test_validate_zero_timeout() {
        assert!(ExporterConfig::parse(r#"{ probe: { timeout_secs: 0 } }"#).is_err());
        assert!(ExporterConfig::parse(r#"{ probe: { connect_timeout_secs: 0 } }"#).is_err());
    }

    #[test]
    fn test_validate_connect_timeout_exceeds_timeout() {
        let json = r#"{ probe: { connect_timeout_secs: 20, timeout_secs: 10 } }"#;

        assert!(ExporterConfig::parse(json).is_err());
    }

    #[test]
    fn test_validate_empty_prefix() {
        assert!(ExporterConfig::parse(r#"{ probe: { field_prefix: "" } }"#).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{ server: {{ listen: "127.0.0.1:9300" }} }}"#).unwrap();

        let config = ExporterConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.server.listen, "127.0.0.1:9300");
    }

    #[test]
    fn test_load_missing_file() {
        let result = ExporterConfig::load_from_file("/nonexistent/json-exporter.json5");

        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
