//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections.

use roster_telemetry::LogFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

const MIB: usize = 1024 * 1024;

/// Server configuration section.
///
/// Controls the HTTP server: bind address, timeouts and body limit.
///
/// # Example
///
/// ```
/// use roster_config::ServerConfig;
///
/// let config = ServerConfig {
///     http_addr: "127.0.0.1:5000".to_string(),
///     ..Default::default()
/// };
/// assert_eq!(config.request_timeout_ms, 30_000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// HTTP server bind address (e.g., "0.0.0.0:5000").
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Request timeout in milliseconds, covering body collection and handling.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Largest accepted request body in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            request_timeout_ms: default_request_timeout(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_http_addr() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    30_000
}

fn default_max_body_bytes() -> usize {
    50 * MIB
}

/// Credential verification settings.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Shared HMAC secret for bearer tokens. Required.
    #[serde(default)]
    pub jwt_secret: String,

    /// Clock skew tolerated when checking `exp`, in seconds.
    #[serde(default)]
    pub leeway_secs: u64,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[redacted]")
            .field("leeway_secs", &self.leeway_secs)
            .finish()
    }
}

/// Attachment storage settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Directory attachments are written to and served from.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    /// Largest accepted attachment in bytes.
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: usize,

    /// Most multipart parts accepted in one request.
    #[serde(default = "default_max_fields")]
    pub max_fields: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            max_file_bytes: default_max_file_bytes(),
            max_fields: default_max_fields(),
        }
    }
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_max_file_bytes() -> usize {
    10 * MIB
}

fn default_max_fields() -> usize {
    100
}

/// Cross-origin settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CorsSection {
    /// Allowed origins; `"*"` allows any.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    /// Preflight cache lifetime in seconds.
    #[serde(default = "default_max_age")]
    pub max_age_secs: u64,
}

impl Default for CorsSection {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
            max_age_secs: default_max_age(),
        }
    }
}

fn default_allowed_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_max_age() -> u64 {
    86_400
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level or filter directive.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include ANSI color codes in output.
    #[serde(default)]
    pub ansi_enabled: bool,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            ansi_enabled: false,
            include_location: false,
        }
    }
}

impl From<&LoggingConfig> for roster_telemetry::LogConfig {
    fn from(config: &LoggingConfig) -> Self {
        Self {
            enabled: config.enabled,
            level: config.level.clone(),
            format: config.format,
            ansi_enabled: config.ansi_enabled,
            include_location: config.include_location,
            include_target: true,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, "0.0.0.0:5000");
        assert_eq!(config.shutdown_timeout_secs, 30);
        assert_eq!(config.max_body_bytes, 50 * 1024 * 1024);
    }

    #[test]
    fn test_storage_defaults() {
        let config = StorageConfig::default();
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.max_file_bytes, 10 * 1024 * 1024);
        assert_eq!(config.max_fields, 100);
    }

    #[test]
    fn test_auth_debug_redacts_secret() {
        let config = AuthConfig {
            jwt_secret: "hunter2".to_string(),
            leeway_secs: 5,
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("leeway_secs: 5"));
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let cors: CorsSection = toml::from_str("max_age_secs = 60").unwrap();
        assert_eq!(cors.allowed_origins, vec!["*"]);
        assert_eq!(cors.max_age_secs, 60);
    }

    #[test]
    fn test_logging_converts_to_log_config() {
        let section = LoggingConfig {
            level: "debug".to_string(),
            format: LogFormat::Pretty,
            ..Default::default()
        };
        let log = roster_telemetry::LogConfig::from(&section);
        assert_eq!(log.level, "debug");
        assert_eq!(log.format, LogFormat::Pretty);
        assert!(log.include_target);
    }
}
