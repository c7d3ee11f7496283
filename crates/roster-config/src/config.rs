//! Main configuration types.
//!
//! This module provides the top-level [`RosterConfig`] struct.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

use crate::{AuthConfig, ConfigError, CorsSection, LoggingConfig, ServerConfig, StorageConfig};

/// Complete roster service configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from
/// files and environment variables.
///
/// # Example
///
/// ```
/// use roster_config::RosterConfig;
///
/// let config = RosterConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:5000");
/// assert!(config.validate().is_err()); // no jwt_secret yet
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct RosterConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Credential verification.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Attachment storage.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Cross-origin policy.
    #[serde(default)]
    pub cors: CorsSection,

    /// Logging.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl RosterConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// - `MissingField` when `auth.jwt_secret` is empty
    /// - `InvalidValue` for an unparsable address, a zero limit, an empty
    ///   origin list or an invalid log filter
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;

        if self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::missing_field("auth.jwt_secret"));
        }

        for (field, value) in [
            ("server.max_body_bytes", self.server.max_body_bytes),
            ("storage.max_file_bytes", self.storage.max_file_bytes),
            ("storage.max_fields", self.storage.max_fields),
        ] {
            if value == 0 {
                return Err(ConfigError::invalid_value(field, "must be greater than zero"));
            }
        }

        if self.server.request_timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "server.request_timeout_ms",
                "must be greater than zero",
            ));
        }

        if self.storage.upload_dir.as_os_str().is_empty() {
            return Err(ConfigError::invalid_value("storage.upload_dir", "must not be empty"));
        }

        if self.cors.allowed_origins.is_empty() {
            return Err(ConfigError::invalid_value(
                "cors.allowed_origins",
                "list at least one origin or \"*\"",
            ));
        }

        roster_telemetry::create_env_filter(&self.logging.level)
            .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;

        Ok(())
    }

    /// Returns the parsed bind address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server.http_addr.parse().map_err(|_| {
            ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            )
        })
    }

    /// Returns the request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.server.request_timeout_ms)
    }

    /// Returns the graceful shutdown timeout.
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }

    /// Create a development configuration preset.
    ///
    /// Pretty, debug-level logs with colours and source locations.
    ///
    /// # Example
    ///
    /// ```
    /// use roster_config::RosterConfig;
    ///
    /// let config = RosterConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.server.http_addr = "127.0.0.1:5000".to_string();
        config.logging.level = "debug".to_string();
        config.logging.format = crate::LogFormat::Pretty;
        config.logging.ansi_enabled = true;
        config.logging.include_location = true;
        config
    }

    /// Create a production configuration preset.
    ///
    /// JSON logs at `info`.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.logging.level = "info".to_string();
        config.logging.format = crate::LogFormat::Json;
        config.logging.ansi_enabled = false;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> RosterConfig {
        let mut config = RosterConfig::default();
        config.auth.jwt_secret = "secret".to_string();
        config
    }

    #[test]
    fn test_default_config() {
        let config = RosterConfig::default();
        assert_eq!(config.server.http_addr, "0.0.0.0:5000");
        assert_eq!(config.cors.allowed_origins, vec!["*"]);
        assert_eq!(config.auth.leeway_secs, 0);
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_validate_requires_secret() {
        let err = RosterConfig::default().validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { ref field } if field == "auth.jwt_secret"));
    }

    #[test]
    fn test_validate_invalid_server_addr() {
        let mut config = valid();
        config.server.http_addr = "localhost".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("server.http_addr"));
    }

    #[test]
    fn test_validate_zero_limits() {
        let mut config = valid();
        config.storage.max_fields = 0;
        assert!(config.validate().unwrap_err().to_string().contains("storage.max_fields"));
    }

    #[test]
    fn test_validate_empty_origins() {
        let mut config = valid();
        config.cors.allowed_origins.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bad_log_level() {
        let mut config = valid();
        config.logging.level = "roster=chatty".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("logging.level"));
    }

    #[test]
    fn test_durations() {
        let config = valid();
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_development_preset() {
        let config = RosterConfig::development();
        assert_eq!(config.logging.format, crate::LogFormat::Pretty);
        assert!(config.logging.include_location);
    }

    #[test]
    fn test_production_preset() {
        let config = RosterConfig::production();
        assert_eq!(config.logging.format, crate::LogFormat::Json);
        assert!(!config.logging.ansi_enabled);
    }

    #[test]
    fn test_toml_roundtrip_keeps_sections() {
        let config = valid();
        let text = toml::to_string(&config).unwrap();
        let parsed: RosterConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<RosterConfig, _> = toml::from_str(
            r#"
            [server]
            http_addr = "0.0.0.0:5000"
            max_connections = 10
            "#,
        );
        assert!(result.is_err());
    }
}
