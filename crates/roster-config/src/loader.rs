//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! defaults, files, a `.env` file and environment variables.

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::{ConfigError, LogFormat, RosterConfig};

/// Environment variable holding the HTTP port.
pub const PORT_VAR: &str = "PORT";

/// Environment variable holding the token secret.
pub const JWT_SECRET_VAR: &str = "JWT_SECRET";

/// Configuration loader with layered approach.
///
/// Later layers override earlier ones:
/// 1. Default values (or a preset)
/// 2. Configuration file (TOML or JSON)
/// 3. `.env` file, loaded into the process environment
/// 4. `PORT` and `JWT_SECRET`
/// 5. Prefixed variables, `PREFIX__SECTION__KEY`
///
/// # Example
///
/// ```no_run
/// use roster_config::ConfigLoader;
///
/// # fn main() -> Result<(), roster_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_optional_file("roster.toml")?
///     .with_dotenv()?
///     .with_conventional_env()
///     .with_env_prefix("ROSTER")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: RosterConfig,
    env_prefix: Option<String>,
    conventional_env: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader starting from defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: RosterConfig::default(),
            env_prefix: None,
            conventional_env: false,
        }
    }

    /// Start with development preset configuration.
    ///
    /// # Example
    ///
    /// ```
    /// use roster_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_development()
    ///     .load_unvalidated();
    ///
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = RosterConfig::development();
        self
    }

    /// Start with production preset configuration.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = RosterConfig::production();
        self
    }

    /// Load configuration from a file.
    ///
    /// The format is chosen by extension: `.toml` or `.json`. Sections and
    /// fields missing from the file take their defaults.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read(path, e))?;

        self.config = Self::parse_file(&content, path)?;
        Ok(self)
    }

    /// Load configuration from a file if it exists.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in `toml` or `json` format.
    ///
    /// # Example
    ///
    /// ```
    /// use roster_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [server]
    ///     http_addr = "127.0.0.1:3000"
    ///
    ///     [auth]
    ///     jwt_secret = "change-me"
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.server.http_addr, "127.0.0.1:3000");
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = parse(content, &format.to_lowercase(), "<string>")?;
        Ok(self)
    }

    /// Load the `.env` file from the current directory or its parents.
    ///
    /// A missing file is not an error. Variables already present in the
    /// environment are not overwritten.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(e.into()),
        }
    }

    /// Load a specific dotenv file, which must exist.
    pub fn with_dotenv_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        dotenvy::from_path(path.as_ref())?;
        Ok(self)
    }

    /// Honour `PORT` and `JWT_SECRET`.
    #[must_use]
    pub fn with_conventional_env(mut self) -> Self {
        self.conventional_env = true;
        self
    }

    /// Set environment variable prefix for overrides.
    ///
    /// With prefix `ROSTER`:
    /// - `ROSTER__SERVER__HTTP_ADDR=0.0.0.0:9000`
    /// - `ROSTER__STORAGE__UPLOAD_DIR=/var/lib/roster/uploads`
    /// - `ROSTER__CORS__ALLOWED_ORIGINS=https://a.example,https://b.example`
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Apply environment overrides, validate and return the configuration.
    pub fn load(self) -> Result<RosterConfig, ConfigError> {
        let config = self.load_from_vars(env::vars())?;
        config.validate()?;
        Ok(config)
    }

    /// Return the configuration without environment overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> RosterConfig {
        self.config
    }

    fn load_from_vars<I>(mut self, vars: I) -> Result<RosterConfig, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: Vec<(String, String)> = vars.into_iter().collect();

        if self.conventional_env {
            for (key, value) in &vars {
                self.apply_conventional_var(key, value)?;
            }
        }

        if let Some(prefix) = self.env_prefix.take() {
            let mut prefixed: Vec<&(String, String)> = vars
                .iter()
                .filter(|(k, _)| k.starts_with(&format!("{prefix}__")))
                .collect();
            prefixed.sort();
            for (key, value) in prefixed {
                self.apply_env_var(key, value, &prefix)?;
            }
        }

        Ok(self.config)
    }

    fn apply_conventional_var(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            PORT_VAR => {
                let port: u16 = value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected a port number"))?;
                let mut addr: SocketAddr = self.config.server.http_addr.parse().map_err(|_| {
                    ConfigError::env_parse_error(key, "server.http_addr is not a socket address")
                })?;
                addr.set_port(port);
                self.config.server.http_addr = addr.to_string();
            }
            JWT_SECRET_VAR => {
                self.config.auth.jwt_secret = value.to_string();
            }
            _ => {}
        }
        Ok(())
    }

    fn parse_file(content: &str, path: &Path) -> Result<RosterConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        parse(content, &extension, &path.display().to_string())
    }

    // Apply a single prefixed environment variable
    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let key_without_prefix = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;

        let parts: Vec<&str> = key_without_prefix.split("__").collect();
        let config = &mut self.config;

        match parts.as_slice() {
            // Server section
            ["SERVER", "HTTP_ADDR"] => config.server.http_addr = value.to_string(),
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                config.server.shutdown_timeout_secs = parse_number(key, value)?;
            }
            ["SERVER", "REQUEST_TIMEOUT_MS"] => {
                config.server.request_timeout_ms = parse_number(key, value)?;
            }
            ["SERVER", "MAX_BODY_BYTES"] => {
                config.server.max_body_bytes = parse_number(key, value)?;
            }

            // Auth section
            ["AUTH", "JWT_SECRET"] => config.auth.jwt_secret = value.to_string(),
            ["AUTH", "LEEWAY_SECS"] => config.auth.leeway_secs = parse_number(key, value)?,

            // Storage section
            ["STORAGE", "UPLOAD_DIR"] => config.storage.upload_dir = PathBuf::from(value),
            ["STORAGE", "MAX_FILE_BYTES"] => {
                config.storage.max_file_bytes = parse_number(key, value)?;
            }
            ["STORAGE", "MAX_FIELDS"] => config.storage.max_fields = parse_number(key, value)?,

            // CORS section
            ["CORS", "ALLOWED_ORIGINS"] => {
                config.cors.allowed_origins = value
                    .split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(String::from)
                    .collect();
            }
            ["CORS", "MAX_AGE_SECS"] => config.cors.max_age_secs = parse_number(key, value)?,

            // Logging section
            ["LOGGING", "ENABLED"] => config.logging.enabled = parse_flag(key, value)?,
            ["LOGGING", "LEVEL"] => config.logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                config.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }
            ["LOGGING", "ANSI_ENABLED"] => config.logging.ansi_enabled = parse_flag(key, value)?,
            ["LOGGING", "INCLUDE_LOCATION"] => {
                config.logging.include_location = parse_flag(key, value)?;
            }

            // Unknown key - ignore
            _ => {}
        }

        Ok(())
    }
}

fn parse(content: &str, format: &str, origin: &str) -> Result<RosterConfig, ConfigError> {
    match format {
        "toml" => toml::from_str(content).map_err(|source| ConfigError::Toml {
            origin: origin.to_string(),
            source,
        }),
        "json" => serde_json::from_str(content).map_err(|source| ConfigError::Json {
            origin: origin.to_string(),
            source,
        }),
        _ => Err(ConfigError::UnsupportedFormat {
            origin: origin.to_string(),
        }),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
