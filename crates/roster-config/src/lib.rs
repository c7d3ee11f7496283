//! Typed configuration for the roster employee service.
//!
//! - TOML and JSON configuration files
//! - `.env` files and environment variable overrides
//! - Strict parsing (fails on unknown fields) with per-field defaults
//! - Validation of the loaded result
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:5000"
//! shutdown_timeout_secs = 30
//! request_timeout_ms = 30000
//! max_body_bytes = 52428800
//!
//! [auth]
//! jwt_secret = "change-me"
//! leeway_secs = 0
//!
//! [storage]
//! upload_dir = "uploads"
//! max_file_bytes = 10485760
//! max_fields = 100
//!
//! [cors]
//! allowed_origins = ["*"]
//! max_age_secs = 86400
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```
//!
//! # Environment Variable Overrides
//!
//! `PORT` and `JWT_SECRET` are honoured when
//! [`ConfigLoader::with_conventional_env`] is used. Every value can also be
//! set with `PREFIX__SECTION__KEY`, for example
//! `ROSTER__STORAGE__UPLOAD_DIR=/var/lib/roster/uploads`.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::RosterConfig;
pub use error::ConfigError;
pub use loader::{ConfigLoader, JWT_SECRET_VAR, PORT_VAR};
pub use roster_telemetry::LogFormat;
pub use schema::{AuthConfig, CorsSection, LoggingConfig, ServerConfig, StorageConfig};
