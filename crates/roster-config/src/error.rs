//! Configuration errors.

use std::path::PathBuf;
use thiserror::Error;

/// Why a configuration could not be produced.
///
/// File and parse errors name where the text came from; value errors name
/// the dotted field (`auth.jwt_secret`) or the environment variable.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested file does not exist.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// The requested path.
        path: PathBuf,
    },

    /// The file exists but could not be read.
    #[error("cannot read {path}: {source}")]
    Read {
        /// The file being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Only `toml` and `json` are understood.
    #[error("unsupported configuration format for {origin}")]
    UnsupportedFormat {
        /// File path or `<string>`.
        origin: String,
    },

    /// TOML did not deserialize into the schema.
    #[error("invalid TOML in {origin}: {source}")]
    Toml {
        /// File path or `<string>`.
        origin: String,
        /// Parser error, including unknown keys.
        #[source]
        source: toml::de::Error,
    },

    /// JSON did not deserialize into the schema.
    #[error("invalid JSON in {origin}: {source}")]
    Json {
        /// File path or `<string>`.
        origin: String,
        /// Parser error, including unknown keys.
        #[source]
        source: serde_json::Error,
    },

    /// `.env` exists but is malformed or unreadable.
    #[error("failed to load .env: {0}")]
    Dotenv(#[from] dotenvy::Error),

    /// An environment variable has a value of the wrong shape.
    #[error("environment variable {var}: {reason}")]
    EnvParseError {
        /// Variable name.
        var: String,
        /// What was expected.
        reason: String,
    },

    /// A loaded value fails validation.
    #[error("{field}: {reason}")]
    InvalidValue {
        /// Dotted field path.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A required value is absent or empty.
    #[error("{field} is required")]
    MissingField {
        /// Dotted field path.
        field: String,
    },
}

impl ConfigError {
    pub(crate) fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    pub(crate) fn env_parse_error(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvParseError {
            var: var.into(),
            reason: reason.into(),
        }
    }

    /// Returns the field or variable the error is about, if any.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        match self {
            Self::InvalidValue { field, .. } | Self::MissingField { field } => Some(field),
            Self::EnvParseError { var, .. } => Some(var),
            _ => None,
        }
    }
}
