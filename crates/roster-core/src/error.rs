//! Error types for Roster.
//!
//! [`RosterError`] is the failure taxonomy shared by every pipeline stage.
//! Each variant maps to exactly one HTTP status and one client-facing message;
//! internal detail (store driver errors, I/O errors) stays in the error chain
//! for logging and is never rendered into the response body.
//!
//! | Variant | Status | Body message |
//! |---|---|---|
//! | `Unauthenticated(Missing)` | 401 | `No token, unauthorized` |
//! | `Unauthenticated(Invalid)` | 401 | `Invalid token` |
//! | `NotFound` | 404 | `Employee not found` |
//! | `Validation` | 400 | the validation message |
//! | `Store` | 500 | `Server error` |

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`RosterError`].
pub type RosterResult<T> = Result<T, RosterError>;

/// Body message for a request without a usable credential.
pub const MISSING_TOKEN_MESSAGE: &str = "No token, unauthorized";

/// Body message for a credential that failed verification.
pub const INVALID_TOKEN_MESSAGE: &str = "Invalid token";

/// Body message for an unknown employee id.
pub const NOT_FOUND_MESSAGE: &str = "Employee not found";

/// Body message for any store or attachment fault.
pub const SERVER_ERROR_MESSAGE: &str = "Server error";

/// Why a request failed the authentication gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnauthenticatedReason {
    /// No header, or the header had no credential token.
    Missing,
    /// A credential was present but did not verify.
    Invalid,
}

impl UnauthenticatedReason {
    /// Returns the client-facing message for this reason.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Missing => MISSING_TOKEN_MESSAGE,
            Self::Invalid => INVALID_TOKEN_MESSAGE,
        }
    }
}

impl std::fmt::Display for UnauthenticatedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => f.write_str("missing"),
            Self::Invalid => f.write_str("invalid"),
        }
    }
}

/// Coarse classification of a [`RosterError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Missing or invalid credential.
    Authentication,
    /// Malformed client input.
    Validation,
    /// No record with the requested id.
    NotFound,
    /// Persistence or file-write fault.
    Store,
}

impl ErrorCategory {
    /// Returns the HTTP status code for this category.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Authentication => StatusCode::UNAUTHORIZED,
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Store => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Standard error type for Roster.
///
/// # Example
///
/// ```
/// use roster_core::{RosterError, UnauthenticatedReason};
/// use http::StatusCode;
///
/// let err = RosterError::unauthenticated(UnauthenticatedReason::Missing);
/// assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
/// assert_eq!(err.client_message(), "No token, unauthorized");
/// ```
#[derive(Error, Debug)]
pub enum RosterError {
    /// The request did not pass the authentication gate.
    #[error("unauthenticated: {reason} credential")]
    Unauthenticated {
        /// Why authentication failed.
        reason: UnauthenticatedReason,
    },

    /// The addressed record does not exist.
    #[error("employee '{id}' not found")]
    NotFound {
        /// The id that was looked up.
        id: String,
    },

    /// The request body or query was malformed.
    #[error("validation error: {message}")]
    Validation {
        /// Human-readable description, returned to the client.
        message: String,
    },

    /// The store or the attachment storage failed.
    #[error("store error: {message}")]
    Store {
        /// Short description for logs.
        message: String,
        /// The underlying fault (never exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl RosterError {
    /// Creates an authentication failure.
    #[must_use]
    pub const fn unauthenticated(reason: UnauthenticatedReason) -> Self {
        Self::Unauthenticated { reason }
    }

    /// Creates a not-found error for an employee id.
    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a store error without an underlying source.
    #[must_use]
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a store error wrapping an underlying fault.
    pub fn store_with_source(message: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Store {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Unauthenticated { .. } => ErrorCategory::Authentication,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::Store { .. } => ErrorCategory::Store,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.category().status_code()
    }

    /// Returns the message rendered into the response body.
    #[must_use]
    pub fn client_message(&self) -> &str {
        match self {
            Self::Unauthenticated { reason } => reason.message(),
            Self::NotFound { .. } => NOT_FOUND_MESSAGE,
            Self::Validation { message } => message,
            Self::Store { .. } => SERVER_ERROR_MESSAGE,
        }
    }

    /// Converts this error to its response body.
    #[must_use]
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody::new(self.client_message())
    }
}

/// The JSON body of every failure response: `{"message": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Short, client-safe description.
    pub message: String,
}

impl ErrorBody {
    /// Creates a body with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
