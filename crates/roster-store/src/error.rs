//! Store error types.

use roster_core::RosterError;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Faults raised by record stores and attachment storage.
///
/// Every variant is a server-side failure. Converting into [`RosterError`]
/// keeps the detail as the error source so it can be logged, while clients
/// only ever see the generic server message.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The id could not be parsed into the store's id format.
    #[error("malformed employee id '{id}'")]
    InvalidId {
        /// The raw id from the request path.
        id: String,
    },

    /// The backing collection failed.
    #[error("store backend failed during {operation}")]
    Backend {
        /// The store operation that failed.
        operation: &'static str,
        /// The underlying fault.
        #[source]
        source: anyhow::Error,
    },

    /// A file system operation on the storage root failed.
    #[error("attachment storage failed at {}", path.display())]
    Io {
        /// The file or directory involved.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// No free file name was found after repeated collisions.
    #[error("no free attachment name for '{file_name}' after {attempts} attempts")]
    NameExhausted {
        /// The sanitized client file name.
        file_name: String,
        /// How many names were tried.
        attempts: u32,
    },
}

impl StoreError {
    /// Creates an invalid id error.
    #[must_use]
    pub fn invalid_id(id: impl Into<String>) -> Self {
        Self::InvalidId { id: id.into() }
    }

    /// Wraps a backend fault for the named operation.
    pub fn backend(operation: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self::Backend {
            operation,
            source: source.into(),
        }
    }

    /// Wraps an I/O fault at `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<StoreError> for RosterError {
    fn from(err: StoreError) -> Self {
        let message = err.to_string();
        RosterError::store_with_source(message, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_core::ErrorCategory;

    #[test]
    fn test_converts_to_generic_server_error() {
        let err: RosterError = StoreError::invalid_id("not-a-uuid").into();
        assert_eq!(err.category(), ErrorCategory::Store);
        assert_eq!(err.client_message(), "Server error");
        assert!(err.to_string().contains("not-a-uuid"));
    }

    #[test]
    fn test_source_is_kept() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: RosterError = StoreError::io("/srv/uploads/1-a.png", io).into();
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(
            source.as_deref(),
            Some("attachment storage failed at /srv/uploads/1-a.png")
        );
    }
}
