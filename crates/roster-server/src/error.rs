//! Server startup errors.

use std::net::SocketAddr;

use thiserror::Error;

/// Errors raised while assembling or starting the server.
///
/// Request failures never surface here; they become responses.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listen address does not parse.
    #[error("invalid listen address '{addr}': {source}")]
    InvalidAddress {
        /// The configured address.
        addr: String,
        /// Parse failure.
        #[source]
        source: std::net::AddrParseError,
    },

    /// Binding the listener failed.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The address that could not be bound.
        addr: SocketAddr,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The app builder is missing a required part.
    #[error("app is missing its {0}")]
    MissingComponent(&'static str),
}

impl ServerError {
    /// Creates an [`InvalidAddress`](Self::InvalidAddress) error.
    pub fn invalid_address(addr: impl Into<String>, source: std::net::AddrParseError) -> Self {
        Self::InvalidAddress {
            addr: addr.into(),
            source,
        }
    }

    /// Creates a [`Bind`](Self::Bind) error.
    pub const fn bind(addr: SocketAddr, source: std::io::Error) -> Self {
        Self::Bind { addr, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let parse = "nope".parse::<SocketAddr>().unwrap_err();
        let err = ServerError::invalid_address("nope", parse);
        assert!(err.to_string().starts_with("invalid listen address 'nope'"));

        let err = ServerError::MissingComponent("employee store");
        assert_eq!(err.to_string(), "app is missing its employee store");
    }

    #[test]
    fn test_bind_keeps_source() {
        use std::error::Error as _;

        let addr: SocketAddr = "127.0.0.1:80".parse().unwrap();
        let err = ServerError::bind(
            addr,
            std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use"),
        );
        assert!(err.to_string().contains("127.0.0.1:80"));
        assert!(err.source().is_some());
    }
}
