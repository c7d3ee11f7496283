//! Test error types.

use thiserror::Error;

/// Errors raised while building requests or reading responses in tests.
#[derive(Debug, Error)]
pub enum TestError {
    /// The request could not be assembled.
    #[error("request build error: {0}")]
    RequestBuild(String),

    /// A header name or value is invalid.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// The response body could not be read.
    #[error("body read error: {0}")]
    BodyRead(String),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A token could not be signed.
    #[error("token signing failed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// The test app could not be assembled.
    #[error("app setup failed: {0}")]
    Setup(String),
}
