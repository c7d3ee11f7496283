//! Extraction failures.
//!
//! All of them are the client's fault. [`ExtractionError::TooLarge`] is a
//! 413; the rest are 400 and their `Display` text is safe to send back.

use std::fmt;

use http::StatusCode;
use roster_core::RosterError;
use thiserror::Error;

/// The part of the request being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSource {
    /// The query string.
    Query,
    /// JSON, urlencoded or multipart body.
    Body,
    /// The Content-Type header.
    ContentType,
}

impl ExtractionSource {
    fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Body => "body",
            Self::ContentType => "content-type",
        }
    }
}

impl fmt::Display for ExtractionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request that could not be turned into handler input.
///
/// ```rust
/// use http::StatusCode;
/// use roster_extract::{ExtractionError, ExtractionSource};
///
/// let err = ExtractionError::validation_failed(
///     ExtractionSource::Body,
///     "profileImage",
///     "only one file is allowed",
/// );
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
/// assert_eq!(err.field(), Some("profileImage"));
/// ```
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// A named value has the wrong shape or breaks a rule.
    #[error("invalid {at} field '{field}': {reason}")]
    Invalid {
        /// Where the field was read from.
        at: ExtractionSource,
        /// Field name.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The input did not parse at all.
    #[error("malformed {at}: {detail}")]
    Malformed {
        /// What was being parsed.
        at: ExtractionSource,
        /// Parser message.
        detail: String,
    },

    /// A body or file part over its limit.
    #[error("payload too large: max {limit} bytes, got {actual} bytes")]
    TooLarge {
        /// Limit in bytes.
        limit: usize,
        /// Received size in bytes.
        actual: usize,
    },

    /// A body with a Content-Type other than JSON, urlencoded or multipart.
    #[error("unsupported content type '{content_type}': expected JSON, urlencoded or multipart form data")]
    UnsupportedMediaType {
        /// The header as sent, or `none`.
        content_type: String,
    },
}

impl ExtractionError {
    /// A field with a bad value.
    #[must_use]
    pub fn invalid_type(
        at: ExtractionSource,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Invalid {
            at,
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Same shape as [`invalid_type`](Self::invalid_type); used for rules
    /// across parts, such as a second attachment.
    #[must_use]
    pub fn validation_failed(
        at: ExtractionSource,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::invalid_type(at, field, reason)
    }

    /// Input that did not parse.
    #[must_use]
    pub fn deserialization_failed(at: ExtractionSource, detail: impl Into<String>) -> Self {
        Self::Malformed {
            at,
            detail: detail.into(),
        }
    }

    /// A size limit was exceeded.
    #[must_use]
    pub fn payload_too_large(limit: usize, actual: usize) -> Self {
        Self::TooLarge { limit, actual }
    }

    /// A body in a format this service does not read.
    #[must_use]
    pub fn unsupported_media_type(content_type: Option<&str>) -> Self {
        Self::UnsupportedMediaType {
            content_type: content_type.unwrap_or("none").to_owned(),
        }
    }

    /// Which part of the request failed.
    #[must_use]
    pub fn extraction_source(&self) -> ExtractionSource {
        match self {
            Self::Invalid { at, .. } | Self::Malformed { at, .. } => *at,
            Self::TooLarge { .. } => ExtractionSource::Body,
            Self::UnsupportedMediaType { .. } => ExtractionSource::ContentType,
        }
    }

    /// The offending field, for [`ExtractionError::Invalid`].
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Invalid { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Whether this maps to 413.
    #[must_use]
    pub fn is_payload_too_large(&self) -> bool {
        matches!(self, Self::TooLarge { .. })
    }

    /// HTTP status for the response.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        if self.is_payload_too_large() {
            StatusCode::PAYLOAD_TOO_LARGE
        } else {
            StatusCode::BAD_REQUEST
        }
    }
}

impl From<ExtractionError> for RosterError {
    fn from(error: ExtractionError) -> Self {
        RosterError::validation(error.to_string())
    }
}
