//! # Roster Extract
//!
//! Request extraction for the roster employee service.
//!
//! Handlers work on a buffered request wrapped in an [`ExtractionContext`].
//! Two extractions cover every employee operation:
//!
//! | Extractor | Source | Used by |
//! |-----------|--------|---------|
//! | [`Query<Filter>`](Query) | Query string | list employees |
//! | [`MutationPayload`] | Request body | create and update |
//!
//! ## Example
//!
//! ```rust
//! use roster_extract::{ExtractionContext, MutationPayload, PayloadConfig};
//! use http::{header, HeaderMap, Method, Uri};
//! use bytes::Bytes;
//!
//! # tokio_test::block_on(async {
//! let mut headers = HeaderMap::new();
//! headers.insert(header::CONTENT_TYPE, "application/json".parse().unwrap());
//! let ctx = ExtractionContext::new(
//!     Method::POST,
//!     Uri::from_static("/api/employees"),
//!     headers,
//!     Bytes::from_static(br#"{"name":"Ada","_id":"ignored"}"#),
//! );
//!
//! let payload = MutationPayload::extract(&ctx, &PayloadConfig::default()).await.unwrap();
//! assert!(payload.fields.contains("name"));
//! assert!(!payload.fields.contains("_id"));
//! # });
//! ```
//!
//! ## Error Handling
//!
//! Every failure is an [`ExtractionError`]. Oversized payloads map to
//! 413, everything else to 400.
//!
//! ```rust
//! use roster_extract::{ExtractionError, ExtractionSource};
//!
//! let err = ExtractionError::invalid_type(
//!     ExtractionSource::Body,
//!     "body",
//!     "expected a JSON object",
//! );
//! assert_eq!(err.status_code(), http::StatusCode::BAD_REQUEST);
//! ```

#![doc(html_root_url = "https://docs.rs/roster-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
mod extractor;
pub mod multipart;
mod payload;
mod query;

pub use context::ExtractionContext;
pub use error::{ExtractionError, ExtractionSource};
pub use extractor::FromRequest;
pub use multipart::{FormLimits, FormPart, FormReader, UploadedFile};
pub use payload::{MutationPayload, PayloadConfig};
pub use query::Query;
