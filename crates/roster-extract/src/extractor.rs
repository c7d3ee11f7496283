//! Extraction from a request whose body has already been buffered.
//!
//! Create and update payloads may be multipart and are read asynchronously
//! by [`MutationPayload::extract`](crate::MutationPayload::extract) instead.

use crate::{ExtractionContext, ExtractionError};

/// A value parsed out of an [`ExtractionContext`].
pub trait FromRequest: Sized {
    /// Parses `Self` from the request.
    fn from_request(ctx: &ExtractionContext) -> Result<Self, ExtractionError>;
}
