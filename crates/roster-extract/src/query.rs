//! Query string extractor.
//!
//! The [`Query`] extractor deserializes URL query parameters into a typed
//! struct. For the employee list it yields a [`Filter`]: only `department`
//! and `position` are read, other keys are ignored, and empty values are
//! treated as "no constraint".

use crate::{ExtractionContext, ExtractionError, ExtractionSource, FromRequest};
use roster_core::Filter;
use serde::de::DeserializeOwned;
use std::ops::Deref;

/// Extractor for URL query string parameters.
///
/// # Example
///
/// ```rust
/// use roster_extract::{ExtractionContext, FromRequest, Query};
/// use roster_core::Filter;
/// use http::{HeaderMap, Method, Uri};
/// use bytes::Bytes;
///
/// let ctx = ExtractionContext::new(
///     Method::GET,
///     Uri::from_static("/api/employees?department=eng&position="),
///     HeaderMap::new(),
///     Bytes::new(),
/// );
///
/// let Query(filter) = Query::<Filter>::from_request(&ctx).unwrap();
/// assert_eq!(filter.department.as_deref(), Some("eng"));
/// assert_eq!(filter.position, None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query<T>(pub T);

impl<T> Query<T> {
    /// Consumes the Query and returns the inner value.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Query<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

fn parse<T: DeserializeOwned>(ctx: &ExtractionContext) -> Result<T, ExtractionError> {
    let query_string = ctx.query_string().unwrap_or("");
    serde_urlencoded::from_str(query_string)
        .map_err(|e| ExtractionError::deserialization_failed(ExtractionSource::Query, e.to_string()))
}

impl FromRequest for Query<Filter> {
    fn from_request(ctx: &ExtractionContext) -> Result<Self, ExtractionError> {
        parse::<Filter>(ctx).map(|filter| Query(filter.normalized()))
    }
}

impl FromRequest for Query<Vec<(String, String)>> {
    fn from_request(ctx: &ExtractionContext) -> Result<Self, ExtractionError> {
        parse(ctx).map(Query)
    }
}
