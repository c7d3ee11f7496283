//! The buffered request seen by extractors.

use bytes::Bytes;
use http::request::Parts;
use http::{header, HeaderMap, Method, Uri};

/// Method, URI, headers and the fully collected body of one request.
///
/// ```rust
/// use bytes::Bytes;
/// use http::{HeaderMap, Method, Uri};
/// use roster_extract::ExtractionContext;
///
/// let ctx = ExtractionContext::new(
///     Method::GET,
///     Uri::from_static("/api/employees?department=eng"),
///     HeaderMap::new(),
///     Bytes::new(),
/// );
/// assert_eq!(ctx.query_string(), Some("department=eng"));
/// assert!(ctx.mime().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct ExtractionContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
}

impl ExtractionContext {
    /// Wraps an already split request.
    #[must_use]
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            method,
            uri,
            headers,
            body,
        }
    }

    /// Copies what extractors need out of the request head.
    #[must_use]
    pub fn from_parts(parts: &Parts, body: Bytes) -> Self {
        let Parts {
            method,
            uri,
            headers,
            ..
        } = parts;
        Self::new(method.clone(), uri.clone(), headers.clone(), body)
    }

    /// HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Raw query, without the `?`.
    #[must_use]
    pub fn query_string(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Collected body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The Content-Type header when it is visible ASCII.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        let value = self.headers.get(header::CONTENT_TYPE)?;
        value.to_str().ok()
    }

    /// Parsed Content-Type; compare on `type_()` and `subtype()` to ignore
    /// parameters such as `charset` or `boundary`.
    #[must_use]
    pub fn mime(&self) -> Option<mime::Mime> {
        self.content_type()?.parse().ok()
    }
}
