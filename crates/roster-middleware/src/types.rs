//! Common types used throughout the middleware pipeline.

use bytes::Bytes;
use http::{header, StatusCode};
use http_body_util::Full;
use roster_core::{ErrorBody, RosterError};
use serde::Serialize;

/// The HTTP request type used in the middleware pipeline.
///
/// This is a standard `http::Request` with a `Full<Bytes>` body.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type used in the middleware pipeline.
///
/// This is a standard `http::Response` with a `Full<Bytes>` body.
pub type Response = http::Response<Full<Bytes>>;

/// Extension trait for building responses.
///
/// None of these panic: if the builder rejects a part, a bare response with
/// the same status is returned instead.
pub trait ResponseExt {
    /// Creates a `text/plain` response.
    fn text(status: StatusCode, body: impl Into<String>) -> Response;

    /// Creates an `application/json` response from any serializable value.
    fn json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Response;

    /// Creates a `{"message": "..."}` JSON response.
    fn message(status: StatusCode, message: &str) -> Response;

    /// Renders a [`RosterError`] with its status and client-safe message.
    fn from_error(error: &RosterError) -> Response;
}

impl ResponseExt for Response {
    fn text(status: StatusCode, body: impl Into<String>) -> Response {
        build(status, "text/plain; charset=utf-8", Bytes::from(body.into()))
    }

    fn json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Response {
        match serde_json::to_vec(value) {
            Ok(body) => build(status, "application/json", Bytes::from(body)),
            Err(error) => {
                tracing::error!(error = %error, "failed to serialize response body");
                bare(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    fn message(status: StatusCode, message: &str) -> Response {
        Self::json(status, &ErrorBody::new(message))
    }

    fn from_error(error: &RosterError) -> Response {
        Self::json(error.status_code(), &error.to_body())
    }
}

fn build(status: StatusCode, content_type: &'static str, body: Bytes) -> Response {
    http::Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, content_type)
        .body(Full::new(body))
        .unwrap_or_else(|_| bare(status))
}

fn bare(status: StatusCode) -> Response {
    let mut response = http::Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}
