//! Correlation ids.
//!
//! The stage assigns a UUID v7 to every request that gets past CORS,
//! records it on the context for the access log and returns it in
//! `x-request-id`.

use http::HeaderValue;
use roster_core::RequestId;

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};

/// Response (and, when trusted, request) header carrying the id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum IdSource {
    #[default]
    Generate,
    // A proxy in front of the service assigns ids.
    Header,
}

/// Assigns the request id.
#[derive(Debug, Clone, Default)]
pub struct RequestIdMiddleware {
    source: IdSource,
}

impl RequestIdMiddleware {
    /// Ignores client-supplied ids.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps an incoming `x-request-id` when it is a UUID.
    #[must_use]
    pub fn trust_incoming() -> Self {
        Self {
            source: IdSource::Header,
        }
    }

    fn assign(&self, request: &Request) -> RequestId {
        let forwarded = match self.source {
            IdSource::Generate => None,
            IdSource::Header => request
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<RequestId>().ok()),
        };
        forwarded.unwrap_or_default()
    }
}

impl Middleware for RequestIdMiddleware {
    fn name(&self) -> &'static str {
        "request_id"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        let id = self.assign(&request);
        ctx.set_request_id(id);

        Box::pin(async move {
            let mut response = next.run(ctx, request).await;
            // A UUID always renders as a valid header value.
            if let Ok(value) = HeaderValue::try_from(id.to_string()) {
                response.headers_mut().insert(REQUEST_ID_HEADER, value);
            }
            response
        })
    }
}
