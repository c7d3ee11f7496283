//! Access log middleware.
//!
//! Emits one `info` event per request once the response is known:
//!
//! ```text
//! request_id  http.method  http.path  http.status_code  duration_ms  user_id
//! ```
//!
//! `user_id` is only present when authentication passed. The credential
//! itself is never logged.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};
use std::time::Instant;

/// One completed request, as recorded by [`AccessLogMiddleware`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRecord {
    /// HTTP method.
    pub method: String,
    /// Request path, without the query string.
    pub path: String,
    /// Response status code.
    pub status_code: u16,
    /// Authenticated user id, if any.
    pub user_id: Option<String>,
}

/// Middleware that logs every request/response pair.
#[derive(Debug, Clone, Default)]
pub struct AccessLogMiddleware {
    record_in_context: bool,
}

impl AccessLogMiddleware {
    /// Creates the access log stage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Also stores an [`AccessRecord`] in the context after each request.
    #[must_use]
    pub fn recording() -> Self {
        Self {
            record_in_context: true,
        }
    }
}

impl Middleware for AccessLogMiddleware {
    fn name(&self) -> &'static str {
        "access_log"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let start = Instant::now();
            let method = request.method().to_string();
            let path = request.uri().path().to_string();

            let response = next.run(ctx, request).await;

            let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
            let status_code = response.status().as_u16();
            let user_id = ctx.identity().map(|i| i.id.clone());

            tracing::info!(
                request_id = %ctx.request_id(),
                http.method = %method,
                http.path = %path,
                http.status_code = status_code,
                duration_ms = duration_ms,
                user_id = user_id.as_deref(),
                "request completed"
            );

            if self.record_in_context {
                ctx.set_extension(AccessRecord {
                    method,
                    path,
                    status_code,
                    user_id,
                });
            }

            response
        })
    }
}
