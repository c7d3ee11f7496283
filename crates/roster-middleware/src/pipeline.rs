//! Ordered middleware pipeline.
//!
//! Stages run in the order they were added, then the handler runs. Every
//! stage sees the response on the way back out in reverse order.
//!
//! ## Standard Stages
//!
//! 1. **CORS** - Answer preflights, decorate responses
//! 2. **Request ID** - Assign a UUID v7 and echo it in `x-request-id`
//! 3. **Access Log** - One structured log line per request
//! 4. **Authentication** - Bearer token gate (protected routes only)

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};
use std::sync::Arc;

/// A type-erased middleware that can be stored in a vector.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// An immutable, ordered middleware chain.
///
/// # Example
///
/// ```
/// use roster_middleware::Pipeline;
/// use roster_middleware::stages::{AccessLogMiddleware, CorsMiddleware, RequestIdMiddleware};
///
/// let pipeline = Pipeline::builder()
///     .add_stage(CorsMiddleware::permissive())
///     .add_stage(RequestIdMiddleware::new())
///     .add_stage(AccessLogMiddleware::new())
///     .build();
///
/// assert_eq!(pipeline.stage_names(), vec!["cors", "request_id", "access_log"]);
/// ```
#[derive(Clone)]
pub struct Pipeline {
    stages: Vec<BoxedMiddleware>,
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Processes a request through every stage and then the handler.
    pub async fn process<H>(
        &self,
        mut ctx: MiddlewareContext,
        request: Request,
        handler: H,
    ) -> Response
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'static,
    {
        let next = self.build_chain(handler);
        next.run(&mut ctx, request).await
    }

    // Built back to front so the first stage added runs first.
    fn build_chain<'a, H>(&'a self, handler: H) -> Next<'a>
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        let mut next = Next::handler(handler);
        for middleware in self.stages.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }
        next
    }

    /// Returns the names of all stages in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|mw| mw.name()).collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

/// Builder for constructing a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<BoxedMiddleware>,
}

impl PipelineBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage.
    #[must_use]
    pub fn add_stage<M: Middleware>(mut self, middleware: M) -> Self {
        self.stages.push(Arc::new(middleware));
        self
    }

    /// Appends an already shared stage.
    #[must_use]
    pub fn add_shared_stage(mut self, middleware: BoxedMiddleware) -> Self {
        self.stages.push(middleware);
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: self.stages,
        }
    }
}

/// The standard stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Stage {
    /// Stage 1: CORS
    Cors = 1,
    /// Stage 2: Request ID assignment
    RequestId = 2,
    /// Stage 3: Access log
    AccessLog = 3,
    /// Stage 4: Bearer token authentication
    Authentication = 4,
}

impl Stage {
    /// Returns the stage name, matching [`Middleware::name`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Cors => "cors",
            Self::RequestId => "request_id",
            Self::AccessLog => "access_log",
            Self::Authentication => "authentication",
        }
    }

    /// Returns `true` if the stage only runs on protected routes.
    #[must_use]
    pub const fn is_protected_only(self) -> bool {
        matches!(self, Self::Authentication)
    }

    /// Returns all stages in order.
    #[must_use]
    pub const fn all() -> [Stage; 4] {
        [
            Self::Cors,
            Self::RequestId,
            Self::AccessLog,
            Self::Authentication,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResponseExt;
    use bytes::Bytes;
    use http::{Request as HttpRequest, StatusCode};
    use http_body_util::Full;
    use std::sync::Mutex;

    struct OrderTrackingMiddleware {
        name: &'static str,
        order: Arc<Mutex<Vec<String>>>,
    }

    impl Middleware for OrderTrackingMiddleware {
        fn name(&self) -> &'static str {
            self.name
        }

        fn process<'a>(
            &'a self,
            ctx: &'a mut MiddlewareContext,
            request: Request,
            next: Next<'a>,
        ) -> BoxFuture<'a, Response> {
            let order = self.order.clone();
            let name = self.name;

            Box::pin(async move {
                order.lock().unwrap().push(format!("enter:{name}"));
                let response = next.run(ctx, request).await;
                order.lock().unwrap().push(format!("exit:{name}"));
                response
            })
        }
    }

    fn request() -> Request {
        HttpRequest::builder()
            .uri("/test")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_pipeline_executes_in_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let tracker = |name| OrderTrackingMiddleware {
            name,
            order: order.clone(),
        };

        let pipeline = Pipeline::builder()
            .add_stage(tracker("first"))
            .add_stage(tracker("second"))
            .build();

        let handler_order = order.clone();
        let response = pipeline
            .process(MiddlewareContext::new(), request(), move |_ctx, _req| {
                handler_order.lock().unwrap().push("handler".to_string());
                Box::pin(async { Response::text(StatusCode::OK, "OK") })
            })
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            *order.lock().unwrap(),
            vec![
                "enter:first",
                "enter:second",
                "handler",
                "exit:second",
                "exit:first"
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_pipeline_runs_handler() {
        let pipeline = Pipeline::builder().build();
        assert_eq!(pipeline.stage_count(), 0);

        let response = pipeline
            .process(MiddlewareContext::new(), request(), |_ctx, _req| {
                Box::pin(async { Response::text(StatusCode::OK, "handler") })
            })
            .await;

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_stage_ordering() {
        assert!(Stage::Cors < Stage::RequestId);
        assert!(Stage::RequestId < Stage::AccessLog);
        assert!(Stage::AccessLog < Stage::Authentication);
    }

    #[test]
    fn test_only_authentication_is_protected_only() {
        let protected: Vec<_> = Stage::all()
            .into_iter()
            .filter(|s| s.is_protected_only())
            .collect();
        assert_eq!(protected, vec![Stage::Authentication]);
    }
}
