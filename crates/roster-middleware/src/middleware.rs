//! Core middleware trait and types.
//!
//! Every pipeline stage implements [`Middleware`]. A stage receives the
//! mutable context, the request, and a [`Next`] it calls at most once to
//! continue the chain. Not calling it short-circuits the request.

use crate::context::MiddlewareContext;
use crate::types::{Request, Response};
use std::future::Future;
use std::pin::Pin;

/// A boxed future that returns a response.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Terminal handler invoked after the last stage.
///
/// The returned future is `'static`, so the handler copies what it needs out
/// of the context before going async.
pub type HandlerFn<'a> =
    Box<dyn FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'a>;

/// The core middleware trait.
///
/// # Invariants
///
/// - A stage calls `next.run()` at most once
/// - A stage that short-circuits returns its own complete response
/// - Stages never reorder the pipeline
///
/// # Example
///
/// ```
/// use roster_middleware::{BoxFuture, Middleware, MiddlewareContext, Next, Request, Response};
///
/// struct Noop;
///
/// impl Middleware for Noop {
///     fn name(&self) -> &'static str {
///         "noop"
///     }
///
///     fn process<'a>(
///         &'a self,
///         ctx: &'a mut MiddlewareContext,
///         request: Request,
///         next: Next<'a>,
///     ) -> BoxFuture<'a, Response> {
///         Box::pin(async move { next.run(ctx, request).await })
///     }
/// }
/// ```
pub trait Middleware: Send + Sync + 'static {
    /// Returns the unique name of this stage, used in logs.
    fn name(&self) -> &'static str;

    /// Process the request through this stage.
    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response>;
}

/// Callback to invoke the next stage in the chain.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    Handler(HandlerFn<'a>),
}

impl<'a> Next<'a> {
    /// Creates a `Next` that will invoke the given stage.
    pub(crate) fn new(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// Creates a terminal `Next` that invokes the handler.
    pub fn handler<F>(f: F) -> Self
    where
        F: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        Self {
            inner: NextInner::Handler(Box::new(f)),
        }
    }

    /// Invokes the next stage or the handler.
    ///
    /// Consumes `self` so it can only be called once.
    pub async fn run(self, ctx: &mut MiddlewareContext, request: Request) -> Response {
        match self.inner {
            NextInner::Chain { middleware, next } => middleware.process(ctx, request, *next).await,
            NextInner::Handler(handler) => handler(ctx, request).await,
        }
    }
}
