//! Authentication middleware.
//!
//! The gate in front of every employee route. It validates the
//! `Authorization` header with a [`TokenValidator`] and either attaches the
//! identity to the context or short-circuits with a 401 `{message}` body.
//! Nothing after this stage runs for an unauthenticated request.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::token::TokenValidator;
use crate::types::{Request, Response, ResponseExt};
use http::header::AUTHORIZATION;
use roster_core::RosterError;
use std::sync::Arc;

/// Middleware that requires a valid bearer credential.
#[derive(Debug, Clone)]
pub struct AuthenticationMiddleware {
    validator: Arc<TokenValidator>,
}

impl AuthenticationMiddleware {
    /// Creates the stage around a shared validator.
    #[must_use]
    pub fn new(validator: Arc<TokenValidator>) -> Self {
        Self { validator }
    }

    fn reject(ctx: &mut MiddlewareContext, error: &RosterError) -> Response {
        tracing::debug!(
            request_id = %ctx.request_id(),
            error = %error,
            "request rejected by authentication"
        );
        ctx.fail();
        Response::from_error(error)
    }
}

impl Middleware for AuthenticationMiddleware {
    fn name(&self) -> &'static str {
        "authentication"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let identity = match self
                .validator
                .validate_header(request.headers().get(AUTHORIZATION))
            {
                Ok(identity) => identity,
                Err(error) => return Self::reject(ctx, &error),
            };

            if let Err(refused) = ctx.attach_identity(identity) {
                tracing::warn!(
                    request_id = %ctx.request_id(),
                    error = %refused,
                    "identity attach refused"
                );
            }

            next.run(ctx, request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{Request as HttpRequest, StatusCode};
    use http_body_util::{BodyExt, Full};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use roster_core::Phase;
    use std::sync::atomic::{AtomicBool, Ordering};

    const SECRET: &str = "auth-stage-secret";

    fn middleware() -> AuthenticationMiddleware {
        AuthenticationMiddleware::new(Arc::new(TokenValidator::new(SECRET)))
    }

    fn token() -> String {
        encode(
            &Header::default(),
            &serde_json::json!({"id": "u-1", "email": "a@example.com"}),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn request(authorization: Option<&str>) -> Request {
        let mut builder = HttpRequest::builder().uri("/api/employees");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Full::new(Bytes::new())).unwrap()
    }

    async fn body(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_valid_token_attaches_identity() {
        let mut ctx = MiddlewareContext::new();
        let next = Next::handler(|ctx, _req| {
            let id = ctx.identity().map(|i| i.id.clone()).unwrap_or_default();
            Box::pin(async move { Response::text(StatusCode::OK, id) })
        });

        let response = middleware()
            .process(&mut ctx, request(Some(&format!("Bearer {}", token()))), next)
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(response).await, "u-1");
        assert_eq!(ctx.phase(), Phase::Authenticated);
    }

    #[tokio::test]
    async fn test_missing_header_short_circuits() {
        let reached = Arc::new(AtomicBool::new(false));
        let flag = reached.clone();
        let mut ctx = MiddlewareContext::new();
        let next = Next::handler(move |_ctx, _req| {
            flag.store(true, Ordering::SeqCst);
            Box::pin(async { Response::text(StatusCode::OK, "") })
        });

        let response = middleware().process(&mut ctx, request(None), next).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body(response).await, r#"{"message":"No token, unauthorized"}"#);
        assert!(!reached.load(Ordering::SeqCst));
        assert!(ctx.identity().is_none());
        assert_eq!(ctx.phase(), Phase::Failed);
    }

    #[tokio::test]
    async fn test_bad_token_short_circuits() {
        let mut ctx = MiddlewareContext::new();
        let next = Next::handler(|_ctx, _req| panic!("handler must not run"));

        let response = middleware()
            .process(&mut ctx, request(Some("Bearer forged.token.value")), next)
            .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body(response).await, r#"{"message":"Invalid token"}"#);
    }
}
