//! Cross-origin headers and preflight answers.
//!
//! This stage sits in front of every other stage. An `OPTIONS` request is
//! answered here with 204 and never reaches request ids, logging or token
//! checks. Other responses are decorated on the way out.
//!
//! [`AllowedOrigins::Any`] sends `Access-Control-Allow-Origin: *` on every
//! response, with or without an `Origin` header. A list echoes only the
//! origins it contains.
//!
//! ```
//! use roster_middleware::stages::CorsMiddleware;
//! use std::time::Duration;
//!
//! let cors = CorsMiddleware::builder()
//!     .allow_origin("https://hr.example.com")
//!     .max_age(Duration::from_secs(600))
//!     .build();
//! ```

use std::collections::BTreeSet;
use std::time::Duration;

use http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_EXPOSE_HEADERS, ACCESS_CONTROL_MAX_AGE, ACCESS_CONTROL_REQUEST_HEADERS, ORIGIN,
    VARY,
};
use http::{HeaderMap, HeaderValue, Method, StatusCode};

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::stages::REQUEST_ID_HEADER;
use crate::types::{Request, Response, ResponseExt};

const DEFAULT_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

const DEFAULT_METHODS: [Method; 6] = [
    Method::GET,
    Method::HEAD,
    Method::PUT,
    Method::PATCH,
    Method::POST,
    Method::DELETE,
];

/// Origins allowed to read responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    /// `*`.
    Any,
    /// Exact `scheme://host[:port]` matches.
    List(BTreeSet<String>),
}

impl AllowedOrigins {
    /// Reads configured origins; a `*` anywhere in the list wins.
    pub fn from_config<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let origins: BTreeSet<String> = origins.into_iter().map(Into::into).collect();
        if origins.contains("*") {
            Self::Any
        } else {
            Self::List(origins)
        }
    }

    /// Whether `origin` may read responses.
    pub fn is_allowed(&self, origin: &str) -> bool {
        match self {
            Self::Any => true,
            Self::List(origins) => origins.contains(origin),
        }
    }

    fn allow_origin(&self, origin: Option<&HeaderValue>) -> Option<HeaderValue> {
        match self {
            Self::Any => Some(HeaderValue::from_static("*")),
            Self::List(origins) => origin
                .filter(|o| o.to_str().is_ok_and(|o| origins.contains(o)))
                .cloned(),
        }
    }
}

/// Builder for [`CorsMiddleware`].
#[derive(Debug, Clone)]
pub struct CorsBuilder {
    origins: AllowedOrigins,
    methods: Vec<Method>,
    max_age: Duration,
}

impl Default for CorsBuilder {
    fn default() -> Self {
        Self {
            origins: AllowedOrigins::Any,
            methods: DEFAULT_METHODS.to_vec(),
            max_age: DEFAULT_MAX_AGE,
        }
    }
}

impl CorsBuilder {
    /// Any origin, the usual methods, one day of preflight caching.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the origin policy.
    #[must_use]
    pub fn allowed_origins(mut self, origins: AllowedOrigins) -> Self {
        self.origins = origins;
        self
    }

    /// Adds an origin. The first call turns `Any` into a list.
    #[must_use]
    pub fn allow_origin(mut self, origin: impl Into<String>) -> Self {
        match &mut self.origins {
            AllowedOrigins::List(origins) => {
                origins.insert(origin.into());
            }
            AllowedOrigins::Any => {
                self.origins = AllowedOrigins::List(BTreeSet::from([origin.into()]));
            }
        }
        self
    }

    /// Replaces the methods advertised to preflights.
    #[must_use]
    pub fn allow_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.methods = methods.into_iter().collect();
        self
    }

    /// How long browsers may cache a preflight answer.
    #[must_use]
    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Renders the header values once.
    #[must_use]
    pub fn build(self) -> CorsMiddleware {
        let methods: Vec<&str> = self.methods.iter().map(Method::as_str).collect();
        CorsMiddleware {
            origins: self.origins,
            // Method names and integers are always valid header values.
            allow_methods: HeaderValue::from_str(&methods.join(","))
                .unwrap_or_else(|_| HeaderValue::from_static("GET")),
            max_age: HeaderValue::from(self.max_age.as_secs()),
        }
    }
}

/// The CORS stage.
#[derive(Debug, Clone)]
pub struct CorsMiddleware {
    origins: AllowedOrigins,
    allow_methods: HeaderValue,
    max_age: HeaderValue,
}

impl CorsMiddleware {
    /// Starts from [`CorsBuilder::new`].
    #[must_use]
    pub fn builder() -> CorsBuilder {
        CorsBuilder::new()
    }

    /// The builder defaults as they are.
    #[must_use]
    pub fn permissive() -> Self {
        CorsBuilder::new().build()
    }

    fn preflight(&self, request: &Request) -> Response {
        let origin = request.headers().get(ORIGIN);
        let rejected = matches!(self.origins, AllowedOrigins::List(_))
            && origin.is_some_and(|o| self.origins.allow_origin(Some(o)).is_none());
        if rejected {
            return Response::message(StatusCode::FORBIDDEN, "Origin not allowed");
        }

        let mut response = Response::text(StatusCode::NO_CONTENT, "");
        let headers = response.headers_mut();
        headers.remove(http::header::CONTENT_TYPE);
        if let Some(value) = self.origins.allow_origin(origin) {
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, value);
        }
        headers.insert(ACCESS_CONTROL_ALLOW_METHODS, self.allow_methods.clone());
        if let Some(requested) = request.headers().get(ACCESS_CONTROL_REQUEST_HEADERS) {
            headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, requested.clone());
        }
        headers.insert(ACCESS_CONTROL_MAX_AGE, self.max_age.clone());
        headers.insert(
            VARY,
            HeaderValue::from_static("Origin, Access-Control-Request-Headers"),
        );
        response
    }

    fn decorate(&self, headers: &mut HeaderMap, origin: Option<&HeaderValue>) {
        if let Some(value) = self.origins.allow_origin(origin) {
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, value);
        }
        headers.insert(
            ACCESS_CONTROL_EXPOSE_HEADERS,
            HeaderValue::from_static(REQUEST_ID_HEADER),
        );
        if let AllowedOrigins::List(_) = self.origins {
            headers.insert(VARY, HeaderValue::from_static("Origin"));
        }
    }
}

impl Middleware for CorsMiddleware {
    fn name(&self) -> &'static str {
        "cors"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        if request.method() == Method::OPTIONS {
            let response = self.preflight(&request);
            return Box::pin(async move { response });
        }

        let origin = request.headers().get(ORIGIN).cloned();
        Box::pin(async move {
            let mut response = next.run(ctx, request).await;
            self.decorate(response.headers_mut(), origin.as_ref());
            response
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http_body_util::Full;

    const HR: &str = "https://hr.example.com";

    fn request(method: Method, origin: Option<&str>) -> Request {
        let mut builder = http::Request::builder().method(method).uri("/api/employees");
        if let Some(origin) = origin {
            builder = builder.header(ORIGIN, origin);
        }
        builder.body(Full::new(Bytes::new())).unwrap()
    }

    async fn run(cors: &CorsMiddleware, request: Request) -> Response {
        let next = Next::handler(|_, req: Request| {
            assert_ne!(req.method(), Method::OPTIONS, "preflight reached the handler");
            Box::pin(async { Response::text(StatusCode::OK, "OK") })
        });
        cors.process(&mut MiddlewareContext::new(), request, next).await
    }

    fn header<'r>(response: &'r Response, name: http::header::HeaderName) -> Option<&'r str> {
        response.headers().get(name).map(|v| v.to_str().unwrap())
    }

    #[tokio::test]
    async fn test_wildcard_even_without_origin() {
        let response = run(&CorsMiddleware::permissive(), request(Method::GET, None)).await;
        assert_eq!(header(&response, ACCESS_CONTROL_ALLOW_ORIGIN), Some("*"));
        assert_eq!(header(&response, ACCESS_CONTROL_EXPOSE_HEADERS), Some("x-request-id"));
        assert_eq!(header(&response, VARY), None);
    }

    #[tokio::test]
    async fn test_preflight() {
        let mut req = request(Method::OPTIONS, Some("https://app.example.com"));
        req.headers_mut().insert(
            ACCESS_CONTROL_REQUEST_HEADERS,
            HeaderValue::from_static("authorization, content-type"),
        );

        let response = run(&CorsMiddleware::permissive(), req).await;

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(header(&response, ACCESS_CONTROL_ALLOW_ORIGIN), Some("*"));
        assert_eq!(
            header(&response, ACCESS_CONTROL_ALLOW_HEADERS),
            Some("authorization, content-type")
        );
        assert_eq!(
            header(&response, ACCESS_CONTROL_ALLOW_METHODS),
            Some("GET,HEAD,PUT,PATCH,POST,DELETE")
        );
        assert_eq!(header(&response, ACCESS_CONTROL_MAX_AGE), Some("86400"));
    }

    #[tokio::test]
    async fn test_listed_origin() {
        let cors = CorsMiddleware::builder().allow_origin(HR).build();

        let allowed = run(&cors, request(Method::GET, Some(HR))).await;
        assert_eq!(header(&allowed, ACCESS_CONTROL_ALLOW_ORIGIN), Some(HR));
        assert_eq!(header(&allowed, VARY), Some("Origin"));

        let other = run(&cors, request(Method::GET, Some("https://evil.example.com"))).await;
        assert_eq!(other.status(), StatusCode::OK);
        assert_eq!(header(&other, ACCESS_CONTROL_ALLOW_ORIGIN), None);
    }

    #[tokio::test]
    async fn test_unlisted_preflight_is_forbidden() {
        let cors = CorsMiddleware::builder()
            .allow_origin(HR)
            .max_age(Duration::from_secs(60))
            .build();

        let response = run(&cors, request(Method::OPTIONS, Some("https://evil.example.com"))).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = run(&cors, request(Method::OPTIONS, Some(HR))).await;
        assert_eq!(header(&response, ACCESS_CONTROL_MAX_AGE), Some("60"));
    }

    #[test]
    fn test_star_in_config_means_any() {
        assert_eq!(AllowedOrigins::from_config(["*", HR]), AllowedOrigins::Any);
        let list = AllowedOrigins::from_config([HR]);
        assert!(list.is_allowed(HR));
        assert!(!list.is_allowed("https://a.example"));
    }
}
