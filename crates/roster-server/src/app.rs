//! The service as a plain `Request -> Response` function.
//!
//! [`App`] owns the route table, the two middleware pipelines and the
//! handlers. The HTTP server feeds it buffered requests; tests can call
//! [`App::handle`] directly without a socket.
//!
//! ```text
//! public:    cors -> request_id -> access_log -> handler
//! protected: cors -> request_id -> access_log -> authentication -> handler
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use roster_config::RosterConfig;
use roster_core::{Phase, RequestContext};
use roster_extract::{ExtractionContext, PayloadConfig};
use roster_middleware::stages::{
    AccessLogMiddleware, AllowedOrigins, AuthenticationMiddleware, CorsMiddleware,
    RequestIdMiddleware,
};
use roster_middleware::{
    BoxedMiddleware, MiddlewareContext, Pipeline, Request, Response, ResponseExt, TokenValidator,
};
use roster_store::{AttachmentStore, EmployeeRepository, EmployeeStore};

use crate::employees::EmployeeService;
use crate::health::{HealthCheck, ReadinessCheck};
use crate::router::{Operation, RouteMatch, Router};
use crate::uploads::UploadFiles;
use crate::ServerError;

/// Text served at `GET /`.
pub const ROOT_MESSAGE: &str = "API is running";

const NOT_FOUND: &str = "Not found";

struct AppState {
    employees: EmployeeService,
    uploads: UploadFiles,
    health: HealthCheck,
    readiness: ReadinessCheck,
}

/// Why the server could not buffer a request body.
///
/// The server does not answer these itself. It forwards the request with an
/// empty body and this marker in its extensions, so CORS, the request id
/// and the token gate still run first. A request without a valid token gets
/// 401 no matter how large its body was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFailure {
    /// The body went over the configured limit.
    TooLarge {
        /// The limit in bytes.
        limit: usize,
    },
    /// The body did not arrive within the request timeout.
    TimedOut,
    /// The connection failed while the body was read.
    Unreadable,
}

impl BodyFailure {
    /// The response sent once the request reached its handler.
    #[must_use]
    pub fn response(self) -> Response {
        match self {
            Self::TooLarge { .. } => {
                Response::message(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large")
            }
            Self::TimedOut => Response::message(StatusCode::REQUEST_TIMEOUT, "Request timed out"),
            Self::Unreadable => {
                Response::message(StatusCode::BAD_REQUEST, "Failed to read request body")
            }
        }
    }
}

/// The assembled service.
#[derive(Clone)]
pub struct App {
    router: Arc<Router>,
    public: Pipeline,
    protected: Pipeline,
    state: Arc<AppState>,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("router", &self.router)
            .field("public", &self.public)
            .field("protected", &self.protected)
            .finish_non_exhaustive()
    }
}

impl App {
    /// Starts an [`AppBuilder`].
    #[must_use]
    pub fn builder() -> AppBuilder {
        AppBuilder::default()
    }

    /// Returns the readiness probe shared with the server.
    #[must_use]
    pub fn readiness(&self) -> &ReadinessCheck {
        &self.state.readiness
    }

    /// Returns the stage names of the pipeline used for `operation`.
    #[must_use]
    pub fn stage_names(&self, operation: Operation) -> Vec<&'static str> {
        self.pipeline_for(Some(operation)).stage_names()
    }

    fn pipeline_for(&self, operation: Option<Operation>) -> &Pipeline {
        match operation {
            Some(operation) if operation.is_protected() => &self.protected,
            _ => &self.public,
        }
    }

    /// Runs one buffered request through routing, middleware and handler.
    pub async fn handle(&self, request: Request) -> Response {
        let route = self
            .router
            .match_route(request.method(), request.uri().path());
        let operation = route.as_ref().map(RouteMatch::operation);

        let mut ctx = MiddlewareContext::new();
        if let Some(operation) = operation {
            ctx.set_operation_id(operation.id());
        }

        let state = Arc::clone(&self.state);
        self.pipeline_for(operation)
            .process(ctx, request, move |ctx, request| {
                let request_ctx = ctx.to_request_context();
                let phase = ctx.phase();
                Box::pin(async move { dispatch(&state, route, request_ctx, phase, request).await })
            })
            .await
    }
}

async fn dispatch(
    state: &AppState,
    route: Option<RouteMatch>,
    ctx: RequestContext,
    phase: Phase,
    request: Request,
) -> Response {
    let Some(route) = route else {
        return Response::message(StatusCode::NOT_FOUND, NOT_FOUND);
    };
    if let Some(failure) = request.extensions().get::<BodyFailure>() {
        tracing::debug!(
            request_id = %ctx.request_id(),
            failure = ?failure,
            "request body rejected"
        );
        return failure.response();
    }

    match route.operation() {
        Operation::Root => Response::text(StatusCode::OK, ROOT_MESSAGE),
        Operation::Health => Response::json(StatusCode::OK, &state.health.status()),
        Operation::Ready => {
            let status = state.readiness.status();
            let code = if status.ready {
                StatusCode::OK
            } else {
                StatusCode::SERVICE_UNAVAILABLE
            };
            Response::json(code, &status)
        }
        Operation::ServeUpload => {
            let file = route.param("file").unwrap_or_default();
            state
                .uploads
                .serve(file, request.method(), request.headers())
                .await
        }
        operation => {
            let (parts, body) = request.into_parts();
            let extraction = ExtractionContext::from_parts(&parts, collect(body).await);
            state
                .employees
                .handle(operation, route.param("id"), ctx, phase, extraction)
                .await
        }
    }
}

async fn collect(body: Full<Bytes>) -> Bytes {
    match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(never) => match never {},
    }
}

/// Assembles an [`App`].
///
/// The employee store, the attachment store and the token validator are
/// required. Everything else has a default.
#[derive(Default)]
pub struct AppBuilder {
    store: Option<Arc<dyn EmployeeStore>>,
    attachments: Option<Arc<dyn AttachmentStore>>,
    upload_root: Option<PathBuf>,
    validator: Option<Arc<TokenValidator>>,
    cors: Option<CorsMiddleware>,
    payload: PayloadConfig,
    service: Option<(String, String)>,
    readiness: ReadinessCheck,
    record_access: bool,
}

impl AppBuilder {
    /// Applies the auth, storage and CORS sections of a loaded config.
    ///
    /// Sets the validator, the upload root used for serving, the payload
    /// limits and CORS. Stores still have to be supplied.
    #[must_use]
    pub fn config(mut self, config: &RosterConfig) -> Self {
        let validator = TokenValidator::new(config.auth.jwt_secret.as_bytes())
            .with_leeway(config.auth.leeway_secs);
        self.validator = Some(Arc::new(validator));
        self.upload_root = Some(config.storage.upload_dir.clone());
        self.payload = PayloadConfig::new(
            config.server.max_body_bytes,
            config.storage.max_file_bytes,
            config.storage.max_fields,
        );
        self.cors = Some(
            CorsMiddleware::builder()
                .allowed_origins(AllowedOrigins::from_config(&config.cors.allowed_origins))
                .max_age(std::time::Duration::from_secs(config.cors.max_age_secs))
                .build(),
        );
        self
    }

    /// Sets the employee store.
    #[must_use]
    pub fn employee_store(mut self, store: Arc<dyn EmployeeStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the attachment store.
    #[must_use]
    pub fn attachment_store(mut self, attachments: Arc<dyn AttachmentStore>) -> Self {
        self.attachments = Some(attachments);
        self
    }

    /// Sets the directory `/uploads/{file}` serves from.
    #[must_use]
    pub fn upload_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.upload_root = Some(root.into());
        self
    }

    /// Sets the token validator.
    #[must_use]
    pub fn validator(mut self, validator: TokenValidator) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Replaces the CORS stage.
    #[must_use]
    pub fn cors(mut self, cors: CorsMiddleware) -> Self {
        self.cors = Some(cors);
        self
    }

    /// Sets the payload limits.
    #[must_use]
    pub fn payload(mut self, payload: PayloadConfig) -> Self {
        self.payload = payload;
        self
    }

    /// Sets the name and version reported by `/health`.
    #[must_use]
    pub fn service(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.service = Some((name.into(), version.into()));
        self
    }

    /// Sets the readiness probe, e.g. one with extra named checks.
    #[must_use]
    pub fn readiness(mut self, readiness: ReadinessCheck) -> Self {
        self.readiness = readiness;
        self
    }

    /// Makes the access log stage keep an
    /// [`AccessRecord`](roster_middleware::stages::AccessRecord) per request.
    #[must_use]
    pub fn record_access(mut self, enabled: bool) -> Self {
        self.record_access = enabled;
        self
    }

    /// Builds the app.
    pub fn build(self) -> Result<App, ServerError> {
        let store = self
            .store
            .ok_or(ServerError::MissingComponent("employee store"))?;
        let attachments = self
            .attachments
            .ok_or(ServerError::MissingComponent("attachment store"))?;
        let upload_root = self
            .upload_root
            .ok_or(ServerError::MissingComponent("upload root"))?;
        let validator = self
            .validator
            .ok_or(ServerError::MissingComponent("token validator"))?;

        let cors: BoxedMiddleware = Arc::new(self.cors.unwrap_or_else(CorsMiddleware::permissive));
        let request_id: BoxedMiddleware = Arc::new(RequestIdMiddleware::new());
        let access_log: BoxedMiddleware = Arc::new(if self.record_access {
            AccessLogMiddleware::recording()
        } else {
            AccessLogMiddleware::new()
        });

        let public = Pipeline::builder()
            .add_shared_stage(Arc::clone(&cors))
            .add_shared_stage(Arc::clone(&request_id))
            .add_shared_stage(Arc::clone(&access_log))
            .build();
        let protected = Pipeline::builder()
            .add_shared_stage(cors)
            .add_shared_stage(request_id)
            .add_shared_stage(access_log)
            .add_stage(AuthenticationMiddleware::new(validator))
            .build();

        let (name, version) = self
            .service
            .unwrap_or_else(|| ("roster".to_string(), env!("CARGO_PKG_VERSION").to_string()));

        let state = AppState {
            employees: EmployeeService {
                repository: EmployeeRepository::new(store),
                attachments,
                payload: self.payload,
            },
            uploads: UploadFiles::new(upload_root),
            health: HealthCheck::new(name, version),
            readiness: self.readiness,
        };

        Ok(App {
            router: Arc::new(Router::roster()),
            public,
            protected,
            state: Arc::new(state),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{header, Method};
    use roster_middleware::stages::REQUEST_ID_HEADER;
    use roster_store::{DiskAttachmentStore, InMemoryEmployeeStore};
    use serde_json::Value;

    const SECRET: &str = "app-test-secret";

    fn app(root: &std::path::Path) -> App {
        App::builder()
            .employee_store(Arc::new(InMemoryEmployeeStore::new()))
            .attachment_store(Arc::new(DiskAttachmentStore::new(root)))
            .upload_root(root)
            .validator(TokenValidator::new(SECRET))
            .build()
            .unwrap()
    }

    fn request(method: Method, uri: &str) -> Request {
        http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    async fn body(response: Response) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_root() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(dir.path()).handle(request(Method::GET, "/")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
        assert_eq!(body(response).await.as_ref(), ROOT_MESSAGE.as_bytes());
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(dir.path()).handle(request(Method::GET, "/nope")).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json: Value = serde_json::from_slice(&body(response).await).unwrap();
        assert_eq!(json["message"], "Not found");
    }

    #[tokio::test]
    async fn test_protected_route_requires_token() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(dir.path())
            .handle(request(Method::GET, "/api/employees"))
            .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
        assert!(response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    #[tokio::test]
    async fn test_preflight_skips_authentication() {
        let dir = tempfile::tempdir().unwrap();
        let mut preflight = request(Method::OPTIONS, "/api/employees");
        preflight
            .headers_mut()
            .insert(header::ORIGIN, "https://hr.example.com".parse().unwrap());
        preflight.headers_mut().insert(
            header::ACCESS_CONTROL_REQUEST_METHOD,
            "POST".parse().unwrap(),
        );

        let response = app(dir.path()).handle(preflight).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        // Answered before the request id is assigned.
        assert!(!response.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn test_body_failure_answers_after_authentication() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());

        let mut anonymous = request(Method::POST, "/api/employees");
        anonymous
            .extensions_mut()
            .insert(BodyFailure::TooLarge { limit: 8 });
        let response = app.handle(anonymous).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let mut public = request(Method::GET, "/");
        public.extensions_mut().insert(BodyFailure::TimedOut);
        let response = app.handle(public).await;
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn test_ready_follows_switch() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        assert_eq!(
            app.handle(request(Method::GET, "/ready")).await.status(),
            StatusCode::OK
        );

        app.readiness().set_ready(false);
        assert_eq!(
            app.handle(request(Method::GET, "/ready")).await.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_pipelines() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        assert_eq!(
            app.stage_names(Operation::Root),
            vec!["cors", "request_id", "access_log"]
        );
        assert_eq!(
            app.stage_names(Operation::CreateEmployee),
            vec!["cors", "request_id", "access_log", "authentication"]
        );
    }

    #[test]
    fn test_missing_components() {
        let err = App::builder().build().unwrap_err();
        assert!(matches!(err, ServerError::MissingComponent("employee store")));
    }
}
