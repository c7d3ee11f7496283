//! HTTP/1 server around an [`App`].
//!
//! Each connection runs on its own task. A request body is collected under
//! the body limit and the request timeout, then the buffered request goes to
//! [`App::handle`] on a task of its own. A body that could not be collected
//! travels as a [`BodyFailure`] marker, so the middleware stages still see
//! the request and the token gate answers before the size check does.
//!
//! Reads (`GET`, `HEAD`, `OPTIONS`) are cut off with 504 once the request
//! timeout passes. Writes always run to completion, even when the client
//! has gone away.
//!
//! ```rust,no_run
//! use roster_server::{App, Server, ServerConfig, ShutdownSignal};
//!
//! # async fn run(app: App) -> Result<(), roster_server::ServerError> {
//! let server = Server::new(ServerConfig::default(), app);
//! server.run_with_shutdown(ShutdownSignal::with_os_signals()).await
//! # }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::{Request, StatusCode};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use roster_middleware::{Response, ResponseExt};
use tokio::net::{TcpListener, TcpStream};

use crate::app::{App, BodyFailure};
use crate::config::ServerConfig;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};
use crate::ServerError;

/// The listening server.
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    app: App,
}

impl Server {
    /// Creates a server for `app`.
    #[must_use]
    pub fn new(config: ServerConfig, app: App) -> Self {
        Self { config, app }
    }

    /// Returns the listener settings.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Runs until SIGTERM or SIGINT.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Binds the configured address and serves until `shutdown` fires.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = self.config.socket_addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::bind(addr, e))?;
        self.serve(listener, shutdown).await
    }

    /// Serves on an already bound listener.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), ServerError> {
        match listener.local_addr() {
            Ok(local) => tracing::info!(addr = %local, "server listening"),
            Err(error) => tracing::warn!(error = %error, "server listening on unknown address"),
        }

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote_addr)) => {
                        let server = Arc::clone(&server);
                        let token = tracker.acquire();
                        let shutdown = shutdown.clone();

                        tokio::spawn(async move {
                            if let Err(error) = server.handle_connection(stream, remote_addr, shutdown).await {
                                tracing::debug!(remote_addr = %remote_addr, error = %error, "connection error");
                            }
                            drop(token);
                        });
                    }
                    Err(error) => tracing::error!(error = %error, "failed to accept connection"),
                },
                () = shutdown.recv() => {
                    tracing::info!("shutdown signal received, no longer accepting");
                    break;
                }
            }
        }

        server.app.readiness().set_ready(false);

        let timeout = server.config.shutdown_timeout();
        tracing::info!(
            timeout_secs = timeout.as_secs(),
            active_connections = tracker.active_connections(),
            "waiting for connections to close"
        );

        tokio::select! {
            () = tracker.wait_for_drain() => tracing::info!("all connections closed"),
            () = tokio::time::sleep(timeout) => tracing::warn!(
                active_connections = tracker.active_connections(),
                "shutdown timeout reached"
            ),
        }

        tracing::info!("server stopped");
        Ok(())
    }

    async fn handle_connection(
        self: &Arc<Self>,
        stream: TcpStream,
        remote_addr: SocketAddr,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let io = TokioIo::new(stream);
        let server = Arc::clone(self);

        let service = service_fn(move |request: Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.handle_request(request).await) }
        });

        let connection = http1::Builder::new().serve_connection(io, service);
        tokio::pin!(connection);

        tokio::select! {
            result = connection.as_mut() => result,
            () = shutdown.recv() => {
                tracing::debug!(remote_addr = %remote_addr, "closing connection for shutdown");
                connection.as_mut().graceful_shutdown();
                connection.await
            }
        }
    }

    async fn handle_request(&self, request: Request<Incoming>) -> Response {
        let timeout = self.config.request_timeout();
        let (parts, body) = request.into_parts();

        let limit = self.config.max_body_bytes();
        let collect = Limited::new(body, limit).collect();
        let (body, failure) = match tokio::time::timeout(timeout, collect).await {
            Ok(Ok(collected)) => (collected.to_bytes(), None),
            Ok(Err(error)) if error.downcast_ref::<LengthLimitError>().is_some() => {
                (Bytes::new(), Some(BodyFailure::TooLarge { limit }))
            }
            Ok(Err(error)) => {
                tracing::debug!(error = %error, "failed to read request body");
                (Bytes::new(), Some(BodyFailure::Unreadable))
            }
            Err(_) => {
                tracing::warn!(path = %parts.uri.path(), "request body collection timed out");
                (Bytes::new(), Some(BodyFailure::TimedOut))
            }
        };

        let method = parts.method.clone();
        let path = parts.uri.path().to_string();
        let mut request = Request::from_parts(parts, Full::new(body));
        if let Some(failure) = failure {
            request.extensions_mut().insert(failure);
        }

        // The handler owns its own task so a dropped connection or an expired
        // timer never cuts a write short.
        let app = self.app.clone();
        let mut handler = tokio::spawn(async move { app.handle(request).await });

        let joined = if method.is_safe() {
            match tokio::time::timeout(timeout, &mut handler).await {
                Ok(joined) => joined,
                Err(_) => {
                    handler.abort();
                    tracing::warn!(http.method = %method, http.path = %path, "handler timed out");
                    return Response::message(StatusCode::GATEWAY_TIMEOUT, "Request timed out");
                }
            }
        } else {
            handler.await
        };

        joined.unwrap_or_else(|error| {
            tracing::error!(
                http.method = %method,
                http.path = %path,
                error = %error,
                "handler task failed"
            );
            Response::message(
                StatusCode::INTERNAL_SERVER_ERROR,
                roster_core::SERVER_ERROR_MESSAGE,
            )
        })
    }
}
