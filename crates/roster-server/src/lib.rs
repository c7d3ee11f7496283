//! # Roster Server
//!
//! The HTTP side of the Roster service.
//!
//! - [`Router`] maps method and path to an [`Operation`]
//! - [`App`] runs each request through the public or protected pipeline and
//!   then the employee operations
//! - [`Server`] owns the listener, the per-request limits and graceful
//!   shutdown
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use roster_middleware::TokenValidator;
//! use roster_server::{App, Server, ServerConfig};
//! use roster_store::{DiskAttachmentStore, InMemoryEmployeeStore};
//!
//! # async fn run() -> Result<(), roster_server::ServerError> {
//! let app = App::builder()
//!     .employee_store(Arc::new(InMemoryEmployeeStore::new()))
//!     .attachment_store(Arc::new(DiskAttachmentStore::new("uploads")))
//!     .upload_root("uploads")
//!     .validator(TokenValidator::new("secret"))
//!     .build()?;
//!
//! Server::new(ServerConfig::default(), app).run().await
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/roster-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod app;
pub mod config;
mod employees;
mod error;
pub mod health;
pub mod router;
pub mod server;
pub mod shutdown;
pub mod uploads;

pub use app::{App, AppBuilder, BodyFailure, ROOT_MESSAGE};
pub use config::{ServerConfig, ServerConfigBuilder};
pub use error::ServerError;
pub use health::{HealthCheck, HealthStatus, ReadinessCheck, ReadinessStatus};
pub use router::{Operation, RouteMatch, Router};
pub use server::Server;
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownSignal};
pub use uploads::UploadFiles;
