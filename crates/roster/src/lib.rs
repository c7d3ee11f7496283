//! # Roster
//!
//! An HTTP service for employee records with bearer-token authentication
//! and an optional profile image per record.
//!
//! Every request passes through a fixed pipeline:
//!
//! ```text
//! Cors → RequestId → AccessLog → [Authentication] → handler
//! ```
//!
//! Authentication runs only for `/api/employees` routes. The handler then
//! walks the request through the phase machine in [`core::Phase`]: the
//! attachment is stored first, then the store is mutated, then the response
//! is written. A failure at any step ends in `Failed` and maps to the status
//! of its [`core::RosterError`] category.
//!
//! ## Crates
//!
//! - [`core`]: identities, records, filters, phases and the error taxonomy
//! - [`middleware`]: the pipeline and its stages
//! - [`extract`]: query and body extraction
//! - [`store`]: employee and attachment storage
//! - [`config`]: layered configuration
//! - [`telemetry`]: logging setup
//! - [`server`]: routing, handlers and the HTTP server

#![doc(html_root_url = "https://docs.rs/roster/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub use roster_config as config;
pub use roster_core as core;
pub use roster_extract as extract;
pub use roster_middleware as middleware;
pub use roster_server as server;
pub use roster_store as store;
pub use roster_telemetry as telemetry;

pub mod bootstrap;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use roster::prelude::*;
///
/// let filter = Filter::all().department("eng");
/// assert!(!filter.is_empty());
/// ```
pub mod prelude {
    pub use roster_config::{ConfigLoader, RosterConfig};
    pub use roster_core::{
        EmployeeId, EmployeeRecord, Fields, Filter, Identity, Phase, RequestContext, RosterError,
    };
    pub use roster_middleware::{Middleware, Pipeline, TokenValidator};
    pub use roster_server::{App, Server, ServerConfig, ShutdownSignal};
    pub use roster_store::{
        AttachmentStore, DiskAttachmentStore, EmployeeRepository, EmployeeStore,
        InMemoryEmployeeStore,
    };
}
