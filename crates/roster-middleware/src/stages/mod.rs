//! Pipeline stages.
//!
//! Public routes run `cors -> request_id -> access_log`; employee routes add
//! `authentication` as the last stage before the handler.

pub mod access_log;
pub mod authentication;
pub mod cors;
pub mod request_id;

pub use access_log::{AccessLogMiddleware, AccessRecord};
pub use authentication::AuthenticationMiddleware;
pub use cors::{AllowedOrigins, CorsBuilder, CorsMiddleware};
pub use request_id::{RequestIdMiddleware, REQUEST_ID_HEADER};
