//! # Roster Middleware
//!
//! The request pipeline of the Roster service.
//!
//! ```text
//! Request → CORS → RequestId → AccessLog → [Authentication] → Handler
//!                                                               ↓
//! Response ←──────────────────────────────────────────────────┘
//! ```
//!
//! | Stage | Middleware     | Purpose                                   |
//! |-------|----------------|-------------------------------------------|
//! | 1     | CORS           | Answer preflights, decorate responses     |
//! | 2     | Request ID     | Assign a UUID v7, echo `x-request-id`     |
//! | 3     | Access Log     | One structured `info` line per request    |
//! | 4     | Authentication | Bearer token gate, protected routes only  |
//!
//! Authentication uses a [`TokenValidator`] built once from the configured
//! secret. On success the decoded [`Identity`](roster_core::Identity) is
//! attached to the [`MiddlewareContext`] exactly once.
//!
//! ## Example
//!
//! ```
//! use roster_middleware::pipeline::Stage;
//!
//! let stages = Stage::all();
//! assert_eq!(stages.len(), 4);
//! assert_eq!(stages[0].name(), "cors");
//! assert_eq!(stages[3].name(), "authentication");
//! ```

#![doc(html_root_url = "https://docs.rs/roster-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod middleware;
pub mod pipeline;
pub mod stages;
pub mod token;
pub mod types;

pub use context::{IdentityAlreadyAttached, MiddlewareContext};
pub use middleware::{BoxFuture, HandlerFn, Middleware, Next};
pub use pipeline::{BoxedMiddleware, Pipeline, PipelineBuilder, Stage};
pub use token::TokenValidator;
pub use types::{Request, Response, ResponseExt};
