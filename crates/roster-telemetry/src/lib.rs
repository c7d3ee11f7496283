//! Logging for the roster employee service.
//!
//! Structured events are emitted with `tracing` throughout the workspace;
//! this crate installs the subscriber that formats them.
//!
//! | Event | Level | Emitted by |
//! |-------|-------|------------|
//! | request completed | `info` | access log stage |
//! | authentication refused | `debug` | authentication stage |
//! | store or attachment fault | `error` | employee handlers |
//! | orphaned attachment not removed | `warn` | employee handlers |
//! | server lifecycle | `info` | server |

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
