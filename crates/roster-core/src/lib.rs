//! # Roster Core
//!
//! Core types shared by every Roster crate:
//!
//! - [`Identity`] - Caller identity decoded from a verified bearer token
//! - [`RequestContext`] / [`RequestId`] - Per-request state handed to handlers
//! - [`EmployeeRecord`], [`Fields`], [`Filter`] - The employee resource model
//! - [`Phase`] - Lifecycle of a protected request
//! - [`RosterError`] - Failure taxonomy and its HTTP mapping

#![doc(html_root_url = "https://docs.rs/roster-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
pub mod employee;
mod error;
mod identity;
mod phase;

pub use context::{RequestContext, RequestId};
pub use employee::{EmployeeId, EmployeeRecord, Fields, Filter, ID_FIELD, PROFILE_IMAGE_FIELD};
pub use error::{
    ErrorBody, ErrorCategory, RosterError, RosterResult, UnauthenticatedReason,
    INVALID_TOKEN_MESSAGE, MISSING_TOKEN_MESSAGE, NOT_FOUND_MESSAGE, SERVER_ERROR_MESSAGE,
};
pub use identity::Identity;
pub use phase::{Phase, TransitionError};
