//! Per-request identifiers and the handler-side view of a request.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::Identity;

/// Correlation id of one request, a time-ordered UUID v7.
///
/// ```
/// use roster_core::RequestId;
///
/// let id = RequestId::new();
/// let parsed: RequestId = id.to_string().parse().unwrap();
/// assert_eq!(id, parsed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// A fresh id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Wraps an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for RequestId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// What a handler may know about the request it serves.
///
/// Produced from the middleware context once the pre-handler stages have
/// run. `identity` is set only on routes behind authentication.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    identity: Option<Identity>,
    operation_id: Option<String>,
}

impl RequestContext {
    /// An anonymous context.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            identity: None,
            operation_id: None,
        }
    }

    /// Attaches the caller.
    #[must_use]
    pub fn with_identity(self, identity: Identity) -> Self {
        Self {
            identity: Some(identity),
            ..self
        }
    }

    /// Attaches the route name.
    #[must_use]
    pub fn with_operation_id(self, operation_id: impl Into<String>) -> Self {
        Self {
            operation_id: Some(operation_id.into()),
            ..self
        }
    }

    /// Correlation id.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// The authenticated caller, if any.
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Shorthand for the `id` claim of the caller.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.identity.as_ref().map(|identity| identity.id.as_str())
    }

    /// Route name, e.g. `createEmployee`.
    #[must_use]
    pub fn operation_id(&self) -> Option<&str> {
        self.operation_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_time_ordered() {
        let first = RequestId::new();
        let second = RequestId::new();
        assert_ne!(first, second);
        assert_eq!(first.as_uuid().get_version_num(), 7);
    }

    #[test]
    fn test_parse_rejects_non_uuid() {
        assert!("trace-123".parse::<RequestId>().is_err());
        let id: RequestId = " 01890a5d-ac96-774b-bcce-b302099a8057 ".parse().unwrap();
        assert_eq!(id.to_string(), "01890a5d-ac96-774b-bcce-b302099a8057");
    }

    #[test]
    fn test_handler_view() {
        let ctx = RequestContext::with_request_id(RequestId::new())
            .with_identity(Identity::new("1", "a@b.c"))
            .with_operation_id("listEmployees");

        assert_eq!(ctx.user_id(), Some("1"));
        assert_eq!(ctx.operation_id(), Some("listEmployees"));
    }

    #[test]
    fn test_anonymous_by_default() {
        let ctx = RequestContext::with_request_id(RequestId::new());
        assert!(ctx.identity().is_none());
        assert!(ctx.user_id().is_none());
    }
}
