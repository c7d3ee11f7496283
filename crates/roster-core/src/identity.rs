//! Authenticated caller identity.

use serde::{Deserialize, Serialize};

/// The identity decoded from a verified bearer credential.
///
/// An `Identity` is request-scoped: it is produced by the token validator,
/// attached once to the request context and read (never modified) by every
/// later stage.
///
/// # Example
///
/// ```
/// use roster_core::Identity;
///
/// let identity = Identity::new("u-42", "ada@example.com");
/// assert_eq!(identity.log_id(), "user:u-42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    /// Subject id carried in the `id` claim.
    pub id: String,
    /// Email carried in the `email` claim.
    pub email: String,
}

impl Identity {
    /// Creates an identity.
    #[must_use]
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
        }
    }

    /// Returns a string suitable for logs. Never includes the credential.
    #[must_use]
    pub fn log_id(&self) -> String {
        format!("user:{}", self.id)
    }
}
