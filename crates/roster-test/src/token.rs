//! Bearer token minting for tests.

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;

use crate::error::TestError;

/// Signs HS256 tokens with the same secret the app under test validates.
#[derive(Debug, Clone)]
pub struct TokenFactory {
    secret: String,
}

impl TokenFactory {
    /// Token lifetime for [`issue`](Self::issue).
    pub const LIFETIME_SECS: u64 = 3600;

    /// Creates a factory for `secret`.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Returns the signing secret.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Issues a valid token for `id` and `email`.
    pub fn issue(&self, id: &str, email: &str) -> Result<String, TestError> {
        self.sign(&json!({
            "id": id,
            "email": email,
            "exp": now() + Self::LIFETIME_SECS,
        }))
    }

    /// Issues a token that expired an hour ago.
    pub fn expired(&self, id: &str, email: &str) -> Result<String, TestError> {
        self.sign(&json!({
            "id": id,
            "email": email,
            "exp": now().saturating_sub(Self::LIFETIME_SECS),
        }))
    }

    /// Signs arbitrary claims.
    pub fn sign(&self, claims: &serde_json::Value) -> Result<String, TestError> {
        Ok(encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?)
    }
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_middleware::TokenValidator;

    #[test]
    fn test_issued_token_validates() {
        let factory = TokenFactory::new("factory-secret");
        let token = factory.issue("u-1", "u1@example.com").unwrap();

        let identity = TokenValidator::new("factory-secret")
            .validate_token(&token)
            .unwrap();
        assert_eq!(identity.id, "u-1");
    }

    #[test]
    fn test_expired_and_foreign_tokens_fail() {
        let factory = TokenFactory::new("factory-secret");
        let validator = TokenValidator::new("factory-secret");

        let expired = factory.expired("u-1", "u1@example.com").unwrap();
        assert!(validator.validate_token(&expired).is_err());

        let foreign = TokenFactory::new("other")
            .issue("u-1", "u1@example.com")
            .unwrap();
        assert!(validator.validate_token(&foreign).is_err());
    }
}
