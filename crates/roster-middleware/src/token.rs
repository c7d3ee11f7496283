//! Bearer token validation.
//!
//! The `Authorization` header is split on whitespace and the second token is
//! the credential; the scheme word is not inspected. The credential is an
//! HMAC-signed JWT carrying `id` and `email` claims.

use http::HeaderValue;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use roster_core::{Identity, RosterError, UnauthenticatedReason};
use serde::Deserialize;

/// Verifies bearer credentials against a shared secret.
///
/// The secret is fixed at construction for the life of the validator.
/// Validation is pure: the same token always yields the same outcome, apart
/// from expiry.
///
/// # Example
///
/// ```
/// use roster_middleware::TokenValidator;
/// use roster_core::UnauthenticatedReason;
///
/// let validator = TokenValidator::new("s3cret");
/// let err = validator.validate_header(None).unwrap_err();
/// assert!(matches!(
///     err,
///     roster_core::RosterError::Unauthenticated { reason: UnauthenticatedReason::Missing }
/// ));
/// ```
#[derive(Clone)]
pub struct TokenValidator {
    key: DecodingKey,
    validation: Validation,
}

#[derive(Debug, Deserialize)]
struct Claims {
    id: ClaimText,
    email: String,
}

// Issuers commonly encode numeric user ids; both forms are accepted.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClaimText {
    Text(String),
    Number(serde_json::Number),
}

impl From<ClaimText> for String {
    fn from(value: ClaimText) -> Self {
        match value {
            ClaimText::Text(s) => s,
            ClaimText::Number(n) => n.to_string(),
        }
    }
}

impl TokenValidator {
    /// Creates a validator for HS256/HS384/HS512 tokens signed with `secret`.
    #[must_use]
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        // `exp` and `nbf` are checked when present but not required.
        validation.required_spec_claims.clear();
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.leeway = 0;

        Self {
            key: DecodingKey::from_secret(secret.as_ref()),
            validation,
        }
    }

    /// Sets the clock-skew allowance applied to `exp` and `nbf`.
    #[must_use]
    pub fn with_leeway(mut self, leeway_secs: u64) -> Self {
        self.validation.leeway = leeway_secs;
        self
    }

    /// Extracts the credential from a raw `Authorization` header value.
    ///
    /// Returns `None` when the header is absent, not valid text, or has no
    /// second whitespace-separated token.
    #[must_use]
    pub fn extract_token(header: Option<&HeaderValue>) -> Option<&str> {
        header?.to_str().ok()?.split_whitespace().nth(1)
    }

    /// Validates the raw `Authorization` header and returns the identity.
    pub fn validate_header(&self, header: Option<&HeaderValue>) -> Result<Identity, RosterError> {
        let token = Self::extract_token(header)
            .ok_or_else(|| RosterError::unauthenticated(UnauthenticatedReason::Missing))?;
        self.validate_token(token)
    }

    /// Validates a bare credential.
    pub fn validate_token(&self, token: &str) -> Result<Identity, RosterError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|error| {
            tracing::debug!(error = %error, "token verification failed");
            RosterError::unauthenticated(UnauthenticatedReason::Invalid)
        })?;

        Ok(Identity::new(data.claims.id, data.claims.email))
    }
}

impl std::fmt::Debug for TokenValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenValidator")
            .field("algorithms", &self.validation.algorithms)
            .field("leeway", &self.validation.leeway)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &str = "test-secret";

    fn now() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    fn mint(alg: Algorithm, secret: &str, claims: &serde_json::Value) -> String {
        encode(
            &Header::new(alg),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn header(value: &str) -> HeaderValue {
        HeaderValue::from_str(value).unwrap()
    }

    fn reason(err: RosterError) -> UnauthenticatedReason {
        match err {
            RosterError::Unauthenticated { reason } => reason,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_valid_token_yields_identity() {
        let validator = TokenValidator::new(SECRET);
        let token = mint(
            Algorithm::HS256,
            SECRET,
            &json!({"id": "u-1", "email": "a@example.com", "exp": now() + 3600}),
        );

        let identity = validator
            .validate_header(Some(&header(&format!("Bearer {token}"))))
            .unwrap();
        assert_eq!(identity, Identity::new("u-1", "a@example.com"));
    }

    #[test]
    fn test_same_token_same_identity() {
        let validator = TokenValidator::new(SECRET);
        let token = mint(Algorithm::HS512, SECRET, &json!({"id": 42, "email": "n@example.com"}));

        let a = validator.validate_token(&token).unwrap();
        let b = validator.validate_token(&token).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.id, "42");
    }

    #[test]
    fn test_scheme_word_is_not_inspected() {
        let validator = TokenValidator::new(SECRET);
        let token = mint(Algorithm::HS384, SECRET, &json!({"id": "u", "email": "e"}));
        assert!(validator
            .validate_header(Some(&header(&format!("Token {token}"))))
            .is_ok());
    }

    #[test]
    fn test_missing_header_is_missing() {
        let validator = TokenValidator::new(SECRET);
        assert_eq!(
            reason(validator.validate_header(None).unwrap_err()),
            UnauthenticatedReason::Missing
        );
    }

    #[test]
    fn test_scheme_without_credential_is_missing() {
        let validator = TokenValidator::new(SECRET);
        for value in ["Bearer", "Bearer   ", ""] {
            assert_eq!(
                reason(validator.validate_header(Some(&header(value))).unwrap_err()),
                UnauthenticatedReason::Missing,
                "{value:?}"
            );
        }
    }

    #[test]
    fn test_non_text_header_is_missing() {
        let validator = TokenValidator::new(SECRET);
        let value = HeaderValue::from_bytes(b"Bearer \xff\xfe").unwrap();
        assert_eq!(
            reason(validator.validate_header(Some(&value)).unwrap_err()),
            UnauthenticatedReason::Missing
        );
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let validator = TokenValidator::new(SECRET);
        let token = mint(Algorithm::HS256, "other", &json!({"id": "u", "email": "e"}));
        assert_eq!(
            reason(validator.validate_token(&token).unwrap_err()),
            UnauthenticatedReason::Invalid
        );
    }

    #[test]
    fn test_garbage_is_invalid() {
        let validator = TokenValidator::new(SECRET);
        assert_eq!(
            reason(validator.validate_header(Some(&header("Bearer not.a.jwt"))).unwrap_err()),
            UnauthenticatedReason::Invalid
        );
    }

    #[test]
    fn test_expired_is_invalid() {
        let validator = TokenValidator::new(SECRET);
        let token = mint(
            Algorithm::HS256,
            SECRET,
            &json!({"id": "u", "email": "e", "exp": now() - 120}),
        );
        assert_eq!(
            reason(validator.validate_token(&token).unwrap_err()),
            UnauthenticatedReason::Invalid
        );
    }

    #[test]
    fn test_not_yet_valid_is_invalid() {
        let validator = TokenValidator::new(SECRET);
        let token = mint(
            Algorithm::HS256,
            SECRET,
            &json!({"id": "u", "email": "e", "nbf": now() + 3600, "exp": now() + 7200}),
        );
        assert_eq!(
            reason(validator.validate_token(&token).unwrap_err()),
            UnauthenticatedReason::Invalid
        );

        let started = mint(
            Algorithm::HS256,
            SECRET,
            &json!({"id": "u", "email": "e", "nbf": now() - 60}),
        );
        assert!(validator.validate_token(&started).is_ok());
    }

    #[test]
    fn test_leeway_accepts_recently_expired() {
        let validator = TokenValidator::new(SECRET).with_leeway(300);
        let token = mint(
            Algorithm::HS256,
            SECRET,
            &json!({"id": "u", "email": "e", "exp": now() - 120}),
        );
        assert!(validator.validate_token(&token).is_ok());
    }

    #[test]
    fn test_missing_claims_are_invalid() {
        let validator = TokenValidator::new(SECRET);
        let token = mint(Algorithm::HS256, SECRET, &json!({"id": "u"}));
        assert_eq!(
            reason(validator.validate_token(&token).unwrap_err()),
            UnauthenticatedReason::Invalid
        );
    }

    #[test]
    fn test_debug_does_not_leak_secret() {
        let validator = TokenValidator::new("super-secret-value");
        assert!(!format!("{validator:?}").contains("super-secret-value"));
    }
}
