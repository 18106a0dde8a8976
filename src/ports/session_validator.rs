//! Session validation port for bearer credential verification.
//!
//! Provider-agnostic: the HS256 adapter verifies marketplace-issued JWTs,
//! and a mock implementation backs the test suite.

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser};

/// Validates access tokens and extracts user identity.
///
/// # Contract
///
/// Implementations must:
/// - Verify the token signature and expiry
/// - Return `AuthError::InvalidToken` for malformed/bad-signature tokens
/// - Return `AuthError::TokenExpired` when the signature is valid but the
///   token has expired
#[async_trait]
pub trait SessionValidator: Send + Sync {
    /// Validate a raw token (without the "Bearer " prefix) and return the
    /// authenticated user extracted from its claims.
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;
    use std::collections::HashMap;
    use std::sync::RwLock;

    struct TestValidator {
        tokens: RwLock<HashMap<String, AuthenticatedUser>>,
    }

    #[async_trait]
    impl SessionValidator for TestValidator {
        async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
            self.tokens
                .read()
                .unwrap()
                .get(token)
                .cloned()
                .ok_or(AuthError::InvalidToken)
        }
    }

    #[tokio::test]
    async fn validator_trait_resolves_known_tokens() {
        let validator = TestValidator {
            tokens: RwLock::new(HashMap::new()),
        };
        validator.tokens.write().unwrap().insert(
            "tok".to_string(),
            AuthenticatedUser::new(UserId::new("u1").unwrap(), None, None),
        );

        assert_eq!(
            validator.validate("tok").await.unwrap().id.as_str(),
            "u1"
        );
        assert!(matches!(
            validator.validate("nope").await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn validator_is_object_safe() {
        fn _assert(_: &dyn SessionValidator) {}
    }
}
