//! Mock session validator for tests.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId};
use crate::ports::SessionValidator;

/// Validator backed by a fixed token→user table.
#[derive(Default)]
pub struct MockSessionValidator {
    tokens: RwLock<HashMap<String, AuthenticatedUser>>,
}

impl MockSessionValidator {
    /// Creates an empty mock validator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a token that resolves to a bare user with the given id.
    pub fn accept(&self, token: impl Into<String>, user_id: &str) {
        let user = AuthenticatedUser::new(
            UserId::new(user_id).expect("mock user id must be non-empty"),
            None,
            None,
        );
        self.tokens
            .write()
            .expect("mock token table poisoned")
            .insert(token.into(), user);
    }
}

#[async_trait]
impl SessionValidator for MockSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        self.tokens
            .read()
            .expect("mock token table poisoned")
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn registered_token_resolves() {
        let validator = MockSessionValidator::new();
        validator.accept("tok-1", "user-1");

        assert_eq!(validator.validate("tok-1").await.unwrap().id.as_str(), "user-1");
        assert!(validator.validate("tok-2").await.is_err());
    }
}
