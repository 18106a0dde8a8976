//! HS256 JWT session validation.
//!
//! The marketplace backend signs access tokens with a shared secret. The
//! subject id comes from the `sub` claim, with a legacy `userId` fallback
//! still present in older tokens.

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId};
use crate::ports::SessionValidator;

#[derive(Debug, Deserialize)]
struct Claims {
    sub: Option<String>,
    #[serde(rename = "userId")]
    user_id: Option<String>,
    email: Option<String>,
    name: Option<String>,
    #[allow(dead_code)]
    exp: usize,
}

/// HS256 implementation of `SessionValidator`.
pub struct HsSessionValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl HsSessionValidator {
    /// Creates a validator for tokens signed with the given secret.
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl SessionValidator for HsSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            use jsonwebtoken::errors::ErrorKind;
            match e.kind() {
                ErrorKind::ExpiredSignature => {
                    tracing::debug!("Token expired");
                    AuthError::TokenExpired
                }
                _ => {
                    tracing::debug!("Token validation failed: {}", e);
                    AuthError::InvalidToken
                }
            }
        })?;

        let claims = data.claims;
        let subject = claims
            .sub
            .or(claims.user_id)
            .ok_or(AuthError::InvalidToken)?;
        let id = UserId::new(subject).map_err(|_| AuthError::InvalidToken)?;

        Ok(AuthenticatedUser::new(id, claims.email, claims.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &str = "test-secret";

    fn sign(claims: serde_json::Value) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn future_exp() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[tokio::test]
    async fn valid_token_yields_user() {
        let token = sign(json!({
            "sub": "user-42",
            "email": "u@example.com",
            "name": "Uta",
            "exp": future_exp(),
        }));

        let validator = HsSessionValidator::new(SECRET);
        let user = validator.validate(&token).await.unwrap();
        assert_eq!(user.id.as_str(), "user-42");
        assert_eq!(user.email.as_deref(), Some("u@example.com"));
        assert_eq!(user.display_name.as_deref(), Some("Uta"));
    }

    #[tokio::test]
    async fn user_id_claim_is_accepted_as_fallback() {
        let token = sign(json!({ "userId": "legacy-7", "exp": future_exp() }));

        let validator = HsSessionValidator::new(SECRET);
        let user = validator.validate(&token).await.unwrap();
        assert_eq!(user.id.as_str(), "legacy-7");
    }

    #[tokio::test]
    async fn expired_token_is_reported_as_expired() {
        let token = sign(json!({
            "sub": "user-42",
            "exp": chrono::Utc::now().timestamp() - 3600,
        }));

        let validator = HsSessionValidator::new(SECRET);
        assert!(matches!(
            validator.validate(&token).await,
            Err(AuthError::TokenExpired)
        ));
    }

    #[tokio::test]
    async fn wrong_secret_is_invalid() {
        let token = sign(json!({ "sub": "user-42", "exp": future_exp() }));

        let validator = HsSessionValidator::new("other-secret");
        assert!(matches!(
            validator.validate(&token).await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn token_without_subject_is_invalid() {
        let token = sign(json!({ "exp": future_exp() }));

        let validator = HsSessionValidator::new(SECRET);
        assert!(matches!(
            validator.validate(&token).await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn garbage_is_invalid() {
        let validator = HsSessionValidator::new(SECRET);
        assert!(matches!(
            validator.validate("not.a.jwt").await,
            Err(AuthError::InvalidToken)
        ));
    }
}
