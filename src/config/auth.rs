//! Authentication configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Authentication configuration (JWT session tokens)
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared secret used to verify HS256 session tokens
    pub jwt_secret: String,
}

impl AuthConfig {
    /// Validate authentication configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.jwt_secret.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH_JWT_SECRET"));
        }
        if self.jwt_secret.len() < 16 {
            return Err(ValidationError::JwtSecretTooShort);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_missing_secret() {
        let config = AuthConfig {
            jwt_secret: String::new(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_short_secret() {
        let config = AuthConfig {
            jwt_secret: "short".to_string(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_valid_secret() {
        let config = AuthConfig {
            jwt_secret: "a-long-enough-test-secret".to_string(),
        };
        assert!(config.validate().is_ok());
    }
}
