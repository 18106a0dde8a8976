//! Authentication types for the domain layer.
//!
//! These types represent an authenticated user extracted from a verified
//! bearer credential. They carry no provider dependencies; any token scheme
//! can populate them through the `SessionValidator` port.

use thiserror::Error;

use super::UserId;

/// Authenticated user extracted from a validated token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// The stable subject identifier from the auth provider.
    pub id: UserId,

    /// Email address from the token claims, if present.
    pub email: Option<String>,

    /// Display name from the token claims, if present.
    pub display_name: Option<String>,
}

impl AuthenticatedUser {
    /// Creates a new authenticated user.
    pub fn new(id: UserId, email: Option<String>, display_name: Option<String>) -> Self {
        Self {
            id,
            email,
            display_name,
        }
    }
}

/// Authentication errors that can occur during credential verification.
///
/// On the realtime path every variant is terminal for the connection
/// attempt: the socket is closed and nothing is emitted back.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// No credential was supplied at connect time.
    #[error("Missing credential")]
    MissingCredential,

    /// The token is malformed or its signature does not verify.
    #[error("Invalid token")]
    InvalidToken,

    /// Signature is valid but the token has expired.
    #[error("Token expired")]
    TokenExpired,
}
