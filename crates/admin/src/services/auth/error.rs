//! Admin authentication error types.

use thiserror::Error;

/// Errors that can occur during admin authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Email or password did not match.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Token is malformed, expired, forged, or not an admin token.
    #[error("invalid token: {0}")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),

    /// Token could not be signed.
    #[error("token signing failed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    /// New password is too short.
    #[error("New password must be at least {0} characters")]
    WeakPassword(usize),

    /// New password equals the current one.
    #[error("New password must be different from the current password")]
    PasswordUnchanged,

    /// Password hashing failed.
    #[error("password hashing failed")]
    PasswordHash,
}
