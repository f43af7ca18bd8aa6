//! Unified error handling for admin.
//!
//! Every error renders as a JSON body with an `error` message. Content store
//! and internal failures are reported to Sentry and answered generically.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use furnish_core::FieldErrors;
use serde_json::json;
use thiserror::Error;

use crate::sanity::SanityError;
use crate::services::auth::AuthError;

/// Application-level error type for the admin dashboard.
#[derive(Debug, Error)]
pub enum AppError {
    /// Content store operation failed.
    #[error("Content store error: {0}")]
    ContentStore(#[from] SanityError),

    /// Password or token operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Input failed validation.
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// Admin is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Login is locked after repeated failures.
    #[error("Too many requests: {0}")]
    TooManyRequests(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<FieldErrors> for AppError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::ContentStore(SanityError::NotFound(_)) | Self::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::ContentStore(SanityError::Api { status: 409, .. }) => StatusCode::CONFLICT,
            Self::ContentStore(_) => StatusCode::BAD_GATEWAY,
            Self::Auth(AuthError::InvalidCredentials | AuthError::InvalidToken(_))
            | Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Auth(AuthError::WeakPassword(_) | AuthError::PasswordUnchanged)
            | Self::BadRequest(_)
            | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Auth(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    const fn is_server_fault(&self) -> bool {
        if matches!(self, Self::ContentStore(SanityError::Api { status: 409, .. })) {
            return false;
        }
        matches!(
            self,
            Self::ContentStore(
                SanityError::Http(_)
                    | SanityError::Api { .. }
                    | SanityError::Parse(_)
                    | SanityError::RateLimited(_)
                    | SanityError::Stream(_)
            ) | Self::Auth(AuthError::PasswordHash | AuthError::Signing(_))
                | Self::Internal(_)
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_fault() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        let status = self.status();

        // Don't expose internal error details to clients
        let body = match self {
            Self::ContentStore(SanityError::NotFound(_)) => json!({ "error": "Not found" }),
            Self::ContentStore(SanityError::Api { status: 409, .. }) => {
                json!({ "error": "Document changed concurrently, please retry" })
            }
            Self::ContentStore(_) => json!({ "error": "Content store error" }),
            Self::Auth(AuthError::InvalidCredentials) => {
                json!({ "success": false, "message": "Incorrect current password" })
            }
            Self::Auth(AuthError::InvalidToken(_)) => json!({ "error": "Unauthorized" }),
            Self::Auth(err @ (AuthError::WeakPassword(_) | AuthError::PasswordUnchanged)) => {
                json!({ "success": false, "message": err.to_string() })
            }
            Self::Auth(_) | Self::Internal(_) => json!({ "error": "Internal server error" }),
            Self::Validation(errors) => json!({ "error": "Validation failed", "errors": errors }),
            Self::NotFound(message)
            | Self::BadRequest(message)
            | Self::Unauthorized(message)
            | Self::TooManyRequests(message) => json!({ "error": message }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context to the signed-in administrator.
pub fn set_sentry_user(email: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            email: Some(email.to_string()),
            ..Default::default()
        }));
    });
}
