//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//! Every error renders as a JSON body with an `error` message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use furnish_core::FieldErrors;
use serde_json::json;
use thiserror::Error;

use crate::sanity::SanityError;
use crate::shipengine::ShipEngineError;
use crate::stripe::StripeError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Content store operation failed.
    #[error("Content store error: {0}")]
    ContentStore(#[from] SanityError),

    /// Payment gateway operation failed.
    #[error("Payment error: {0}")]
    Payment(#[from] StripeError),

    /// Carrier API operation failed.
    #[error("Shipping error: {0}")]
    Shipping(#[from] ShipEngineError),

    /// Session store read or write failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Form input failed validation.
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// Caller is not allowed to do this.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Rate limited.
    #[error("Too many requests: {0}")]
    TooManyRequests(String),

    /// An optional integration is switched off.
    #[error("Not configured: {0}")]
    NotConfigured(&'static str),

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
            Self::Payment(_)
            | Self::Shipping(_)
            | Self::Session(_)
            | Self::NotConfigured(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Upstream and internal failures are reported; caller mistakes are not.
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
            ) | Self::Payment(_)
                | Self::Shipping(_)
                | Self::Session(_)
                | Self::Internal(_)
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_fault() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();

        // Don't expose upstream error details to clients
        let body = match self {
            Self::ContentStore(SanityError::NotFound(_)) => json!({ "error": "Not found" }),
            Self::ContentStore(SanityError::Api { status: 409, .. }) => {
                json!({ "error": "Document changed concurrently, please retry" })
            }
            Self::ContentStore(_) => json!({ "error": "Content store error" }),
            Self::Payment(_) => json!({ "error": "Payment processing failed" }),
            Self::Shipping(_) => json!({ "error": "Shipping service error" }),
            Self::Session(_) | Self::Internal(_) => json!({ "error": "Internal server error" }),
            Self::Validation(errors) => json!({ "error": "Validation failed", "errors": errors }),
            Self::NotConfigured(message) => json!({ "error": message }),
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

/// Add a breadcrumb for visitor actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("checkout", "Order created", Some(&[("order_id", "abc")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
