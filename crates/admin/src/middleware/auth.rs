//! Authentication extractor and auth cookie helpers for admin.
//!
//! The admin token travels in the `authToken` cookie. Handlers that need a
//! signed-in administrator take [`RequireAdminAuth`]; anything else under
//! `/api` answers 401 without it.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderMap, HeaderValue, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower_sessions::cookie::{Cookie, SameSite, time::Duration};

use crate::error::set_sentry_user;
use crate::services::auth::{Claims, TOKEN_TTL_SECS};
use crate::state::AppState;

/// Name of the admin token cookie.
pub const AUTH_COOKIE: &str = "authToken";

/// Extractor that requires a valid admin token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAdminAuth(claims): RequireAdminAuth) -> String {
///     format!("Hello, {}!", claims.email)
/// }
/// ```
pub struct RequireAdminAuth(pub Claims);

/// Rejection when the token is missing or invalid.
pub struct AdminAuthRejection;

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Unauthorized" })),
        )
            .into_response()
    }
}

impl FromRequestParts<AppState> for RequireAdminAuth {
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = auth_token(&parts.headers).ok_or(AdminAuthRejection)?;
        let claims = state.tokens().verify(&token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected admin token");
            AdminAuthRejection
        })?;

        set_sentry_user(&claims.email);
        Ok(Self(claims))
    }
}

/// The `authToken` value from the request cookies, if any.
#[must_use]
pub fn auth_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == AUTH_COOKIE)
        .map(|cookie| cookie.value().to_owned())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value carrying a fresh token.
#[must_use]
pub fn auth_cookie(token: &str, secure: bool) -> HeaderValue {
    build_cookie(token, Duration::seconds(TOKEN_TTL_SECS), secure)
}

/// `Set-Cookie` value that removes the token.
#[must_use]
pub fn expired_auth_cookie(secure: bool) -> HeaderValue {
    build_cookie("", Duration::ZERO, secure)
}

fn build_cookie(value: &str, max_age: Duration, secure: bool) -> HeaderValue {
    let cookie = Cookie::build((AUTH_COOKIE, value.to_owned()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(max_age)
        .secure(secure)
        .build();
    // Tokens are base64url and dots, always a valid header value
    HeaderValue::from_str(&cookie.to_string()).unwrap_or_else(|_| HeaderValue::from_static(""))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_token_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; authToken=abc.def.ghi; other=1"),
        );
        assert_eq!(auth_token(&headers), Some("abc.def.ghi".to_string()));
    }

    #[test]
    fn test_auth_token_missing_or_empty() {
        assert_eq!(auth_token(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("authToken="));
        assert_eq!(auth_token(&headers), None);
    }

    #[test]
    fn test_auth_cookie_attributes() {
        let value = auth_cookie("abc.def.ghi", false);
        let text = value.to_str().unwrap();
        assert!(text.starts_with("authToken=abc.def.ghi"));
        assert!(text.contains("HttpOnly"));
        assert!(text.contains("SameSite=Lax"));
        assert!(text.contains("Path=/"));
        assert!(text.contains("Max-Age=86400"));
        assert!(!text.contains("Secure"));

        assert!(auth_cookie("t", true).to_str().unwrap().contains("Secure"));
    }

    #[test]
    fn test_expired_cookie() {
        let value = expired_auth_cookie(false);
        let text = value.to_str().unwrap();
        assert!(text.starts_with("authToken=;"));
        assert!(text.contains("Max-Age=0"));
    }
}
