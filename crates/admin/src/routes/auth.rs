//! Authentication route handlers.
//!
//! Login issues the `authToken` cookie; logout and invalid tokens expire it.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::{ClientIp, RequireAdminAuth, auth_cookie, auth_token, expired_auth_cookie};
use crate::services::auth::{LoginFailure, is_admin_email};
use crate::state::AppState;

const LOCKED_MESSAGE: &str = "Too many failed attempts. Please try again later.";

/// Outcome body shared by the auth endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts_remaining: Option<u32>,
}

impl AuthOutcome {
    const fn ok(message: Option<&'static str>) -> Self {
        Self {
            success: true,
            message,
            attempts_remaining: None,
        }
    }

    const fn failed(message: &'static str, attempts_remaining: u32) -> Self {
        Self {
            success: false,
            message: Some(message),
            attempts_remaining: Some(attempts_remaining),
        }
    }
}

// =============================================================================
// POST /api/login
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Check the submitted credentials and set the token cookie.
///
/// Three consecutive failures from one client lock login for the configured
/// window; while locked every attempt answers 429 without checking the
/// password.
#[instrument(skip(state, body), fields(client = %client))]
pub async fn login(
    State(state): State<AppState>,
    ClientIp(client): ClientIp,
    Json(body): Json<LoginRequest>,
) -> Result<Response> {
    let throttle = state.throttle();
    if throttle.is_locked(&client).await {
        tracing::warn!("Login attempt while locked");
        return Ok((
            StatusCode::TOO_MANY_REQUESTS,
            Json(AuthOutcome::failed(LOCKED_MESSAGE, 0)),
        )
            .into_response());
    }

    let valid = is_admin_email(&state.config().auth.admin_email, &body.email)
        && state.password().verify(&body.password).await;

    if !valid {
        let remaining = match throttle.record_failure(&client).await {
            LoginFailure::Remaining(n) => n,
            LoginFailure::Locked => {
                tracing::warn!("Login locked after repeated failures");
                0
            }
        };
        tracing::info!(attempts_remaining = remaining, "Login failed");
        return Ok((
            StatusCode::UNAUTHORIZED,
            Json(AuthOutcome::failed("Invalid credentials", remaining)),
        )
            .into_response());
    }

    throttle.reset(&client).await;
    let email = state.config().auth.admin_email.as_str();
    let token = state.tokens().issue(email, Utc::now().timestamp())?;
    tracing::info!("Login successful");

    Ok((
        [(SET_COOKIE, auth_cookie(&token, state.config().is_https()))],
        Json(AuthOutcome::ok(None)),
    )
        .into_response())
}

// =============================================================================
// POST /api/logout
// =============================================================================

/// Expire the token cookie.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(SET_COOKIE, expired_auth_cookie(state.config().is_https()))],
        Json(AuthOutcome::ok(None)),
    )
}

// =============================================================================
// GET /api/check-auth
// =============================================================================

/// Report whether the request carries a valid token. Always 200; an invalid
/// token is also cleared.
pub async fn check_auth(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(token) = auth_token(&headers) else {
        return Json(json!({ "isAuthenticated": false })).into_response();
    };

    match state.tokens().verify(&token) {
        Ok(_) => Json(json!({ "isAuthenticated": true })).into_response(),
        Err(e) => {
            tracing::debug!(error = %e, "Clearing invalid token");
            (
                [(SET_COOKIE, expired_auth_cookie(state.config().is_https()))],
                Json(json!({ "isAuthenticated": false })),
            )
                .into_response()
        }
    }
}

// =============================================================================
// POST /api/change-password
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

/// Replace the admin password and reissue the token cookie.
#[instrument(skip_all, fields(email = %claims.email))]
pub async fn change_password(
    State(state): State<AppState>,
    RequireAdminAuth(claims): RequireAdminAuth,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<Response> {
    state
        .password()
        .change(&body.current_password, &body.new_password)
        .await?;

    let token = state.tokens().issue(&claims.email, Utc::now().timestamp())?;
    tracing::info!("Admin password changed");

    Ok((
        [(SET_COOKIE, auth_cookie(&token, state.config().is_https()))],
        Json(AuthOutcome::ok(Some("Password changed successfully"))),
    )
        .into_response())
}
