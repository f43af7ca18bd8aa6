//! Identity verification hash for the support widget.

use axum::{Json, extract::State};
use hmac::{Hmac, Mac};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyIdentity {
    #[serde(default)]
    pub user_data: String,
}

#[derive(Debug, Serialize)]
pub struct IdentityHash {
    pub hash: String,
}

/// Hex HMAC-SHA256 of `data` under `key`.
fn sign(key: &[u8], data: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| AppError::Internal(format!("invalid HMAC key: {e}")))?;
    mac.update(data.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Sign the caller's user data with the identity secret.
#[instrument(skip_all)]
pub async fn verify_identity(
    State(state): State<AppState>,
    Json(body): Json<VerifyIdentity>,
) -> Result<Json<IdentityHash>> {
    let secret = state
        .config()
        .identity_secret
        .as_ref()
        .ok_or(AppError::NotConfigured(
            "Identity verification is not configured",
        ))?;
    if body.user_data.trim().is_empty() {
        return Err(AppError::BadRequest("Missing user data".to_string()));
    }

    let hash = sign(secret.expose_secret().as_bytes(), &body.user_data)?;
    Ok(Json(IdentityHash { hash }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_matches_known_vector() {
        // RFC 4231 test case 2
        let hash = sign(b"Jefe", "what do ya want for nothing?").unwrap();
        assert_eq!(
            hash,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }
}
