//! Admin authentication service.
//!
//! A single administrator signs in with the configured email and a password.
//! The password lives only in memory as an Argon2id hash, seeded from
//! configuration and replaced by change-password. A successful login yields
//! an HS256 token valid for one day, carried in the `authToken` cookie.
//!
//! Repeated failures from one client lock login for a while; see
//! [`LoginThrottle`].

mod error;

pub use error::AuthError;

use std::time::Duration;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use furnish_core::Email;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind,
};
use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Token and cookie lifetime.
pub const TOKEN_TTL_SECS: i64 = 86_400;

/// Role claim carried by every admin token.
pub const ADMIN_ROLE: &str = "admin";

/// Failed logins allowed before the lock engages.
pub const MAX_LOGIN_ATTEMPTS: u32 = 3;

const MIN_PASSWORD_LENGTH: usize = 8;

// =============================================================================
// Tokens
// =============================================================================

/// Claims in an admin token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub email: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 signing and verification keys derived from the shared secret.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenKeys {
    /// Build keys from the signing secret.
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            validation,
        }
    }

    /// Issue a token for `email`, issued at `now` (unix seconds).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Signing` if encoding fails.
    pub fn issue(&self, email: &str, now: i64) -> Result<String, AuthError> {
        let claims = Claims {
            email: email.to_owned(),
            role: ADMIN_ROLE.to_owned(),
            iat: now,
            exp: now + TOKEN_TTL_SECS,
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(AuthError::Signing)
    }

    /// Verify a token's signature and expiry, and that it is an admin token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for any rejected token.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(AuthError::InvalidToken)?;
        if data.claims.role != ADMIN_ROLE {
            return Err(AuthError::InvalidToken(ErrorKind::InvalidToken.into()));
        }
        Ok(data.claims)
    }
}

// =============================================================================
// Password
// =============================================================================

/// The administrator password, held as an Argon2id hash.
pub struct PasswordStore {
    hash: RwLock<String>,
}

impl PasswordStore {
    /// Hash the initial password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PasswordHash` if hashing fails.
    pub fn new(password: &SecretString) -> Result<Self, AuthError> {
        Ok(Self {
            hash: RwLock::new(hash_password(password.expose_secret())?),
        })
    }

    /// Whether `candidate` matches the current password.
    pub async fn verify(&self, candidate: &str) -> bool {
        let hash = self.hash.read().await;
        verify_password(candidate, &hash).is_ok()
    }

    /// Replace the password after checking the current one.
    ///
    /// # Errors
    ///
    /// - `InvalidCredentials` if `current` is wrong
    /// - `WeakPassword` if `new` is shorter than eight characters
    /// - `PasswordUnchanged` if `new` equals `current`
    pub async fn change(&self, current: &str, new: &str) -> Result<(), AuthError> {
        let mut hash = self.hash.write().await;
        verify_password(current, &hash)?;
        if new.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::WeakPassword(MIN_PASSWORD_LENGTH));
        }
        if new == current {
            return Err(AuthError::PasswordUnchanged);
        }
        *hash = hash_password(new)?;
        Ok(())
    }
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Whether the submitted email is the administrator's.
///
/// Case-insensitive, surrounding whitespace ignored.
#[must_use]
pub fn is_admin_email(admin: &Email, submitted: &str) -> bool {
    admin.as_str().eq_ignore_ascii_case(submitted.trim())
}

// =============================================================================
// Login throttle
// =============================================================================

/// Outcome of recording a failed login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFailure {
    /// More attempts remain.
    Remaining(u32),
    /// This failure engaged the lock.
    Locked,
}

/// Consecutive failed logins per client.
///
/// Counts expire with the lockout window, measured from the latest failure.
/// Once a client reaches [`MAX_LOGIN_ATTEMPTS`] it stays locked until its
/// entry expires; a successful login clears the count.
#[derive(Clone)]
pub struct LoginThrottle {
    failures: Cache<String, u32>,
}

impl LoginThrottle {
    #[must_use]
    pub fn new(lockout: Duration) -> Self {
        Self {
            failures: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(lockout)
                .build(),
        }
    }

    /// Whether login is locked for `client`.
    pub async fn is_locked(&self, client: &str) -> bool {
        self.failures
            .get(client)
            .await
            .is_some_and(|count| count >= MAX_LOGIN_ATTEMPTS)
    }

    /// Count a failed login.
    pub async fn record_failure(&self, client: &str) -> LoginFailure {
        let count = self
            .failures
            .entry_by_ref(client)
            .and_upsert_with(|existing| {
                std::future::ready(existing.map_or(1, |entry| entry.into_value() + 1))
            })
            .await
            .into_value();
        if count >= MAX_LOGIN_ATTEMPTS {
            LoginFailure::Locked
        } else {
            LoginFailure::Remaining(MAX_LOGIN_ATTEMPTS - count)
        }
    }

    /// Forget failures after a successful login.
    pub async fn reset(&self, client: &str) {
        self.failures.invalidate(client).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SECRET: &str = "q8Zr3LmN0vXt7KpW2sYb9HcF4jUe6AgD";

    fn keys(secret: &str) -> TokenKeys {
        TokenKeys::new(&SecretString::from(secret))
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    #[test]
    fn test_token_round_trip() {
        let keys = keys(SECRET);
        let issued_at = now();
        let token = keys.issue("admin@furnish.test", issued_at).unwrap();

        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.email, "admin@furnish.test");
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.exp - claims.iat, 86_400);
    }

    #[test]
    fn test_expired_token_rejected() {
        let keys = keys(SECRET);
        let token = keys.issue("admin@furnish.test", now() - 2 * TOKEN_TTL_SECS).unwrap();
        assert!(matches!(
            keys.verify(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = keys(SECRET)
            .issue("admin@furnish.test", now())
            .unwrap();
        let other = keys("Xk2Vb8Nq4Lz0Rw6Tp1Ym7Hs3Jd9Gf5Ca");
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(keys(SECRET).verify("not.a.token").is_err());
        assert!(keys(SECRET).verify("").is_err());
    }

    #[test]
    fn test_non_admin_role_rejected() {
        let claims = Claims {
            email: "shopper@furnish.test".to_string(),
            role: "customer".to_string(),
            iat: now(),
            exp: now() + 60,
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(keys(SECRET).verify(&token).is_err());
    }

    #[test]
    fn test_is_admin_email() {
        let admin = Email::parse("admin@furnish.test").unwrap();
        assert!(is_admin_email(&admin, " Admin@Furnish.test "));
        assert!(!is_admin_email(&admin, "other@furnish.test"));
    }

    #[tokio::test]
    async fn test_password_verify_and_change() {
        let store = PasswordStore::new(&SecretString::from("initial-pass")).unwrap();
        assert!(store.verify("initial-pass").await);
        assert!(!store.verify("wrong-pass").await);

        assert!(matches!(
            store.change("wrong-pass", "brand-new-pass").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            store.change("initial-pass", "short").await,
            Err(AuthError::WeakPassword(8))
        ));
        assert!(matches!(
            store.change("initial-pass", "initial-pass").await,
            Err(AuthError::PasswordUnchanged)
        ));

        store.change("initial-pass", "brand-new-pass").await.unwrap();
        assert!(store.verify("brand-new-pass").await);
        assert!(!store.verify("initial-pass").await);
    }

    #[tokio::test]
    async fn test_three_failures_lock() {
        let throttle = LoginThrottle::new(Duration::from_secs(300));
        let client = "203.0.113.7";

        assert_eq!(throttle.record_failure(client).await, LoginFailure::Remaining(2));
        assert_eq!(throttle.record_failure(client).await, LoginFailure::Remaining(1));
        assert!(!throttle.is_locked(client).await);
        assert_eq!(throttle.record_failure(client).await, LoginFailure::Locked);
        assert!(throttle.is_locked(client).await);
        assert!(!throttle.is_locked("198.51.100.2").await);
    }

    #[tokio::test]
    async fn test_success_resets_count() {
        let throttle = LoginThrottle::new(Duration::from_secs(300));
        let client = "203.0.113.7";

        throttle.record_failure(client).await;
        throttle.record_failure(client).await;
        throttle.reset(client).await;

        assert_eq!(throttle.record_failure(client).await, LoginFailure::Remaining(2));
    }

    #[tokio::test]
    async fn test_lock_expires() {
        let throttle = LoginThrottle::new(Duration::from_millis(50));
        let client = "203.0.113.7";
        for _ in 0..MAX_LOGIN_ATTEMPTS {
            throttle.record_failure(client).await;
        }
        assert!(throttle.is_locked(client).await);

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(!throttle.is_locked(client).await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_failures_all_count() {
        let throttle = LoginThrottle::new(Duration::from_secs(300));
        let client = "203.0.113.8";

        let attempts: Vec<_> = (0..16)
            .map(|_| {
                let throttle = throttle.clone();
                tokio::spawn(async move { throttle.record_failure(client).await })
            })
            .collect();
        let mut remaining = Vec::new();
        for attempt in attempts {
            if let LoginFailure::Remaining(n) = attempt.await.unwrap() {
                remaining.push(n);
            }
        }

        // Exactly two racers saw a count below the limit.
        remaining.sort_unstable();
        assert_eq!(remaining, vec![1, 2]);
        assert!(throttle.is_locked(client).await);
    }
}
