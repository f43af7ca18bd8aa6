//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADMIN_EMAIL` - Login email for the single administrator
//! - `ADMIN_PASSWORD` - Initial administrator password (min 8 chars)
//! - `JWT_SECRET` - Token signing secret (min 32 chars, high entropy)
//! - `SANITY_PROJECT_ID` - Content store project id
//! - `SANITY_API_TOKEN` - Content store token with write access
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `ADMIN_BASE_URL` - Public URL; `https` turns on `Secure` cookies (default: <http://localhost:3001>)
//! - `ADMIN_LOGIN_LOCKOUT_SECS` - Lockout after three failed logins (default: 300)
//! - `ADMIN_TRUSTED_PROXIES` - Comma-separated proxy IPs whose forwarding headers are believed (default: none)
//! - `SANITY_DATASET` - Dataset name (default: production)
//! - `SANITY_API_VERSION` - Dated API version (default: 2025-01-01)
//! - `SANITY_API_URL` - Override the content store host (tests, proxies)
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use furnish_core::Email;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_PASSWORD_LENGTH: usize = 8;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "your_",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "xxx",
    "todo",
    "fixme",
    "insert",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the admin dashboard
    pub base_url: String,
    /// Administrator credentials and token signing
    pub auth: AuthConfig,
    /// Content store access
    pub sanity: SanityConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Administrator login configuration.
///
/// Implements `Debug` manually to redact the password and signing secret.
#[derive(Clone)]
pub struct AuthConfig {
    pub admin_email: Email,
    /// Seed for the in-memory password hash.
    pub admin_password: SecretString,
    pub jwt_secret: SecretString,
    /// How long login stays locked after three failures.
    pub lockout: Duration,
    /// Peers allowed to name the client in forwarding headers.
    pub trusted_proxies: Vec<IpAddr>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("admin_email", &self.admin_email)
            .field("admin_password", &"[REDACTED]")
            .field("jwt_secret", &"[REDACTED]")
            .field("lockout", &self.lockout)
            .field("trusted_proxies", &self.trusted_proxies)
            .finish()
    }
}

impl AuthConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let email = get_required_env("ADMIN_EMAIL")?;
        let admin_email = Email::parse(&email)
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_EMAIL".to_string(), e.to_string()))?;

        let admin_password = SecretString::from(get_required_env("ADMIN_PASSWORD")?);
        validate_min_length(&admin_password, "ADMIN_PASSWORD", MIN_PASSWORD_LENGTH)?;

        let jwt_secret = get_validated_secret("JWT_SECRET")?;
        validate_min_length(&jwt_secret, "JWT_SECRET", MIN_JWT_SECRET_LENGTH)?;

        Ok(Self {
            admin_email,
            admin_password,
            jwt_secret,
            lockout: Duration::from_secs(parse_env("ADMIN_LOGIN_LOCKOUT_SECS", "300")?),
            trusted_proxies: parse_ip_list(
                "ADMIN_TRUSTED_PROXIES",
                get_optional_env("ADMIN_TRUSTED_PROXIES").as_deref(),
            )?,
        })
    }
}

/// Content store (Sanity) configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct SanityConfig {
    pub project_id: String,
    pub dataset: String,
    pub api_version: String,
    pub token: SecretString,
    /// Replaces `https://{project_id}.api.sanity.io` when set.
    pub api_url: Option<String>,
}

impl std::fmt::Debug for SanityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SanityConfig")
            .field("project_id", &self.project_id)
            .field("dataset", &self.dataset)
            .field("api_version", &self.api_version)
            .field("token", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl SanityConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            project_id: get_required_env("SANITY_PROJECT_ID")?,
            dataset: get_env_or_default("SANITY_DATASET", "production"),
            api_version: get_env_or_default("SANITY_API_VERSION", "2025-01-01"),
            token: get_validated_secret("SANITY_API_TOKEN")?,
            api_url: get_optional_env("SANITY_API_URL"),
        })
    }

    /// Versioned API root, e.g. `https://abc123.api.sanity.io/v2025-01-01`.
    #[must_use]
    pub fn api_root(&self) -> String {
        let host = self.api_url.as_ref().map_or_else(
            || format!("https://{}.api.sanity.io", self.project_id),
            |url| url.trim_end_matches('/').to_owned(),
        );
        format!("{host}/v{}", self.api_version.trim_start_matches('v'))
    }
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (length, placeholder detection, entropy).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            host: parse_env("ADMIN_HOST", "127.0.0.1")?,
            port: parse_env("ADMIN_PORT", "3001")?,
            base_url: get_env_or_default("ADMIN_BASE_URL", "http://localhost:3001"),
            auth: AuthConfig::from_env()?,
            sanity: SanityConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the auth cookie should carry the `Secure` attribute.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn get_required_env(key: &str) -> Result<String, ConfigError> {
    get_optional_env(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Unset and blank values are both treated as absent.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_ip_list(key: &str, value: Option<&str>) -> Result<Vec<IpAddr>, ConfigError> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            entry
                .parse::<IpAddr>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), format!("{entry}: {e}")))
        })
        .collect()
}

fn validate_min_length(
    secret: &SecretString,
    var_name: &str,
    min: usize,
) -> Result<(), ConfigError> {
    let length = secret.expose_secret().chars().count();
    if length < min {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("must be at least {min} characters (got {length})"),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    let mut freq: HashMap<char, u32> = HashMap::new();
    let mut total = 0_u32;
    for c in s.chars() {
        *freq.entry(c).or_default() += 1;
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }

    let total = f64::from(total);
    freq.values()
        .map(|&count| {
            let p = f64::from(count) / total;
            -p * p.log2()
        })
        .sum()
}

fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy() {
        assert!(shannon_entropy("").abs() < f64::EPSILON);
        assert!(shannon_entropy("aaaaaaa").abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_jwt_secret_rejects_placeholder() {
        let err = validate_secret_strength("your-jwt-signing-key-goes-right-here", "JWT_SECRET")
            .unwrap_err();
        assert!(err.to_string().contains("placeholder"));
    }

    #[test]
    fn test_jwt_secret_rejects_low_entropy() {
        let err = validate_secret_strength("abababababababababababababababab", "JWT_SECRET")
            .unwrap_err();
        assert!(err.to_string().contains("entropy too low"));
    }

    #[test]
    fn test_jwt_secret_accepts_random_value() {
        assert!(validate_secret_strength("q8Zr3LmN0vXt7KpW2sYb9HcF4jUe6AgD", "JWT_SECRET").is_ok());
    }

    #[test]
    fn test_min_length() {
        let short = SecretString::from("hunter2");
        assert!(validate_min_length(&short, "ADMIN_PASSWORD", MIN_PASSWORD_LENGTH).is_err());

        let ok = SecretString::from("hunter22");
        assert!(validate_min_length(&ok, "ADMIN_PASSWORD", MIN_PASSWORD_LENGTH).is_ok());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let auth = AuthConfig {
            admin_email: Email::parse("admin@furnish.test").unwrap(),
            admin_password: SecretString::from("correct-horse"),
            jwt_secret: SecretString::from("q8Zr3LmN0vXt7KpW2sYb9HcF4jUe6AgD"),
            lockout: Duration::from_secs(300),
            trusted_proxies: Vec::new(),
        };
        let output = format!("{auth:?}");
        assert!(output.contains("admin@furnish.test"));
        assert!(!output.contains("correct-horse"));
        assert!(!output.contains("q8Zr3LmN0vXt7KpW2sYb9HcF4jUe6AgD"));
    }

    #[test]
    fn test_trusted_proxy_list() {
        assert!(parse_ip_list("ADMIN_TRUSTED_PROXIES", None).unwrap().is_empty());
        assert_eq!(
            parse_ip_list("ADMIN_TRUSTED_PROXIES", Some("10.0.0.1, ::1,")).unwrap(),
            vec![
                "10.0.0.1".parse::<IpAddr>().unwrap(),
                "::1".parse::<IpAddr>().unwrap()
            ]
        );
        assert!(parse_ip_list("ADMIN_TRUSTED_PROXIES", Some("10.0.0.0/8")).is_err());
    }

    #[test]
    fn test_sanity_api_root_override() {
        let config = SanityConfig {
            project_id: "abc123".to_string(),
            dataset: "production".to_string(),
            api_version: "v2025-01-01".to_string(),
            token: SecretString::from("skToken"),
            api_url: Some("http://127.0.0.1:4000".to_string()),
        };
        assert_eq!(config.api_root(), "http://127.0.0.1:4000/v2025-01-01");
    }
}
