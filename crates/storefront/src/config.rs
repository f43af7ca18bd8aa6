//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SANITY_PROJECT_ID` - Content store project id
//! - `SANITY_API_TOKEN` - Content store token with write access (orders, reviews, stock)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_BASE_URL` - Public URL, used for payment redirects (default: <http://localhost:3000>)
//! - `SANITY_DATASET` - Dataset name (default: production)
//! - `SANITY_API_VERSION` - Dated API version (default: 2025-01-01)
//! - `SANITY_API_URL` - Override the content store host (tests, proxies)
//! - `STRIPE_SECRET_KEY` - Payment gateway secret key; checkout by card is disabled without it
//! - `STRIPE_API_URL` - Payment gateway host (default: <https://api.stripe.com>)
//! - `SHIPENGINE_API_KEY` - Carrier API key; shipping routes are disabled without it
//! - `SHIPENGINE_API_URL` - Carrier API host (default: <https://api.shipengine.com>)
//! - `SHIPENGINE_CARRIER_IDS` - Comma-separated carrier ids to quote
//! - `SHIP_FROM_NAME`, `SHIP_FROM_PHONE`, `SHIP_FROM_ADDRESS`, `SHIP_FROM_CITY`,
//!   `SHIP_FROM_STATE`, `SHIP_FROM_POSTAL_CODE`, `SHIP_FROM_COUNTRY` - Warehouse address
//! - `IDENTITY_SECRET_KEY` - HMAC key for `/api/verify-identity`
//! - `BLOG_CONTENT_DIR` - Markdown blog posts (default: content/blog)
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.0;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "your_",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
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

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Content store access
    pub sanity: SanityConfig,
    /// Payment gateway (card checkout disabled when `None`)
    pub stripe: Option<StripeConfig>,
    /// Carrier API (shipping helper disabled when `None`)
    pub shipengine: Option<ShipEngineConfig>,
    /// HMAC key for identity verification hashes
    pub identity_secret: Option<SecretString>,
    /// Directory holding markdown blog posts
    pub blog_dir: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
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

/// Payment gateway (Stripe) configuration.
#[derive(Clone)]
pub struct StripeConfig {
    pub secret_key: SecretString,
    pub api_url: String,
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl StripeConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(secret_key) = get_optional_env("STRIPE_SECRET_KEY") else {
            return Ok(None);
        };
        validate_secret_strength(&secret_key, "STRIPE_SECRET_KEY")?;
        Ok(Some(Self {
            secret_key: SecretString::from(secret_key),
            api_url: get_env_or_default("STRIPE_API_URL", "https://api.stripe.com"),
        }))
    }
}

/// Warehouse address used as the ship-from for rate quotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipFrom {
    pub name: String,
    pub phone: String,
    pub address_line1: String,
    pub city_locality: String,
    pub state_province: String,
    pub postal_code: String,
    pub country_code: String,
}

impl Default for ShipFrom {
    fn default() -> Self {
        Self {
            name: "Your Store Name".to_owned(),
            phone: "555-555-5555".to_owned(),
            address_line1: "123 Main St".to_owned(),
            city_locality: "Austin".to_owned(),
            state_province: "TX".to_owned(),
            postal_code: "78701".to_owned(),
            country_code: "US".to_owned(),
        }
    }
}

impl ShipFrom {
    fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            name: get_optional_env("SHIP_FROM_NAME").unwrap_or(defaults.name),
            phone: get_optional_env("SHIP_FROM_PHONE").unwrap_or(defaults.phone),
            address_line1: get_optional_env("SHIP_FROM_ADDRESS").unwrap_or(defaults.address_line1),
            city_locality: get_optional_env("SHIP_FROM_CITY").unwrap_or(defaults.city_locality),
            state_province: get_optional_env("SHIP_FROM_STATE").unwrap_or(defaults.state_province),
            postal_code: get_optional_env("SHIP_FROM_POSTAL_CODE").unwrap_or(defaults.postal_code),
            country_code: get_optional_env("SHIP_FROM_COUNTRY").unwrap_or(defaults.country_code),
        }
    }
}

/// Carrier API (ShipEngine) configuration.
#[derive(Clone)]
pub struct ShipEngineConfig {
    pub api_key: SecretString,
    pub api_url: String,
    pub carrier_ids: Vec<String>,
    pub ship_from: ShipFrom,
}

impl std::fmt::Debug for ShipEngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShipEngineConfig")
            .field("api_key", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .field("carrier_ids", &self.carrier_ids)
            .field("ship_from", &self.ship_from)
            .finish()
    }
}

impl ShipEngineConfig {
    fn from_env() -> Option<Self> {
        let api_key = get_optional_env("SHIPENGINE_API_KEY")?;
        Some(Self {
            api_key: SecretString::from(api_key),
            api_url: get_env_or_default("SHIPENGINE_API_URL", "https://api.shipengine.com"),
            carrier_ids: split_list(&get_env_or_default("SHIPENGINE_CARRIER_IDS", "")),
            ship_from: ShipFrom::from_env(),
        })
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            host: parse_env("STOREFRONT_HOST", "127.0.0.1")?,
            port: parse_env("STOREFRONT_PORT", "3000")?,
            base_url: get_env_or_default("STOREFRONT_BASE_URL", "http://localhost:3000"),
            sanity: SanityConfig::from_env()?,
            stripe: StripeConfig::from_env()?,
            shipengine: ShipEngineConfig::from_env(),
            identity_secret: get_optional_env("IDENTITY_SECRET_KEY").map(SecretString::from),
            blog_dir: PathBuf::from(get_env_or_default("BLOG_CONTENT_DIR", "content/blog")),
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

    /// Whether cookies should carry the `Secure` attribute.
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

/// Parse a variable (or its default) into `T`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_owned)
        .collect()
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

/// Reject placeholders and low-entropy values.
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
