//! Integration tests for Furnish.
//!
//! Both binaries are served in-process on ephemeral ports, talking to
//! in-process fakes of the content store and the payment gateway. Nothing
//! outside the test process is contacted. The carrier API has a fake too,
//! wired in only by tests that need it.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p furnish-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `admin_*` - Admin login and management API
//! - `storefront_*` - Cart, checkout, and service endpoints

#![allow(clippy::expect_used, clippy::missing_panics_doc)]

pub mod fake_sanity;
pub mod fake_shipengine;
pub mod fake_stripe;

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use axum::Router;
use furnish_core::Email;
use secrecy::SecretString;

pub use fake_sanity::FakeSanity;
pub use fake_shipengine::FakeShipEngine;
pub use fake_stripe::FakeStripe;

/// Admin login used by every admin test.
pub const ADMIN_EMAIL: &str = "owner@furnish.test";
pub const ADMIN_PASSWORD: &str = "Walnut-Dresser-42";

/// HMAC key for the identity endpoint.
pub const IDENTITY_KEY: &str = "k7Vd2Qm9Xr4Lp8Zt";

const CONTENT_TOKEN: &str = "skq8Zr3LmN0vXt7KpW2sYb9HcF4jUe6AgD";
const SIGNING_KEY: &str = "q8Zr3LmN0vXt7KpW2sYb9HcF4jUe6AgD";
const GATEWAY_KEY: &str = "sk_test_R4nD0mK3yM4t3r1aL9xQ";

/// Key the storefront sends to the carrier API.
pub const CARRIER_KEY: &str = "TEST_c4rr13rK3y";

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local address");

    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Test server error");
    });

    format!("http://{addr}")
}

/// HTTP client that keeps cookies between requests, like a browser.
#[must_use]
pub fn browser() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

// =============================================================================
// Storefront
// =============================================================================

/// Storefront configuration pointed at the fakes.
#[must_use]
pub fn storefront_config(
    sanity: &FakeSanity,
    stripe: Option<&FakeStripe>,
) -> furnish_storefront::config::StorefrontConfig {
    use furnish_storefront::config::{SanityConfig, StorefrontConfig, StripeConfig};

    StorefrontConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        sanity: SanityConfig {
            project_id: "furnishtest".to_string(),
            dataset: "production".to_string(),
            api_version: "2025-01-01".to_string(),
            token: SecretString::from(CONTENT_TOKEN),
            api_url: Some(sanity.url().to_string()),
        },
        stripe: stripe.map(|stripe| StripeConfig {
            secret_key: SecretString::from(GATEWAY_KEY),
            api_url: stripe.url().to_string(),
        }),
        shipengine: None,
        identity_secret: Some(SecretString::from(IDENTITY_KEY)),
        blog_dir: PathBuf::from("no-blog-content"),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// Carrier settings pointed at `carrier`.
#[must_use]
pub fn shipengine_config(carrier: &FakeShipEngine) -> furnish_storefront::config::ShipEngineConfig {
    use furnish_storefront::config::{ShipEngineConfig, ShipFrom};

    ShipEngineConfig {
        api_key: SecretString::from(CARRIER_KEY),
        api_url: carrier.url().to_string(),
        carrier_ids: vec!["se-1".to_string()],
        ship_from: ShipFrom::default(),
    }
}

/// Markdown posts shipped with the storefront crate.
#[must_use]
pub fn blog_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../storefront/content/blog")
}

/// Start a storefront and return its base URL.
pub async fn spawn_storefront(sanity: &FakeSanity, stripe: Option<&FakeStripe>) -> String {
    spawn_storefront_with(storefront_config(sanity, stripe)).await
}

/// Start a storefront from an explicit configuration.
pub async fn spawn_storefront_with(config: furnish_storefront::config::StorefrontConfig) -> String {
    let state = furnish_storefront::state::AppState::new(config)
        .expect("Failed to build storefront state");
    serve(furnish_storefront::app(state, false)).await
}

// =============================================================================
// Admin
// =============================================================================

/// Admin configuration pointed at the fake content store.
#[must_use]
pub fn admin_config(sanity: &FakeSanity, lockout: Duration) -> furnish_admin::config::AdminConfig {
    use furnish_admin::config::{AdminConfig, AuthConfig, SanityConfig};

    AdminConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        base_url: "http://localhost:3001".to_string(),
        auth: AuthConfig {
            admin_email: Email::parse(ADMIN_EMAIL).expect("valid admin email"),
            admin_password: SecretString::from(ADMIN_PASSWORD),
            jwt_secret: SecretString::from(SIGNING_KEY),
            lockout,
            trusted_proxies: Vec::new(),
        },
        sanity: SanityConfig {
            project_id: "furnishtest".to_string(),
            dataset: "production".to_string(),
            api_version: "2025-01-01".to_string(),
            token: SecretString::from(CONTENT_TOKEN),
            api_url: Some(sanity.url().to_string()),
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// Start an admin server with a five minute lockout and return its base URL.
pub async fn spawn_admin(sanity: &FakeSanity) -> String {
    spawn_admin_with_lockout(sanity, Duration::from_secs(300)).await
}

/// Start an admin server with a custom lockout window.
pub async fn spawn_admin_with_lockout(sanity: &FakeSanity, lockout: Duration) -> String {
    let state = furnish_admin::state::AppState::new(admin_config(sanity, lockout))
        .expect("Failed to build admin state");
    serve(furnish_admin::app(state)).await
}

/// Log in as the configured admin on `client`.
pub async fn admin_login(client: &reqwest::Client, base_url: &str) {
    let resp = client
        .post(format!("{base_url}/api/login"))
        .json(&serde_json::json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
        .send()
        .await
        .expect("Failed to send login");
    assert_eq!(resp.status(), reqwest::StatusCode::OK, "admin login failed");
}
