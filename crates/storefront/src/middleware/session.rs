//! Visitor sessions.
//!
//! Each visitor's cart, wishlist, and pending card-payment order live in an
//! in-memory tower-sessions store. Sessions expire after 30 days without a
//! request and do not survive a restart.

use furnish_core::{Cart, OrderId, Wishlist};
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer, session};

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "furnish_session";

/// Inactivity expiry in seconds (30 days).
const SESSION_EXPIRY_SECONDS: i64 = 30 * 24 * 60 * 60;

/// Session keys.
pub mod keys {
    pub const CART: &str = "cart";
    pub const WISHLIST: &str = "wishlist";
    /// Order awaiting card payment.
    pub const PENDING_ORDER: &str = "pending_order";
}

/// Create the session layer with an in-memory store.
#[must_use]
pub fn create_session_layer(config: &StorefrontConfig) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_https())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// The visitor's cart, empty if none has been saved yet.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn load_cart(session: &Session) -> Result<Cart, session::Error> {
    Ok(session.get::<Cart>(keys::CART).await?.unwrap_or_default())
}

/// Persist the visitor's cart.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn save_cart(session: &Session, cart: &Cart) -> Result<(), session::Error> {
    session.insert(keys::CART, cart).await
}

/// The visitor's wishlist, empty if none has been saved yet.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn load_wishlist(session: &Session) -> Result<Wishlist, session::Error> {
    Ok(session
        .get::<Wishlist>(keys::WISHLIST)
        .await?
        .unwrap_or_default())
}

/// Persist the visitor's wishlist.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn save_wishlist(session: &Session, wishlist: &Wishlist) -> Result<(), session::Error> {
    session.insert(keys::WISHLIST, wishlist).await
}

/// Remember the order a card payment is for.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn set_pending_order(session: &Session, id: &OrderId) -> Result<(), session::Error> {
    session.insert(keys::PENDING_ORDER, id).await
}

/// The pending card-payment order, left in place.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn pending_order(session: &Session) -> Result<Option<OrderId>, session::Error> {
    session.get::<OrderId>(keys::PENDING_ORDER).await
}

/// Take the pending card-payment order, clearing it.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn take_pending_order(session: &Session) -> Result<Option<OrderId>, session::Error> {
    session.remove::<OrderId>(keys::PENDING_ORDER).await
}
