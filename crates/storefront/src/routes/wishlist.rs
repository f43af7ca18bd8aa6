//! Wishlist route handlers.

use axum::{Json, extract::Path};
use furnish_core::{ProductId, Wishlist, WishlistAction, WishlistItem};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::session::{load_wishlist, save_wishlist};

/// Wishlist plus what the request did to it.
#[derive(Debug, Serialize)]
pub struct WishlistView {
    pub items: Vec<WishlistItem>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<WishlistAction>,
}

impl WishlistView {
    fn new(wishlist: &Wishlist, status: Option<WishlistAction>) -> Self {
        Self {
            items: wishlist.items().to_vec(),
            count: wishlist.items().len(),
            status,
        }
    }
}

/// Show the wishlist.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<Json<WishlistView>> {
    let wishlist = load_wishlist(&session).await?;
    Ok(Json(WishlistView::new(&wishlist, None)))
}

/// Save a product. Saving it twice reports `already_present`.
#[instrument(skip(session, item), fields(product_id = %item.id))]
pub async fn add(session: Session, Json(item): Json<WishlistItem>) -> Result<Json<WishlistView>> {
    let mut wishlist = load_wishlist(&session).await?;
    let action = wishlist.add(item);
    if action == WishlistAction::Added {
        save_wishlist(&session, &wishlist).await?;
    }
    Ok(Json(WishlistView::new(&wishlist, Some(action))))
}

/// Remove a saved product.
#[instrument(skip(session))]
pub async fn remove(session: Session, Path(id): Path<String>) -> Result<Json<WishlistView>> {
    let mut wishlist = load_wishlist(&session).await?;
    let action = wishlist.remove(&ProductId::new(id));
    if action == WishlistAction::Removed {
        save_wishlist(&session, &wishlist).await?;
    }
    Ok(Json(WishlistView::new(&wishlist, Some(action))))
}
