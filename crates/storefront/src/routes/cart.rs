//! Cart route handlers.
//!
//! The cart lives in the visitor session. Every handler loads it, applies one
//! reducer step, saves it, and returns the new state.

use axum::{
    Json,
    extract::Path,
    http::StatusCode,
};
use furnish_core::{Cart, CartItem, Price, ProductId};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::session::{load_cart, save_cart};

/// Cart as returned to the client.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub total: Price,
    pub count: u32,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.items().to_vec(),
            total: cart.total(),
            count: cart.count(),
        }
    }
}

/// Body for adding a line.
#[derive(Debug, Deserialize)]
pub struct AddItem {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub image: Option<String>,
    /// Defaults to 1.
    #[serde(default)]
    pub quantity: Option<u32>,
}

impl From<AddItem> for CartItem {
    fn from(item: AddItem) -> Self {
        Self {
            id: item.id,
            name: item.name,
            price: item.price,
            image: item.image,
            quantity: item.quantity.unwrap_or(1),
        }
    }
}

/// Body for changing a line quantity.
#[derive(Debug, Deserialize)]
pub struct SetQuantity {
    pub quantity: u32,
}

/// Show the cart.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<Json<CartView>> {
    let cart = load_cart(&session).await?;
    Ok(Json(CartView::from(&cart)))
}

/// Add a line, merging with an existing line for the same product.
#[instrument(skip(session, item), fields(product_id = %item.id))]
pub async fn add(session: Session, Json(item): Json<AddItem>) -> Result<Json<CartView>> {
    if item.price.is_negative() {
        return Err(AppError::BadRequest("Price cannot be negative".to_string()));
    }
    let mut cart = load_cart(&session).await?;
    cart.add(item.into());
    save_cart(&session, &cart).await?;
    Ok(Json(CartView::from(&cart)))
}

/// Set a line quantity (clamped to at least 1).
#[instrument(skip(session, body))]
pub async fn update(
    session: Session,
    Path(id): Path<String>,
    Json(body): Json<SetQuantity>,
) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    if !cart.update_quantity(&ProductId::new(id), body.quantity) {
        return Err(AppError::NotFound("Item not in cart".to_string()));
    }
    save_cart(&session, &cart).await?;
    Ok(Json(CartView::from(&cart)))
}

/// Remove a line. Removing a missing line is a no-op.
#[instrument(skip(session))]
pub async fn remove(session: Session, Path(id): Path<String>) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    cart.remove(&ProductId::new(id));
    save_cart(&session, &cart).await?;
    Ok(Json(CartView::from(&cart)))
}

/// Empty the cart.
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<StatusCode> {
    let mut cart = load_cart(&session).await?;
    cart.clear();
    save_cart(&session, &cart).await?;
    Ok(StatusCode::NO_CONTENT)
}
