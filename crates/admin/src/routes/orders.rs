//! Order management handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use furnish_core::{Order, OrderId, OrderPatch, OrderStatus};
use serde::Deserialize;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct OrderFilter {
    #[serde(default)]
    pub status: Option<OrderStatus>,
}

/// Orders newest first, each line with its product image.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(_claims): RequireAdminAuth,
    Query(filter): Query<OrderFilter>,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(state.sanity().list_orders(filter.status).await?))
}

/// Change an order's status, customer, or shipping address.
#[instrument(skip(state, patch), fields(status = ?patch.status))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdminAuth(_claims): RequireAdminAuth,
    Path(id): Path<String>,
    Json(patch): Json<OrderPatch>,
) -> Result<Json<Order>> {
    patch.validate()?;
    let order = state.sanity().update_order(&OrderId::new(id), &patch).await?;
    tracing::info!(order_number = %order.order_number, status = %order.status, "Order updated");
    Ok(Json(order))
}

#[instrument(skip(state))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireAdminAuth(_claims): RequireAdminAuth,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.sanity().delete_order(&OrderId::new(id)).await?;
    tracing::info!("Order deleted");
    Ok(StatusCode::NO_CONTENT)
}
