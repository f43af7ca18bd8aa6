//! Stock adjustment handler.

use axum::{Json, extract::State};
use furnish_core::ProductId;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::sanity::SanityError;
use crate::state::AppState;

/// Body for taking units out of stock.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockUpdate {
    pub product_id: ProductId,
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockUpdated {
    pub success: bool,
    pub stock_level: i64,
}

/// Decrement a product's stock level by `quantity`.
#[instrument(skip(state, body), fields(product_id = %body.product_id, quantity = body.quantity))]
pub async fn update_stock(
    State(state): State<AppState>,
    Json(body): Json<StockUpdate>,
) -> Result<Json<StockUpdated>> {
    let quantity = u32::try_from(body.quantity)
        .ok()
        .filter(|q| *q > 0)
        .ok_or_else(|| AppError::BadRequest("Quantity must be positive".to_string()))?;

    let remaining = match state.sanity().decrement_stock(&body.product_id, quantity).await {
        Ok(remaining) => remaining,
        Err(SanityError::NotFound(_)) => {
            return Err(AppError::NotFound("Product not found".to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    let stock_level =
        remaining.ok_or_else(|| AppError::BadRequest("Insufficient stock".to_string()))?;
    tracing::info!(stock_level, "Stock updated");

    Ok(Json(StockUpdated {
        success: true,
        stock_level,
    }))
}
