//! Sales and inventory analytics.

use axum::{Json, extract::State};
use furnish_core::{InventoryLevel, SalesPoint};
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

/// Monthly sales, oldest month first.
#[instrument(skip_all)]
pub async fn sales(
    State(state): State<AppState>,
    RequireAdminAuth(_claims): RequireAdminAuth,
) -> Result<Json<Vec<SalesPoint>>> {
    let orders = state.sanity().list_orders(None).await?;
    Ok(Json(SalesPoint::monthly(&orders)))
}

/// The four best-stocked products against a nominal capacity.
#[instrument(skip_all)]
pub async fn inventory(
    State(state): State<AppState>,
    RequireAdminAuth(_claims): RequireAdminAuth,
) -> Result<Json<Vec<InventoryLevel>>> {
    let products = state.sanity().list_products().await?;
    Ok(Json(InventoryLevel::top(&products)))
}
