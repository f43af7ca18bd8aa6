//! Product management handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use furnish_core::{Product, ProductId, ProductPatch};
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

/// All products, newest first.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(_claims): RequireAdminAuth,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.sanity().list_products().await?))
}

/// Apply a partial edit and return the stored product.
#[instrument(skip(state, patch))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdminAuth(_claims): RequireAdminAuth,
    Path(id): Path<String>,
    Json(patch): Json<ProductPatch>,
) -> Result<Json<Product>> {
    patch.validate()?;
    let product = state
        .sanity()
        .update_product(&ProductId::new(id), &patch)
        .await?;
    tracing::info!(product_id = %product.id, "Product updated");
    Ok(Json(product))
}

#[instrument(skip(state))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireAdminAuth(_claims): RequireAdminAuth,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.sanity().delete_product(&ProductId::new(id)).await?;
    tracing::info!("Product deleted");
    Ok(StatusCode::NO_CONTENT)
}
