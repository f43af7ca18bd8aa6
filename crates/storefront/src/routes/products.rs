//! Catalog and review route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use furnish_core::{NewReview, Product, ProductDetail, ProductDraft, ProductId, Review, ReviewId};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::sanity::ProductFilter;
use crate::state::AppState;

/// List products, newest first.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<Vec<Product>>> {
    let products = state.sanity().list_products(&filter).await?;
    Ok(Json(products))
}

/// Product detail with reviews.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ProductDetail>> {
    let detail = state.sanity().product_by_slug(&slug).await?;
    Ok(Json(detail))
}

/// Validate a product submission.
///
/// The draft is checked and echoed back; nothing is written to the content
/// store.
#[instrument(skip(draft), fields(title = %draft.title))]
pub async fn create(Json(draft): Json<ProductDraft>) -> Result<impl IntoResponse> {
    draft.validate()?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Product added", "product": draft })),
    ))
}

/// Add a review to a product.
#[instrument(skip(state, review))]
pub async fn create_review(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    Json(review): Json<NewReview>,
) -> Result<(StatusCode, Json<Review>)> {
    review.validate()?;
    let product_id = ProductId::new(product_id);
    // 404 before writing a review that would dangle
    state.sanity().product_by_id(&product_id).await?;
    let review = state.sanity().create_review(&product_id, &review).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// Body for editing a review.
#[derive(Debug, Deserialize)]
pub struct ReviewEdit {
    #[serde(default)]
    pub text: String,
}

/// Replace the text of a review.
#[instrument(skip(state, edit))]
pub async fn update_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(edit): Json<ReviewEdit>,
) -> Result<Json<Review>> {
    if edit.text.trim().is_empty() {
        return Err(AppError::BadRequest("Review text is required".to_string()));
    }
    let review = state
        .sanity()
        .update_review(&ReviewId::new(id), &edit.text)
        .await?;
    Ok(Json(review))
}

/// Delete a review.
#[instrument(skip(state))]
pub async fn delete_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.sanity().delete_review(&ReviewId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
