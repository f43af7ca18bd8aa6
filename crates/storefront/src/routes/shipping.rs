//! Shipping helper handlers proxying the carrier API.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::shipengine::ShipEngineClient;
use crate::state::AppState;

fn carrier(state: &AppState) -> Result<&ShipEngineClient> {
    state
        .shipengine()
        .ok_or(AppError::NotConfigured("Shipping is not configured"))
}

/// Body for a rate quote.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateRequest {
    pub ship_to_address: Value,
    pub packages: Value,
}

/// Quote rates from the warehouse to an address.
#[instrument(skip_all)]
pub async fn get_rates(
    State(state): State<AppState>,
    Json(body): Json<RateRequest>,
) -> Result<Json<Value>> {
    let client = carrier(&state)?;
    if !body.packages.is_array() {
        return Err(AppError::BadRequest("packages must be an array".to_string()));
    }
    let rates = client.get_rates(body.ship_to_address, body.packages).await?;
    Ok(Json(rates))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelRequest {
    #[serde(default)]
    pub rate_id: String,
}

/// Buy a label for a quoted rate.
#[instrument(skip(state, body), fields(rate_id = %body.rate_id))]
pub async fn create_label(
    State(state): State<AppState>,
    Json(body): Json<LabelRequest>,
) -> Result<Json<Value>> {
    let client = carrier(&state)?;
    if body.rate_id.trim().is_empty() {
        return Err(AppError::BadRequest("Missing rateId".to_string()));
    }
    let label = client.create_label(body.rate_id.trim()).await?;
    Ok(Json(label))
}

/// Tracking events for a label.
#[instrument(skip(state))]
pub async fn tracking(
    State(state): State<AppState>,
    Path(label_id): Path<String>,
) -> Result<Json<Value>> {
    let tracking = carrier(&state)?.track_label(&label_id).await?;
    Ok(Json(tracking))
}
