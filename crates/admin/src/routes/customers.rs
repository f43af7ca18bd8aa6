//! Customers, derived from orders.

use axum::{
    Json,
    extract::{Path, State},
};
use furnish_core::{Customer, CustomerPatch};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

/// One customer per distinct order email, in first-seen order.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(_claims): RequireAdminAuth,
) -> Result<Json<Vec<Customer>>> {
    let orders = state.sanity().list_orders(None).await?;
    Ok(Json(Customer::from_orders(&orders)))
}

/// Edit a customer's contact details on all of their orders at once.
#[instrument(skip(state, patch))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdminAuth(_claims): RequireAdminAuth,
    Path(email): Path<String>,
    Json(patch): Json<CustomerPatch>,
) -> Result<Json<Customer>> {
    patch.validate()?;
    let updated = state.sanity().update_customer(&email, &patch).await?;
    tracing::info!(orders = updated, "Customer updated");

    let orders = state.sanity().list_orders(None).await?;
    Customer::from_orders(&orders)
        .into_iter()
        .find(|customer| customer.email.as_str() == email)
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))
}
