//! Dashboard overview and admin profile.

use axum::{Json, extract::State};
use furnish_core::{Customer, DashboardTotals, Order};
use serde::Serialize;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

const RECENT_ORDERS: usize = 5;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    #[serde(flatten)]
    pub totals: DashboardTotals,
    pub total_products: usize,
    pub recent_orders: Vec<Order>,
}

/// Headline numbers plus the five newest orders.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    RequireAdminAuth(_claims): RequireAdminAuth,
) -> Result<Json<DashboardView>> {
    let sanity = state.sanity();
    let (mut orders, total_products) =
        tokio::try_join!(sanity.list_orders(None), sanity.count_products())?;

    let totals = DashboardTotals::from_orders(&orders);
    orders.truncate(RECENT_ORDERS);

    Ok(Json(DashboardView {
        totals,
        total_products,
        recent_orders: orders,
    }))
}

#[derive(Debug, Serialize)]
pub struct ProfileStats {
    pub products: usize,
    pub orders: usize,
    pub customers: usize,
}

#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub email: String,
    pub role: String,
    pub stats: ProfileStats,
}

/// The signed-in administrator and store counts.
#[instrument(skip_all)]
pub async fn profile(
    State(state): State<AppState>,
    RequireAdminAuth(claims): RequireAdminAuth,
) -> Result<Json<ProfileView>> {
    let sanity = state.sanity();
    let (orders, products) =
        tokio::try_join!(sanity.list_orders(None), sanity.count_products())?;

    Ok(Json(ProfileView {
        email: claims.email,
        role: claims.role,
        stats: ProfileStats {
            products,
            orders: orders.len(),
            customers: Customer::from_orders(&orders).len(),
        },
    }))
}
