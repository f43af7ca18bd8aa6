//! Checkout, order placement, and payment return handlers.

use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header::ORIGIN},
};
use chrono::Utc;
use furnish_core::{
    Cart, CheckoutForm, NewOrder, OrderError, OrderId, OrderStatus, PaymentMethod, Price,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::session::{
    load_cart, pending_order, save_cart, set_pending_order, take_pending_order,
};
use crate::state::AppState;
use crate::stripe::{LineItem, NewCheckoutSession, StripeClient};

const STRIPE_NOT_CONFIGURED: &str = "Stripe is not configured";

/// Metadata key linking a payment session to its order.
const ORDER_ID_METADATA: &str = "order_id";

/// Site origin for redirect URLs: the request `Origin` header when present,
/// else the configured base URL.
fn origin(headers: &HeaderMap, state: &AppState) -> String {
    headers
        .get(ORIGIN)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && *v != "null")
        .unwrap_or(state.config().base_url.as_str())
        .trim_end_matches('/')
        .to_owned()
}

fn stripe(state: &AppState) -> Result<&StripeClient> {
    state
        .stripe()
        .ok_or(AppError::NotConfigured(STRIPE_NOT_CONFIGURED))
}

fn hosted_session(origin: &str, line_items: Vec<LineItem>) -> NewCheckoutSession {
    NewCheckoutSession {
        line_items,
        success_url: format!("{origin}/success?session_id={{CHECKOUT_SESSION_ID}}"),
        cancel_url: format!("{origin}/checkout"),
        ..NewCheckoutSession::default()
    }
}

fn cart_line_items(cart: &Cart) -> Vec<LineItem> {
    cart.items()
        .iter()
        .map(|item| LineItem {
            name: item.name.clone(),
            unit_price: item.price,
            quantity: item.quantity,
            image: item.image.clone(),
        })
        .collect()
}

// =============================================================================
// POST /api/orders
// =============================================================================

/// Body for placing an order.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrder {
    #[serde(default)]
    pub form: CheckoutForm,
    pub payment_method: PaymentMethod,
}

/// Result of placing an order.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    pub order_id: OrderId,
    pub order_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

/// Validate the checkout form, record the order, then either hand off to the
/// payment gateway or complete a cash-on-delivery order.
#[instrument(skip(state, session, headers, body), fields(payment_method = ?body.payment_method))]
pub async fn place_order(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Json(body): Json<PlaceOrder>,
) -> Result<(StatusCode, Json<PlacedOrder>)> {
    let checkout = body.form.validate()?;

    let mut cart = load_cart(&session).await?;
    let gateway = if body.payment_method.uses_gateway() {
        Some(stripe(&state)?)
    } else {
        None
    };

    let customer_email = checkout.customer.email.to_string();
    let new_order = NewOrder::from_checkout(checkout, &cart, body.payment_method, Utc::now())
        .map_err(|e| match e {
            OrderError::EmptyCart => AppError::BadRequest("Cart is empty".to_string()),
        })?;

    let order = state.sanity().create_order(new_order).await?;
    tracing::info!(order_id = %order.id, order_number = %order.order_number, "Order created");
    add_breadcrumb(
        "checkout",
        "Order created",
        Some(&[("order_id", order.id.as_str())]),
    );

    let Some(gateway) = gateway else {
        cart.clear();
        save_cart(&session, &cart).await?;
        return Ok((
            StatusCode::CREATED,
            Json(PlacedOrder {
                order_id: order.id,
                order_number: order.order_number,
                redirect_url: None,
                session_id: None,
                message: Some("Order placed successfully"),
            }),
        ));
    };

    let mut request = hosted_session(&origin(&headers, &state), cart_line_items(&cart));
    request.customer_email = Some(customer_email);
    request.metadata = vec![(ORDER_ID_METADATA.to_owned(), order.id.to_string())];

    let checkout_session = gateway.create_checkout_session(&request).await?;
    set_pending_order(&session, &order.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(PlacedOrder {
            order_id: order.id,
            order_number: order.order_number,
            redirect_url: checkout_session.url,
            session_id: Some(checkout_session.id),
            message: None,
        }),
    ))
}

// =============================================================================
// POST /api/checkout
// =============================================================================

/// One item in a payment session request.
#[derive(Debug, Deserialize)]
pub struct CheckoutItem {
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub quantity: Option<u32>,
}

/// Body for creating a payment session.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub items: Vec<CheckoutItem>,
}

/// A created payment session.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub session_id: String,
    pub url: Option<String>,
}

/// Create a hosted payment session for a list of items.
#[instrument(skip(state, headers, body), fields(items = body.items.len()))]
pub async fn create_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>> {
    let gateway = stripe(&state)?;
    if body.items.is_empty() {
        return Err(AppError::BadRequest("No items provided".to_string()));
    }
    if body.items.iter().any(|item| item.price.is_negative()) {
        return Err(AppError::BadRequest("Price cannot be negative".to_string()));
    }

    let line_items = body
        .items
        .into_iter()
        .map(|item| LineItem {
            name: item.name,
            unit_price: item.price,
            quantity: item.quantity.unwrap_or(1).max(1),
            image: item.image,
        })
        .collect();

    let checkout_session = gateway
        .create_checkout_session(&hosted_session(&origin(&headers, &state), line_items))
        .await?;

    Ok(Json(CheckoutResponse {
        session_id: checkout_session.id,
        url: checkout_session.url,
    }))
}

// =============================================================================
// GET /api/checkout/success
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct SuccessQuery {
    pub session_id: Option<String>,
}

/// Outcome of a payment return.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOutcome {
    pub paid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
}

/// Confirm a payment after the gateway redirects back.
///
/// A paid session only settles the order this visitor is waiting on: the
/// order id in the session metadata must match the visitor's pending order.
/// Then the cart is cleared and the order moves to `Processing`, once. A
/// paid session without an order (from `POST /api/checkout`) just clears the
/// cart. An unpaid or foreign session changes nothing.
#[instrument(skip(state, session))]
pub async fn success(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<SuccessQuery>,
) -> Result<Json<PaymentOutcome>> {
    let gateway = stripe(&state)?;
    let session_id = query
        .session_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing session_id".to_string()))?;

    let checkout_session = gateway.retrieve_checkout_session(&session_id).await?;
    if !checkout_session.is_paid() {
        tracing::info!(payment_status = %checkout_session.payment_status, "Payment not completed");
        return Ok(Json(PaymentOutcome {
            paid: false,
            order_id: None,
        }));
    }

    let paid_order = checkout_session
        .metadata
        .get(ORDER_ID_METADATA)
        .map(|id| OrderId::new(id.as_str()));

    let order_id = match paid_order {
        Some(paid) => {
            if pending_order(&session).await?.as_ref() != Some(&paid) {
                tracing::warn!(order_id = %paid, "Paid session is not this visitor's pending order");
                return Ok(Json(PaymentOutcome {
                    paid: true,
                    order_id: None,
                }));
            }
            take_pending_order(&session).await?;
            state
                .sanity()
                .set_order_status(&paid, OrderStatus::Processing)
                .await?;
            tracing::info!(order_id = %paid, "Order paid");
            Some(paid)
        }
        None => None,
    };

    let mut cart = load_cart(&session).await?;
    cart.clear();
    save_cart(&session, &cart).await?;

    Ok(Json(PaymentOutcome {
        paid: true,
        order_id,
    }))
}
