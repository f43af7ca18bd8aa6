//! In-memory stand-in for the carrier rate API.
//!
//! Quotes one fixed rate, sells a label for it, and tracks that label. Every
//! request body and the `API-Key` it carried are recorded.

use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use serde_json::{Value, json};

/// Rate id quoted by [`FakeShipEngine`].
pub const RATE_ID: &str = "se-rate-1";

/// Label id sold for [`RATE_ID`].
pub const LABEL_ID: &str = "se-label-1";

#[derive(Default)]
struct Calls {
    requests: Vec<Value>,
    api_keys: Vec<String>,
}

type SharedCalls = Arc<Mutex<Calls>>;

/// A running fake carrier API.
#[derive(Clone)]
pub struct FakeShipEngine {
    url: String,
    calls: SharedCalls,
}

impl FakeShipEngine {
    pub async fn start() -> Self {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let router = Router::new()
            .route("/v1/rates", post(rates))
            .route("/v1/labels/rates/{rate_id}", post(label))
            .route("/v1/labels/{label_id}/track", get(track))
            .with_state(calls.clone());
        let url = crate::serve(router).await;
        Self { url, calls }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    fn lock(&self) -> MutexGuard<'_, Calls> {
        self.calls.lock().expect("fake carrier poisoned")
    }

    /// Bodies of every POST received, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<Value> {
        self.lock().requests.clone()
    }

    /// `API-Key` header of every request received, in order.
    #[must_use]
    pub fn api_keys(&self) -> Vec<String> {
        self.lock().api_keys.clone()
    }
}

fn record(calls: &SharedCalls, headers: &HeaderMap, body: Option<Value>) {
    if let Ok(mut calls) = calls.lock() {
        let key = headers
            .get("API-Key")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        calls.api_keys.push(key.to_owned());
        calls.requests.extend(body);
    }
}

async fn rates(
    State(calls): State<SharedCalls>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    record(&calls, &headers, Some(body));
    Json(json!({
        "shipment_id": "se-shipment-1",
        "rate_response": {
            "rates": [{
                "rate_id": RATE_ID,
                "carrier_id": "se-1",
                "service_code": "usps_priority_mail",
                "shipping_amount": { "currency": "usd", "amount": 18.4 },
                "delivery_days": 2,
            }],
            "errors": [],
        },
    }))
}

async fn label(
    State(calls): State<SharedCalls>,
    headers: HeaderMap,
    Path(rate_id): Path<String>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    record(&calls, &headers, Some(body));
    if rate_id != RATE_ID {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "errors": [{ "message": format!("Rate {rate_id} not found") }] })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "label_id": LABEL_ID,
            "status": "completed",
            "tracking_number": "9405511899223197428490",
            "label_download": { "pdf": "https://labels.test/se-label-1.pdf" },
        })),
    )
}

async fn track(
    State(calls): State<SharedCalls>,
    headers: HeaderMap,
    Path(label_id): Path<String>,
) -> (StatusCode, Json<Value>) {
    record(&calls, &headers, None);
    if label_id != LABEL_ID {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "errors": [{ "message": "Label not found" }] })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "tracking_number": "9405511899223197428490",
            "status_code": "IT",
            "events": [{ "description": "Departed USPS facility", "city_locality": "Austin" }],
        })),
    )
}
