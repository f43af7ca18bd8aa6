//! In-memory stand-in for the payment gateway's checkout session API.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Form, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde_json::{Value, json};

#[derive(Default)]
struct Sessions {
    by_id: HashMap<String, Value>,
    forms: Vec<Vec<(String, String)>>,
}

/// A running fake gateway.
#[derive(Clone)]
pub struct FakeStripe {
    url: String,
    sessions: Arc<Mutex<Sessions>>,
}

type SharedSessions = Arc<Mutex<Sessions>>;

impl FakeStripe {
    pub async fn start() -> Self {
        let sessions = Arc::new(Mutex::new(Sessions::default()));
        let router = Router::new()
            .route("/v1/checkout/sessions", post(create_session))
            .route("/v1/checkout/sessions/{id}", get(retrieve_session))
            .with_state(sessions.clone());
        let url = crate::serve(router).await;
        Self { url, sessions }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    fn lock(&self) -> MutexGuard<'_, Sessions> {
        self.sessions.lock().expect("fake gateway poisoned")
    }

    /// Simulate the customer completing payment.
    pub fn mark_paid(&self, id: &str) {
        if let Some(session) = self.lock().by_id.get_mut(id) {
            session["payment_status"] = json!("paid");
            session["url"] = Value::Null;
        }
    }

    /// Form bodies of every session created, in order.
    #[must_use]
    pub fn created_forms(&self) -> Vec<Vec<(String, String)>> {
        self.lock().forms.clone()
    }
}

async fn create_session(
    State(sessions): State<SharedSessions>,
    Form(form): Form<Vec<(String, String)>>,
) -> (StatusCode, Json<Value>) {
    let Ok(mut sessions) = sessions.lock() else {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({})));
    };

    let id = format!("cs_test_{}", sessions.forms.len() + 1);
    let metadata: serde_json::Map<String, Value> = form
        .iter()
        .filter_map(|(key, value)| {
            key.strip_prefix("metadata[")
                .and_then(|rest| rest.strip_suffix(']'))
                .map(|name| (name.to_owned(), json!(value)))
        })
        .collect();

    let session = json!({
        "id": id,
        "object": "checkout.session",
        "url": format!("https://checkout.stripe.test/pay/{id}"),
        "payment_status": "unpaid",
        "metadata": metadata,
    });
    sessions.by_id.insert(id, session.clone());
    sessions.forms.push(form);
    (StatusCode::OK, Json(session))
}

async fn retrieve_session(
    State(sessions): State<SharedSessions>,
    Path(id): Path<String>,
) -> (StatusCode, Json<Value>) {
    let Ok(sessions) = sessions.lock() else {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({})));
    };
    sessions.by_id.get(&id).map_or_else(
        || {
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": {
                    "type": "invalid_request_error",
                    "message": format!("No such checkout.session: '{id}'"),
                }})),
            )
        },
        |session| (StatusCode::OK, Json(session.clone())),
    )
}
