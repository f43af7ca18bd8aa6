//! In-memory stand-in for the content store HTTP API.
//!
//! Understands just enough GROQ for the queries the binaries send: a
//! `_type` filter, the `$id`, `$slug`, `$email`, `$status`, `$category` and
//! `$featured` parameters, `[0]`, `._id` and `count(...)`. Projections are
//! ignored, so seeded documents should already have the projected shape.
//!
//! The listen endpoint sends `welcome`, one `mutation` per change queued
//! with [`FakeSanity::queue_change`], then `disconnect`, and closes. The body
//! goes out in pieces cut inside every multi-byte character, with a pause
//! between pieces, so clients must reassemble characters across chunks.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_stream::stream;
use axum::{
    Json, Router,
    body::Body,
    extract::{Query, State},
    http::{StatusCode, header::CONTENT_TYPE},
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::{Map, Value, json};

#[derive(Default)]
struct Store {
    documents: Vec<Value>,
    mutations: Vec<Value>,
    pending_changes: Vec<String>,
    sequence: u64,
}

impl Store {
    fn next(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }
}

/// A running fake content store.
#[derive(Clone)]
pub struct FakeSanity {
    url: String,
    store: Arc<Mutex<Store>>,
}

impl FakeSanity {
    /// Start an empty store.
    pub async fn start() -> Self {
        let store = Arc::new(Mutex::new(Store::default()));
        let router = Router::new()
            .route("/{version}/data/query/{dataset}", get(query))
            .route("/{version}/data/mutate/{dataset}", post(mutate))
            .route("/{version}/data/listen/{dataset}", get(listen))
            .with_state(store.clone());
        let url = crate::serve(router).await;
        Self { url, store }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().expect("fake content store poisoned")
    }

    /// Add a document. It must carry `_id` and `_type`.
    pub fn seed(&self, document: Value) {
        let mut store = self.lock();
        let mut document = document;
        let rev = format!("rev-{}", store.next());
        document["_rev"] = Value::String(rev);
        store.documents.push(document);
    }

    /// Current copy of a document.
    #[must_use]
    pub fn document(&self, id: &str) -> Option<Value> {
        self.lock()
            .documents
            .iter()
            .find(|doc| doc["_id"] == id)
            .cloned()
    }

    /// All documents of one type, in insertion order.
    #[must_use]
    pub fn documents_of(&self, doc_type: &str) -> Vec<Value> {
        self.lock()
            .documents
            .iter()
            .filter(|doc| doc["_type"] == doc_type)
            .cloned()
            .collect()
    }

    /// Announce a change of `id` to the next listener.
    pub fn queue_change(&self, id: &str) {
        self.lock().pending_changes.push(id.to_owned());
    }

    /// Every mutation received so far, as sent.
    #[must_use]
    pub fn mutations(&self) -> Vec<Value> {
        self.lock().mutations.clone()
    }
}

type SharedStore = Arc<Mutex<Store>>;

async fn query(
    State(store): State<SharedStore>,
    Query(args): Query<Vec<(String, String)>>,
) -> (StatusCode, Json<Value>) {
    let mut groq = String::new();
    let mut params = HashMap::new();
    for (name, value) in args {
        if name == "query" {
            groq = value;
        } else if let Some(param) = name.strip_prefix('$') {
            let parsed = serde_json::from_str(&value).unwrap_or(Value::String(value));
            params.insert(param.to_owned(), parsed);
        }
    }

    let Ok(store) = store.lock() else {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({})));
    };
    let result = evaluate(&store.documents, &groq, &params);
    (StatusCode::OK, Json(json!({ "ms": 1, "query": groq, "result": result })))
}

async fn listen(State(store): State<SharedStore>) -> impl IntoResponse {
    let changes = store
        .lock()
        .map(|mut store| std::mem::take(&mut store.pending_changes))
        .unwrap_or_default();

    let mut body = String::from(": stream opened\n\nevent: welcome\ndata: {\"listenerName\":\"fake\"}\n\n");
    for id in changes {
        let data = json!({
            "documentId": id,
            "transition": "update",
            "identity": "Jos\u{e9} Fern\u{e1}ndez",
        });
        body.push_str(&format!("event: mutation\ndata: {data}\n\n"));
    }
    body.push_str("event: disconnect\ndata: {\"reason\":\"fake store closed\"}\n\n");

    let pieces = split_characters(body.as_bytes());
    let chunks = stream! {
        for piece in pieces {
            yield Ok::<_, Infallible>(piece);
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    };

    ([(CONTENT_TYPE, "text/event-stream")], Body::from_stream(chunks))
}

/// Cut after the lead byte of every multi-byte character.
fn split_characters(body: &[u8]) -> Vec<Vec<u8>> {
    let mut pieces = Vec::new();
    let mut current = Vec::new();
    for &byte in body {
        current.push(byte);
        if byte >= 0xC0 {
            pieces.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

fn document_type(groq: &str) -> Option<&str> {
    let start = groq.find(r#"_type == ""#)? + r#"_type == ""#.len();
    let len = groq.get(start..)?.find('"')?;
    groq.get(start..start + len)
}

fn evaluate(documents: &[Value], groq: &str, params: &HashMap<String, Value>) -> Value {
    let doc_type = document_type(groq);
    let param = |name: &str| params.get(name).filter(|v| !v.is_null());

    let matches: Vec<&Value> = documents
        .iter()
        .filter(|doc| doc_type.is_none_or(|t| doc["_type"] == t))
        .filter(|doc| !groq.contains("_id == $id") || param("id").is_some_and(|id| doc["_id"] == *id))
        .filter(|doc| {
            !groq.contains("slug.current == $slug")
                || param("slug").is_some_and(|slug| doc["slug"] == *slug)
        })
        .filter(|doc| {
            !groq.contains("customer.email == $email")
                || param("email").is_some_and(|email| doc["customer"]["email"] == *email)
        })
        .filter(|doc| param("status").is_none_or(|status| doc["status"] == *status))
        .filter(|doc| param("category").is_none_or(|category| doc["category"] == *category))
        .filter(|doc| {
            param("featured").is_none_or(|featured| {
                featured != &Value::Bool(true) || doc["isFeaturedProduct"] == true
            })
        })
        .collect();

    if groq.starts_with("count(") {
        json!(matches.len())
    } else if groq.contains("]._id") {
        Value::Array(matches.iter().map(|doc| doc["_id"].clone()).collect())
    } else if groq.contains("][0]") {
        matches.first().map_or(Value::Null, |doc| (*doc).clone())
    } else {
        Value::Array(matches.into_iter().cloned().collect())
    }
}

async fn mutate(
    State(store): State<SharedStore>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let Ok(mut store) = store.lock() else {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({})));
    };
    let mutations = body["mutations"].as_array().cloned().unwrap_or_default();

    // Apply to a copy so a failing mutation leaves the store untouched.
    let mut documents = store.documents.clone();
    let mut results = Vec::new();
    for mutation in &mutations {
        let seq = store.next();
        match apply(&mut documents, mutation, seq) {
            Ok(result) => results.push(result),
            Err((status, description)) => {
                return (
                    status,
                    Json(json!({ "error": { "description": description } })),
                );
            }
        }
    }

    store.documents = documents;
    store.mutations.extend(mutations);
    let transaction = store.next();
    (
        StatusCode::OK,
        Json(json!({ "transactionId": format!("tx-{transaction}"), "results": results })),
    )
}

fn apply(documents: &mut Vec<Value>, mutation: &Value, seq: u64) -> Result<Value, (StatusCode, String)> {
    if let Some(create) = mutation.get("create") {
        let mut doc = create.clone();
        let doc_type = doc["_type"].as_str().unwrap_or("document").to_owned();
        let id = doc["_id"]
            .as_str()
            .map_or_else(|| format!("{doc_type}-{seq}"), str::to_owned);
        doc["_id"] = Value::String(id.clone());
        doc["_rev"] = Value::String(format!("rev-{seq}"));
        documents.push(doc.clone());
        return Ok(json!({ "id": id, "operation": "create", "document": doc }));
    }

    if let Some(patch) = mutation.get("patch") {
        let id = patch["id"].as_str().unwrap_or_default();
        let doc = documents
            .iter_mut()
            .find(|doc| doc["_id"] == id)
            .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Document {id} not found")))?;

        if let Some(rev) = patch.get("ifRevisionID").and_then(Value::as_str)
            && doc["_rev"] != rev
        {
            return Err((StatusCode::CONFLICT, format!("Revision mismatch on {id}")));
        }
        if let Some(set) = patch.get("set").and_then(Value::as_object) {
            for (path, value) in set {
                set_path(doc, path, value.clone());
            }
        }
        if let Some(dec) = patch.get("dec").and_then(Value::as_object) {
            for (field, by) in dec {
                let current = doc[field.as_str()].as_i64().unwrap_or(0);
                doc[field.as_str()] = json!(current - by.as_i64().unwrap_or(0));
            }
        }
        doc["_rev"] = Value::String(format!("rev-{seq}"));
        return Ok(json!({ "id": id, "operation": "update", "document": doc.clone() }));
    }

    if let Some(delete) = mutation.get("delete") {
        let id = delete["id"].as_str().unwrap_or_default().to_owned();
        documents.retain(|doc| doc["_id"] != id.as_str());
        return Ok(json!({ "id": id, "operation": "delete" }));
    }

    Err((StatusCode::BAD_REQUEST, "Unknown mutation".to_string()))
}

/// Set a dotted path such as `customer.email`, creating objects on the way.
fn set_path(doc: &mut Value, path: &str, value: Value) {
    let mut target = doc;
    let mut parts = path.split('.').peekable();
    while let Some(part) = parts.next() {
        if !target.is_object() {
            *target = Value::Object(Map::new());
        }
        if parts.peek().is_none() {
            target[part] = value;
            return;
        }
        target = &mut target[part];
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn docs() -> Vec<Value> {
        vec![
            json!({"_id": "p1", "_type": "shopProduct", "slug": "oak-table", "isFeaturedProduct": true}),
            json!({"_id": "p2", "_type": "shopProduct", "slug": "pine-bed"}),
            json!({"_id": "o1", "_type": "order", "status": "Pending", "customer": {"email": "a@b.co"}}),
        ]
    }

    #[test]
    fn test_evaluate_by_id_and_type() {
        let params = HashMap::from([("id".to_string(), json!("p2"))]);
        let found = evaluate(&docs(), r#"*[_type == "shopProduct" && _id == $id][0]{ _id }"#, &params);
        assert_eq!(found["slug"], "pine-bed");

        let missing = HashMap::from([("id".to_string(), json!("nope"))]);
        let none = evaluate(&docs(), r#"*[_type == "shopProduct" && _id == $id][0]{ _id }"#, &missing);
        assert!(none.is_null());
    }

    #[test]
    fn test_evaluate_count_and_ids() {
        let count = evaluate(&docs(), r#"count(*[_type == "shopProduct"])"#, &HashMap::new());
        assert_eq!(count, json!(2));

        let params = HashMap::from([("email".to_string(), json!("a@b.co"))]);
        let ids = evaluate(
            &docs(),
            r#"*[_type == "order" && customer.email == $email]._id"#,
            &params,
        );
        assert_eq!(ids, json!(["o1"]));
    }

    #[test]
    fn test_split_characters_cuts_inside_each_character() {
        let pieces = split_characters("a\u{e9}b\u{e1}".as_bytes());
        assert_eq!(pieces.len(), 3);
        assert!(pieces.iter().take(2).all(|p| std::str::from_utf8(p).is_err()));
        assert_eq!(pieces.concat(), "a\u{e9}b\u{e1}".as_bytes());
    }

    #[test]
    fn test_set_path_nested() {
        let mut doc = json!({"customer": {"email": "a@b.co"}});
        set_path(&mut doc, "customer.firstName", json!("Ada"));
        assert_eq!(doc["customer"]["firstName"], "Ada");
        assert_eq!(doc["customer"]["email"], "a@b.co");
    }

    #[test]
    fn test_revision_mismatch_rejected() {
        let mut documents = vec![json!({"_id": "p1", "_rev": "rev-1", "stockLevel": 3})];
        let patch = json!({"patch": {"id": "p1", "ifRevisionID": "rev-0", "set": {"stockLevel": 1}}});
        let err = apply(&mut documents, &patch, 2).unwrap_err();
        assert_eq!(err.0, StatusCode::CONFLICT);
        assert_eq!(documents[0]["stockLevel"], 3);
    }
}
