//! Content store (Sanity) client for the dashboard.
//!
//! Unlike the storefront's client this one never caches: the dashboard shows
//! what the store holds right now, and the live feeds subscribe to the
//! listen endpoint for changes.

mod client;
mod listen;
mod queries;

pub use client::SanityClient;
pub use listen::ListenEvent;
pub use queries::{ORDER_TYPE, PRODUCT_TYPE, listen_filter};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors that can occur when talking to the content store.
#[derive(Debug, Error)]
pub enum SanityError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error description from the response body.
        message: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Document not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the content store.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The listen stream broke or sent something unreadable.
    #[error("Listen stream error: {0}")]
    Stream(String),
}

/// One entry in a mutation transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Mutation {
    /// Overwrite fields on an existing document.
    Patch {
        /// Document id.
        id: String,
        /// Fields to set; dotted paths reach into objects.
        set: Map<String, Value>,
    },
    /// Delete a document by id.
    Delete {
        /// Document id.
        id: String,
    },
}

impl Mutation {
    #[must_use]
    pub fn set(id: impl Into<String>, set: Map<String, Value>) -> Self {
        Self::Patch { id: id.into(), set }
    }

    #[must_use]
    pub fn delete(id: impl Into<String>) -> Self {
        Self::Delete { id: id.into() }
    }
}

/// Response from the mutation endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationResponse {
    pub transaction_id: String,
    #[serde(default)]
    pub results: Vec<MutationResult>,
}

/// Outcome for one mutation in a transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct MutationResult {
    pub id: String,
    #[serde(default)]
    pub operation: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_mutation_wire_format() {
        let mut set = Map::new();
        set.insert("customer.phone".to_owned(), json!("555-0100"));
        let mutations = vec![Mutation::set("order-1", set), Mutation::delete("product-1")];

        assert_eq!(
            serde_json::to_value(&mutations).unwrap(),
            json!([
                {"patch": {"id": "order-1", "set": {"customer.phone": "555-0100"}}},
                {"delete": {"id": "product-1"}}
            ])
        );
    }

    #[test]
    fn test_mutation_response_tolerates_missing_results() {
        let response: MutationResponse =
            serde_json::from_value(json!({"transactionId": "tx1"})).unwrap();
        assert_eq!(response.transaction_id, "tx1");
        assert!(response.results.is_empty());
    }
}
