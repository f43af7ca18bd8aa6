//! Content store (Sanity) client.
//!
//! Products, orders, and reviews live in the content store. Reads are GROQ
//! queries over HTTP and are cached for five minutes; writes go through the
//! mutation endpoint and invalidate the cache.
//!
//! # Example
//!
//! ```rust,ignore
//! use furnish_storefront::sanity::SanityClient;
//!
//! let client = SanityClient::new(&config.sanity);
//! let products = client.list_products(&ProductFilter::default()).await?;
//! ```

mod client;
mod queries;

pub use client::SanityClient;
pub use queries::ProductFilter;

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
}

/// One entry in a mutation transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Mutation {
    /// Create a document. The value must carry `_type`.
    Create(Value),
    /// Patch an existing document.
    Patch(Patch),
    /// Delete a document by id.
    Delete {
        /// Document id.
        id: String,
    },
}

impl Mutation {
    /// Create a document of `doc_type` from any serializable record.
    ///
    /// # Errors
    ///
    /// Returns an error if `doc` does not serialize to a JSON object.
    pub fn create(doc_type: &str, doc: &impl Serialize) -> Result<Self, SanityError> {
        let mut value = serde_json::to_value(doc)?;
        let Value::Object(map) = &mut value else {
            return Err(SanityError::Api {
                status: 400,
                message: format!("{doc_type} document must be a JSON object"),
            });
        };
        map.insert("_type".to_owned(), Value::String(doc_type.to_owned()));
        Ok(Self::Create(value))
    }

    /// Set fields on a document.
    #[must_use]
    pub fn set(id: impl Into<String>, set: Map<String, Value>) -> Self {
        Self::Patch(Patch {
            id: id.into(),
            set: Some(set),
            ..Patch::default()
        })
    }

    /// Delete a document.
    #[must_use]
    pub fn delete(id: impl Into<String>) -> Self {
        Self::Delete { id: id.into() }
    }
}

/// Patch operations on one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Patch {
    /// Document id.
    pub id: String,
    /// Fields to overwrite.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set: Option<Map<String, Value>>,
    /// Numeric fields to decrement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dec: Option<Map<String, Value>>,
    /// Only apply when the document is still at this revision.
    #[serde(rename = "ifRevisionID", skip_serializing_if = "Option::is_none")]
    pub if_revision_id: Option<String>,
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
    /// Present when the request asked for `returnDocuments`.
    #[serde(default)]
    pub document: Option<Value>,
}

impl MutationResponse {
    /// The first returned document, decoded into `T`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no document came back, or a parse error.
    pub fn first_document<T: serde::de::DeserializeOwned>(self) -> Result<T, SanityError> {
        let document = self
            .results
            .into_iter()
            .find_map(|result| result.document)
            .ok_or_else(|| SanityError::NotFound("mutation returned no document".to_string()))?;
        Ok(serde_json::from_value(document)?)
    }
}
