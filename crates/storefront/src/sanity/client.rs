//! HTTP transport for the content store.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::config::SanityConfig;

use super::{Mutation, MutationResponse, SanityError};

/// Client for the content store HTTP API.
///
/// Query results are cached for five minutes keyed by query text and
/// parameters. Any mutation through this client clears the cache.
#[derive(Clone)]
pub struct SanityClient {
    inner: Arc<SanityClientInner>,
}

struct SanityClientInner {
    client: reqwest::Client,
    query_url: String,
    mutate_url: String,
    token: SecretString,
    cache: Cache<String, Value>,
}

#[derive(Deserialize)]
struct QueryResponse {
    result: Value,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

impl SanityClient {
    /// Create a new content store client.
    #[must_use]
    pub fn new(config: &SanityConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300))
            .build();

        let root = config.api_root();
        Self {
            inner: Arc::new(SanityClientInner {
                client: reqwest::Client::new(),
                query_url: format!("{root}/data/query/{}", config.dataset),
                mutate_url: format!("{root}/data/mutate/{}", config.dataset),
                token: config.token.clone(),
                cache,
            }),
        }
    }

    /// Run a GROQ query, serving from cache when possible.
    ///
    /// Parameters are passed as `$name` query arguments with JSON-encoded
    /// values, so `("slug", json!("oak-table"))` binds `$slug`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the result does not decode.
    #[instrument(skip(self, params))]
    pub async fn query<T: DeserializeOwned>(
        &self,
        groq: &str,
        params: &[(&str, Value)],
    ) -> Result<T, SanityError> {
        let cache_key = cache_key(groq, params);
        if let Some(cached) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for query");
            return Ok(serde_json::from_value(cached)?);
        }

        let result = self.fetch(groq, params).await?;
        self.inner.cache.insert(cache_key, result.clone()).await;
        Ok(serde_json::from_value(result)?)
    }

    /// Run a list query and decode each row on its own.
    ///
    /// A row that does not decode is logged and left out, so one malformed
    /// document cannot take down the whole list.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the result is not a list.
    pub async fn query_rows<T: DeserializeOwned>(
        &self,
        groq: &str,
        params: &[(&str, Value)],
    ) -> Result<Vec<T>, SanityError> {
        let rows: Vec<Value> = self.query(groq, params).await?;
        Ok(decode_rows(rows))
    }

    /// Run a GROQ query bypassing the cache.
    ///
    /// Used where a stale read would be wrong, such as stock checks.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the result does not decode.
    #[instrument(skip(self, params))]
    pub async fn query_fresh<T: DeserializeOwned>(
        &self,
        groq: &str,
        params: &[(&str, Value)],
    ) -> Result<T, SanityError> {
        let result = self.fetch(groq, params).await?;
        Ok(serde_json::from_value(result)?)
    }

    async fn fetch(&self, groq: &str, params: &[(&str, Value)]) -> Result<Value, SanityError> {
        let mut query: Vec<(String, String)> = Vec::with_capacity(params.len() + 1);
        query.push(("query".to_owned(), groq.to_owned()));
        for (name, value) in params {
            query.push((format!("${name}"), value.to_string()));
        }

        let response = self
            .inner
            .client
            .get(&self.inner.query_url)
            .bearer_auth(self.inner.token.expose_secret())
            .query(&query)
            .send()
            .await?;

        let body = check_status(response).await?;
        let parsed: QueryResponse = serde_json::from_str(&body).inspect_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse content store query response"
            );
        })?;
        Ok(parsed.result)
    }

    /// Apply mutations in one transaction and return the resulting documents.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the store rejects the
    /// transaction.
    #[instrument(skip(self, mutations), fields(count = mutations.len()))]
    pub async fn mutate(&self, mutations: Vec<Mutation>) -> Result<MutationResponse, SanityError> {
        let response = self
            .inner
            .client
            .post(&self.inner.mutate_url)
            .bearer_auth(self.inner.token.expose_secret())
            .query(&[
                ("returnIds", "true"),
                ("returnDocuments", "true"),
                ("visibility", "sync"),
            ])
            .json(&serde_json::json!({ "mutations": mutations }))
            .send()
            .await?;

        let body = check_status(response).await?;
        self.inner.cache.invalidate_all();
        Ok(serde_json::from_str(&body)?)
    }
}

fn cache_key(groq: &str, params: &[(&str, Value)]) -> String {
    let mut key = groq.to_owned();
    for (name, value) in params {
        key.push_str(&format!("|{name}={value}"));
    }
    key
}

/// Map non-success statuses to errors and return the body text otherwise.
async fn check_status(response: reqwest::Response) -> Result<String, SanityError> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(1);
        tracing::warn!(retry_after, "Content store rate limit hit");
        return Err(SanityError::RateLimited(retry_after));
    }

    let body = response.text().await?;
    if status.is_success() {
        return Ok(body);
    }

    tracing::error!(
        status = %status,
        body = %body.chars().take(500).collect::<String>(),
        "Content store returned non-success status"
    );
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .ok()
        .and_then(|parsed| {
            parsed.message.or_else(|| {
                parsed.error.map(|error| match error {
                    Value::String(s) => s,
                    Value::Object(obj) => obj
                        .get("description")
                        .and_then(Value::as_str)
                        .map_or_else(|| Value::Object(obj.clone()).to_string(), str::to_owned),
                    other => other.to_string(),
                })
            })
        })
        .unwrap_or_else(|| body.chars().take(200).collect());

    if status == StatusCode::NOT_FOUND {
        return Err(SanityError::NotFound(message));
    }
    Err(SanityError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Decode rows one by one, skipping those that do not fit `T`.
fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row
                .get("_id")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_owned();
            serde_json::from_value(row)
                .inspect_err(|e| {
                    tracing::warn!(document_id = %id, error = %e, "Skipping malformed document");
                })
                .ok()
        })
        .collect()
}
