//! Carrier rate API (ShipEngine) client.
//!
//! The storefront proxies rate quotes, label purchase, and tracking. Upstream
//! payloads are passed through as JSON without reshaping.

use std::sync::Arc;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::instrument;

use crate::config::{ShipEngineConfig, ShipFrom};

/// Errors that can occur when talking to the carrier API.
#[derive(Debug, Error)]
pub enum ShipEngineError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the carrier API.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Failed to parse the response.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The response lacked an expected field.
    #[error("Missing field in response: {0}")]
    MissingField(&'static str),

    /// Rate limited by the carrier API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),
}

/// Ship-from address in the carrier API's wire shape.
#[derive(Debug, Serialize)]
struct WireAddress<'a> {
    name: &'a str,
    phone: &'a str,
    address_line1: &'a str,
    city_locality: &'a str,
    state_province: &'a str,
    postal_code: &'a str,
    country_code: &'a str,
    address_residential_indicator: &'static str,
}

impl<'a> From<&'a ShipFrom> for WireAddress<'a> {
    fn from(from: &'a ShipFrom) -> Self {
        Self {
            name: &from.name,
            phone: &from.phone,
            address_line1: &from.address_line1,
            city_locality: &from.city_locality,
            state_province: &from.state_province,
            postal_code: &from.postal_code,
            country_code: &from.country_code,
            // The warehouse is a commercial address.
            address_residential_indicator: "no",
        }
    }
}

/// Client for the carrier API.
#[derive(Clone)]
pub struct ShipEngineClient {
    inner: Arc<ShipEngineClientInner>,
}

struct ShipEngineClientInner {
    client: reqwest::Client,
    api_url: String,
    api_key: SecretString,
    carrier_ids: Vec<String>,
    ship_from: ShipFrom,
}

impl ShipEngineClient {
    /// Create a new carrier API client.
    #[must_use]
    pub fn new(config: &ShipEngineConfig) -> Self {
        Self {
            inner: Arc::new(ShipEngineClientInner {
                client: reqwest::Client::new(),
                api_url: config.api_url.trim_end_matches('/').to_owned(),
                api_key: config.api_key.clone(),
                carrier_ids: config.carrier_ids.clone(),
                ship_from: config.ship_from.clone(),
            }),
        }
    }

    /// Build the rate request body for a destination and package list.
    fn rates_body(&self, ship_to: Value, packages: Value) -> Value {
        json!({
            "shipment": {
                "ship_to": ship_to,
                "ship_from": WireAddress::from(&self.inner.ship_from),
                "packages": packages,
            },
            "rate_options": {
                "carrier_ids": self.inner.carrier_ids,
            },
        })
    }

    /// Quote rates for a shipment from the warehouse.
    ///
    /// Returns the `rate_response` object from the carrier API.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response has no
    /// `rate_response`.
    #[instrument(skip(self, ship_to, packages))]
    pub async fn get_rates(&self, ship_to: Value, packages: Value) -> Result<Value, ShipEngineError> {
        let body = self.rates_body(ship_to, packages);
        let mut response = self.post("/v1/rates", &body).await?;
        match response.get_mut("rate_response") {
            Some(rates) => Ok(rates.take()),
            None => Err(ShipEngineError::MissingField("rate_response")),
        }
    }

    /// Purchase a label for a previously quoted rate.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the rate is rejected.
    #[instrument(skip(self))]
    pub async fn create_label(&self, rate_id: &str) -> Result<Value, ShipEngineError> {
        self.post(
            &format!("/v1/labels/rates/{}", urlencoding::encode(rate_id)),
            &json!({}),
        )
        .await
    }

    /// Tracking information for a purchased label.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the label is unknown.
    #[instrument(skip(self))]
    pub async fn track_label(&self, label_id: &str) -> Result<Value, ShipEngineError> {
        let response = self
            .inner
            .client
            .get(format!(
                "{}/v1/labels/{}/track",
                self.inner.api_url,
                urlencoding::encode(label_id)
            ))
            .header("API-Key", self.inner.api_key.expose_secret())
            .send()
            .await?;
        read_json(response).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, ShipEngineError> {
        let response = self
            .inner
            .client
            .post(format!("{}{path}", self.inner.api_url))
            .header("API-Key", self.inner.api_key.expose_secret())
            .json(body)
            .send()
            .await?;
        read_json(response).await
    }
}

async fn read_json(response: reqwest::Response) -> Result<Value, ShipEngineError> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(1);
        tracing::warn!(retry_after, "Carrier API rate limit hit");
        return Err(ShipEngineError::RateLimited(retry_after));
    }

    let body = response.text().await?;
    if !status.is_success() {
        tracing::error!(
            status = %status,
            body = %body.chars().take(500).collect::<String>(),
            "Carrier API returned non-success status"
        );
        return Err(ShipEngineError::Api {
            status: status.as_u16(),
            message: body.chars().take(200).collect(),
        });
    }

    Ok(serde_json::from_str(&body)?)
}
