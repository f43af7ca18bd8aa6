//! Payment gateway (Stripe Checkout) client.
//!
//! Only the two calls the storefront needs: create a hosted checkout session
//! and read it back after the customer is redirected.

use std::collections::HashMap;
use std::sync::Arc;

use furnish_core::Price;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use crate::config::StripeConfig;

/// Errors that can occur when talking to the payment gateway.
#[derive(Debug, Error)]
pub enum StripeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway rejected the request.
    #[error("API error ({error_type}): {message}")]
    Api {
        /// Stripe error type, e.g. `invalid_request_error`.
        error_type: String,
        /// Error message.
        message: String,
    },

    /// Failed to parse the response.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Rate limited by the gateway.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),
}

#[derive(Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(rename = "type", default)]
    error_type: String,
    #[serde(default)]
    message: String,
}

/// One product line on the hosted checkout page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub name: String,
    pub unit_price: Price,
    pub quantity: u32,
    pub image: Option<String>,
}

/// Parameters for a new checkout session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCheckoutSession {
    pub line_items: Vec<LineItem>,
    pub success_url: String,
    pub cancel_url: String,
    pub customer_email: Option<String>,
    /// Key/value pairs echoed back on the session.
    pub metadata: Vec<(String, String)>,
}

impl NewCheckoutSession {
    /// Form-encode the session in the bracketed style the API expects.
    ///
    /// Amounts are in cents (`unit_amount = round(price * 100)`) and the
    /// currency is always USD.
    #[must_use]
    pub fn to_form(&self) -> Vec<(String, String)> {
        let mut form = vec![
            ("mode".to_owned(), "payment".to_owned()),
            ("payment_method_types[0]".to_owned(), "card".to_owned()),
            ("success_url".to_owned(), self.success_url.clone()),
            ("cancel_url".to_owned(), self.cancel_url.clone()),
        ];

        for (i, item) in self.line_items.iter().enumerate() {
            let prefix = format!("line_items[{i}]");
            form.push((format!("{prefix}[price_data][currency]"), "usd".to_owned()));
            form.push((
                format!("{prefix}[price_data][product_data][name]"),
                item.name.clone(),
            ));
            if let Some(image) = &item.image {
                form.push((
                    format!("{prefix}[price_data][product_data][images][0]"),
                    image.clone(),
                ));
            }
            form.push((
                format!("{prefix}[price_data][unit_amount]"),
                item.unit_price.to_minor_units().to_string(),
            ));
            form.push((format!("{prefix}[quantity]"), item.quantity.to_string()));
        }

        if let Some(email) = &self.customer_email {
            form.push(("customer_email".to_owned(), email.clone()));
        }
        for (key, value) in &self.metadata {
            form.push((format!("metadata[{key}]"), value.clone()));
        }

        form
    }
}

/// A checkout session as returned by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    /// Hosted page URL; absent once the session is complete.
    #[serde(default)]
    pub url: Option<String>,
    /// `paid`, `unpaid`, or `no_payment_required`.
    #[serde(default)]
    pub payment_status: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CheckoutSession {
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.payment_status == "paid"
    }
}

/// Client for the Stripe API.
#[derive(Clone)]
pub struct StripeClient {
    inner: Arc<StripeClientInner>,
}

struct StripeClientInner {
    client: reqwest::Client,
    api_url: String,
    secret_key: SecretString,
}

impl StripeClient {
    /// Create a new payment gateway client.
    #[must_use]
    pub fn new(config: &StripeConfig) -> Self {
        Self {
            inner: Arc::new(StripeClientInner {
                client: reqwest::Client::new(),
                api_url: config.api_url.trim_end_matches('/').to_owned(),
                secret_key: config.secret_key.clone(),
            }),
        }
    }

    /// Create a hosted checkout session.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the gateway rejects it.
    #[instrument(skip(self, session), fields(lines = session.line_items.len()))]
    pub async fn create_checkout_session(
        &self,
        session: &NewCheckoutSession,
    ) -> Result<CheckoutSession, StripeError> {
        let response = self
            .inner
            .client
            .post(format!("{}/v1/checkout/sessions", self.inner.api_url))
            .bearer_auth(self.inner.secret_key.expose_secret())
            .form(&session.to_form())
            .send()
            .await?;
        parse_response(response).await
    }

    /// Read a checkout session back after the redirect.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the session is unknown.
    #[instrument(skip(self))]
    pub async fn retrieve_checkout_session(&self, id: &str) -> Result<CheckoutSession, StripeError> {
        let response = self
            .inner
            .client
            .get(format!(
                "{}/v1/checkout/sessions/{}",
                self.inner.api_url,
                urlencoding::encode(id)
            ))
            .bearer_auth(self.inner.secret_key.expose_secret())
            .send()
            .await?;
        parse_response(response).await
    }
}

async fn parse_response(response: reqwest::Response) -> Result<CheckoutSession, StripeError> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(1);
        return Err(StripeError::RateLimited(retry_after));
    }

    let body = response.text().await?;
    if status.is_success() {
        return Ok(serde_json::from_str(&body)?);
    }

    tracing::error!(status = %status, "Payment gateway returned non-success status");
    Err(match serde_json::from_str::<ApiErrorResponse>(&body) {
        Ok(parsed) => StripeError::Api {
            error_type: parsed.error.error_type,
            message: parsed.error.message,
        },
        Err(_) => StripeError::Api {
            error_type: "unknown".to_owned(),
            message: body.chars().take(200).collect(),
        },
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form_value<'a>(form: &'a [(String, String)], key: &str) -> Option<&'a str> {
        form.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_to_form_encodes_line_items() {
        let session = NewCheckoutSession {
            line_items: vec![
                LineItem {
                    name: "Oak Table".to_owned(),
                    unit_price: Price::from_cents(89_999),
                    quantity: 1,
                    image: Some("https://cdn.example.com/oak.jpg".to_owned()),
                },
                LineItem {
                    name: "Chair".to_owned(),
                    unit_price: Price::from_cents(4_550),
                    quantity: 4,
                    image: None,
                },
            ],
            success_url: "https://shop.test/success?session_id={CHECKOUT_SESSION_ID}".to_owned(),
            cancel_url: "https://shop.test/checkout".to_owned(),
            customer_email: None,
            metadata: vec![("order_id".to_owned(), "order-1".to_owned())],
        };

        let form = session.to_form();
        assert_eq!(form_value(&form, "mode"), Some("payment"));
        assert_eq!(
            form_value(&form, "line_items[0][price_data][unit_amount]"),
            Some("89999")
        );
        assert_eq!(
            form_value(&form, "line_items[0][price_data][product_data][images][0]"),
            Some("https://cdn.example.com/oak.jpg")
        );
        assert_eq!(form_value(&form, "line_items[1][quantity]"), Some("4"));
        assert_eq!(
            form_value(&form, "line_items[1][price_data][currency]"),
            Some("usd")
        );
        assert!(form_value(&form, "line_items[1][price_data][product_data][images][0]").is_none());
        assert_eq!(form_value(&form, "metadata[order_id]"), Some("order-1"));
        assert!(form_value(&form, "customer_email").is_none());
    }

    #[test]
    fn test_session_deserialize() {
        let session: CheckoutSession = serde_json::from_str(
            r#"{"id":"cs_test_1","object":"checkout.session","url":null,"payment_status":"paid","metadata":{"order_id":"o1"}}"#,
        )
        .unwrap();
        assert!(session.is_paid());
        assert_eq!(session.metadata.get("order_id").map(String::as_str), Some("o1"));
    }

    #[test]
    fn test_stripe_error_display() {
        let err = StripeError::Api {
            error_type: "invalid_request_error".to_owned(),
            message: "No such price".to_owned(),
        };
        assert_eq!(err.to_string(), "API error (invalid_request_error): No such price");
    }
}
