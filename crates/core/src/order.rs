//! Order documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::cart::Cart;
use crate::checkout::ValidatedCheckout;
use crate::types::{Email, FieldErrors, OrderId, OrderStatus, PaymentMethod, Price, ProductId};

/// Errors building an order.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("cart is empty")]
    EmptyCart,
}

/// Who placed the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCustomer {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: String,
}

impl OrderCustomer {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Where the order ships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub street_address: String,
    pub town_city: String,
    pub province: String,
    pub zip_code: String,
    pub country: String,
}

/// A purchased line, frozen at checkout time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Array key the content store requires on object arrays.
    #[serde(rename = "_key")]
    pub key: String,
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// An order document ready to be created in the content store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub order_number: String,
    pub customer: OrderCustomer,
    pub shipping_address: ShippingAddress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,
    pub items: Vec<OrderItem>,
    pub total: Price,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    /// Document type in the content store.
    pub const DOCUMENT_TYPE: &'static str = "order";

    /// Build an order from a validated checkout and a cart snapshot.
    ///
    /// The order number is `ORD-<unix millis>` and each line key is
    /// `<product id>-<unix millis>`, both taken from `now`.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::EmptyCart`] when the cart has no lines.
    pub fn from_checkout(
        checkout: ValidatedCheckout,
        cart: &Cart,
        payment_method: PaymentMethod,
        now: DateTime<Utc>,
    ) -> Result<Self, OrderError> {
        if cart.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        let millis = now.timestamp_millis();
        let items = cart
            .items()
            .iter()
            .map(|line| OrderItem {
                key: format!("{}-{millis}", line.id),
                product_id: line.id.clone(),
                name: line.name.clone(),
                quantity: line.quantity,
                price: line.price,
                image: line.image.clone(),
            })
            .collect();

        Ok(Self {
            order_number: format!("ORD-{millis}"),
            customer: checkout.customer,
            shipping_address: checkout.shipping_address,
            company_name: checkout.company_name,
            additional_info: checkout.additional_info,
            items,
            total: cart.total(),
            payment_method,
            status: OrderStatus::Pending,
            created_at: now,
        })
    }

    /// Attach the id the content store assigned.
    #[must_use]
    pub fn into_order(self, id: OrderId) -> Order {
        Order {
            id,
            order_number: self.order_number,
            customer: self.customer,
            shipping_address: self.shipping_address,
            company_name: self.company_name,
            additional_info: self.additional_info,
            items: self.items,
            total: self.total,
            payment_method: self.payment_method,
            status: self.status,
            created_at: self.created_at,
        }
    }
}

/// A stored order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    pub order_number: String,
    pub customer: OrderCustomer,
    pub shipping_address: ShippingAddress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    pub total: Price,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Admin edit of an order. Only supplied fields change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<OrderCustomer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<ShippingAddress>,
}

impl OrderPatch {
    /// A patch that only moves the order to `status`.
    #[must_use]
    pub fn status(status: OrderStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// # Errors
    ///
    /// Returns a `patch` entry when no field was supplied.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.to_set().is_empty() {
            errors.add("patch", "No fields to update");
        }
        errors.into_result()
    }

    /// The supplied fields as a content-store `set` object.
    #[must_use]
    pub fn to_set(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}
