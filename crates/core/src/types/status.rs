//! Status and category enums shared by orders and products.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Order fulfillment status as stored on the order document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
}

impl OrderStatus {
    /// All statuses in fulfillment order.
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
    ];

    /// The stored string value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown enum value.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    /// Which enum was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl FromStr for OrderStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownVariant {
                kind: "order status",
                value: s.to_owned(),
            })
    }
}

/// How the customer chose to pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Hosted payment-gateway checkout.
    Stripe,
    /// Cash on delivery.
    Cod,
}

impl PaymentMethod {
    /// Whether the order must be paid through the gateway before it is
    /// considered placed.
    #[must_use]
    pub const fn uses_gateway(&self) -> bool {
        matches!(self, Self::Stripe)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Stripe => "stripe",
            Self::Cod => "cod",
        })
    }
}

/// Furniture category a product is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductCategory {
    Bed,
    Sofa,
    Chair,
    Table,
    Wardrobe,
}

impl ProductCategory {
    /// All categories in display order.
    pub const ALL: [Self; 5] = [
        Self::Bed,
        Self::Sofa,
        Self::Chair,
        Self::Table,
        Self::Wardrobe,
    ];

    /// The stored string value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Bed => "Bed",
            Self::Sofa => "Sofa",
            Self::Chair => "Chair",
            Self::Table => "Table",
            Self::Wardrobe => "Wardrobe",
        }
    }
}

impl fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductCategory {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownVariant {
                kind: "product category",
                value: s.to_owned(),
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_default_is_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
        assert_eq!(
            serde_json::to_string(&OrderStatus::Shipped).unwrap(),
            "\"Shipped\""
        );
    }

    #[test]
    fn test_order_status_parse_is_case_insensitive() {
        assert_eq!("delivered".parse::<OrderStatus>().unwrap(), OrderStatus::Delivered);
        assert!("lost".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_payment_method_wire_values() {
        assert_eq!(serde_json::to_string(&PaymentMethod::Cod).unwrap(), "\"cod\"");
        let parsed: PaymentMethod = serde_json::from_str("\"stripe\"").unwrap();
        assert!(parsed.uses_gateway());
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("sofa".parse::<ProductCategory>().unwrap(), ProductCategory::Sofa);
        let err = "Lamp".parse::<ProductCategory>().unwrap_err();
        assert_eq!(err.to_string(), "unknown product category: Lamp");
    }
}
