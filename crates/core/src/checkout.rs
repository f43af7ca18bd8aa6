//! Checkout form validation.

use serde::{Deserialize, Serialize};

use crate::order::{OrderCustomer, ShippingAddress};
use crate::types::{Email, FieldErrors};

/// Validation failures for a checkout form, keyed by field name.
pub type CheckoutErrors = FieldErrors;

/// Billing details as submitted by the checkout page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckoutForm {
    pub first_name: String,
    pub last_name: String,
    pub company_name: Option<String>,
    pub country: String,
    pub street_address: String,
    pub town_city: String,
    pub province: String,
    pub zip_code: String,
    pub phone: String,
    pub email: String,
    pub additional_info: Option<String>,
}

/// A checkout form that passed validation, split into the records an order
/// stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCheckout {
    pub customer: OrderCustomer,
    pub shipping_address: ShippingAddress,
    pub company_name: Option<String>,
    pub additional_info: Option<String>,
}

fn required(errors: &mut CheckoutErrors, field: &'static str, label: &str, value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, format!("{label} is required"));
    }
    value.to_owned()
}

fn optional(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

impl CheckoutForm {
    /// Trim and validate every field.
    ///
    /// # Errors
    ///
    /// Returns all failing fields at once: `"<Label> is required"` for blank
    /// required fields and `"Email is invalid"` for a malformed address.
    pub fn validate(&self) -> Result<ValidatedCheckout, CheckoutErrors> {
        let mut errors = CheckoutErrors::new();

        let first_name = required(&mut errors, "firstName", "First name", &self.first_name);
        let last_name = required(&mut errors, "lastName", "Last name", &self.last_name);
        let country = required(&mut errors, "country", "Country", &self.country);
        let street_address = required(
            &mut errors,
            "streetAddress",
            "Street address",
            &self.street_address,
        );
        let town_city = required(&mut errors, "townCity", "Town / City", &self.town_city);
        let province = required(&mut errors, "province", "Province", &self.province);
        let zip_code = required(&mut errors, "zipCode", "ZIP code", &self.zip_code);
        let phone = required(&mut errors, "phone", "Phone", &self.phone);
        let email = required(&mut errors, "email", "Email", &self.email);

        let email = if email.is_empty() {
            None
        } else if let Ok(email) = Email::parse(&email) {
            Some(email)
        } else {
            errors.add("email", "Email is invalid");
            None
        };

        errors.into_result()?;
        let email = email.ok_or_else(|| {
            let mut errors = CheckoutErrors::new();
            errors.add("email", "Email is required");
            errors
        })?;

        Ok(ValidatedCheckout {
            customer: OrderCustomer {
                first_name,
                last_name,
                email,
                phone,
            },
            shipping_address: ShippingAddress {
                street_address,
                town_city,
                province,
                zip_code,
                country,
            },
            company_name: optional(self.company_name.as_ref()),
            additional_info: optional(self.additional_info.as_ref()),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> CheckoutForm {
        CheckoutForm {
            first_name: " Ada ".to_owned(),
            last_name: "Lovelace".to_owned(),
            company_name: Some("  ".to_owned()),
            country: "United States".to_owned(),
            street_address: "12 Analytical Way".to_owned(),
            town_city: "Austin".to_owned(),
            province: "TX".to_owned(),
            zip_code: "78701".to_owned(),
            phone: "555-0100".to_owned(),
            email: "ada@example.com".to_owned(),
            additional_info: Some("Leave at the door".to_owned()),
        }
    }

    #[test]
    fn test_valid_form_is_trimmed_and_split() {
        let checkout = form().validate().unwrap();
        assert_eq!(checkout.customer.first_name, "Ada");
        assert_eq!(checkout.customer.email.as_str(), "ada@example.com");
        assert_eq!(checkout.shipping_address.zip_code, "78701");
        assert_eq!(checkout.company_name, None);
        assert_eq!(checkout.additional_info.as_deref(), Some("Leave at the door"));
    }

    #[test]
    fn test_missing_required_fields_are_all_reported() {
        let errors = CheckoutForm::default().validate().unwrap_err();
        assert_eq!(errors.len(), 9);
        assert_eq!(errors.get("firstName"), Some("First name is required"));
        assert_eq!(errors.get("email"), Some("Email is required"));
        assert!(errors.get("companyName").is_none());
    }

    #[test]
    fn test_malformed_email_is_rejected() {
        for bad in ["ada", "ada@example", "ada @example.com", "@example.com"] {
            let mut form = form();
            form.email = bad.to_owned();
            let errors = form.validate().unwrap_err();
            assert_eq!(errors.get("email"), Some("Email is invalid"), "{bad}");
            assert_eq!(errors.len(), 1);
        }
    }

    #[test]
    fn test_deserializes_camel_case_with_missing_optionals() {
        let form: CheckoutForm = serde_json::from_value(serde_json::json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "country": "US",
            "streetAddress": "1 Main St",
            "townCity": "Austin",
            "province": "TX",
            "zipCode": "78701",
            "phone": "555",
            "email": "ada@example.com"
        }))
        .unwrap();
        assert!(form.validate().is_ok());
    }
}
