//! Products and reviews as stored in the content store.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::types::{FieldErrors, Price, ProductCategory, ProductId, ReviewId};

/// Allowed title length in characters.
pub const TITLE_LENGTH: core::ops::RangeInclusive<usize> = 5..=100;
/// Allowed description length in characters.
pub const DESCRIPTION_LENGTH: core::ops::RangeInclusive<usize> = 10..=500;

/// A product listed in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    pub price: Price,
    #[serde(default)]
    pub description: Option<String>,
    /// Resolved image asset URL.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub discount_percentage: Option<Decimal>,
    #[serde(default)]
    pub is_featured_product: bool,
    #[serde(default, deserialize_with = "stock_count")]
    pub stock_level: u32,
    #[serde(default)]
    pub category: Option<ProductCategory>,
}

/// Stock as the editors typed it: missing, negative, or non-numeric counts
/// read as zero and fractions are dropped.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn stock_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let count = Value::deserialize(deserializer)?
        .as_f64()
        .filter(|n| n.is_finite() && *n > 0.0)
        .map_or(0, |n| n.min(f64::from(u32::MAX)).floor() as u32);
    Ok(count)
}

impl Product {
    /// Price after the listed discount, if any.
    #[must_use]
    pub fn sale_price(&self) -> Price {
        self.discount_percentage
            .map_or(self.price, |percent| self.price.discounted(percent))
    }

    /// Whether `quantity` units can be taken from stock.
    #[must_use]
    pub const fn has_stock_for(&self, quantity: u32) -> bool {
        self.stock_level >= quantity
    }
}

/// A product together with its reviews, newest review first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    #[serde(default)]
    pub reviews: Vec<Review>,
}

fn check_len(
    errors: &mut FieldErrors,
    field: &'static str,
    label: &str,
    value: &str,
    range: &core::ops::RangeInclusive<usize>,
) {
    let len = value.trim().chars().count();
    if len == 0 {
        errors.add(field, format!("{label} is required"));
    } else if !range.contains(&len) {
        errors.add(
            field,
            format!(
                "{label} must be between {} and {} characters",
                range.start(),
                range.end()
            ),
        );
    }
}

fn check_discount(errors: &mut FieldErrors, discount: Option<Decimal>) {
    if discount.is_some_and(|d| d < Decimal::ZERO || d > Decimal::ONE_HUNDRED) {
        errors.add("discountPercentage", "Discount must be between 0 and 100");
    }
}

/// A product submitted through the product form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    pub price: Option<Price>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub discount_percentage: Option<Decimal>,
    #[serde(default)]
    pub is_featured_product: bool,
    #[serde(default)]
    pub stock_level: Option<i64>,
    #[serde(default)]
    pub category: String,
}

impl ProductDraft {
    /// Check the draft against the product schema rules.
    ///
    /// # Errors
    ///
    /// Returns every failing field with a human-readable message.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        check_len(&mut errors, "title", "Title", &self.title, &TITLE_LENGTH);
        check_len(
            &mut errors,
            "description",
            "Description",
            &self.description,
            &DESCRIPTION_LENGTH,
        );

        match self.price {
            None => errors.add("price", "Price is required"),
            Some(price) if price.is_negative() => errors.add("price", "Price cannot be negative"),
            Some(_) => {}
        }

        check_discount(&mut errors, self.discount_percentage);

        if self.stock_level.is_some_and(|stock| stock < 0) {
            errors.add("stockLevel", "Stock level cannot be negative");
        }

        if self.category.trim().is_empty() {
            errors.add("category", "Category is required");
        } else if self.category.trim().parse::<ProductCategory>().is_err() {
            errors.add("category", "Category must be one of Bed, Sofa, Chair, Table, Wardrobe");
        }

        errors.into_result()
    }
}

/// Partial update applied to a product from the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub discount_percentage: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_featured_product: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_level: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ProductCategory>,
}

impl ProductPatch {
    /// Check supplied fields against the product schema rules.
    ///
    /// # Errors
    ///
    /// Returns every failing field, or a `patch` entry when nothing was
    /// supplied at all.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        if let Some(title) = &self.title {
            check_len(&mut errors, "title", "Title", title, &TITLE_LENGTH);
        }
        if let Some(description) = &self.description {
            check_len(
                &mut errors,
                "description",
                "Description",
                description,
                &DESCRIPTION_LENGTH,
            );
        }
        if self.price.is_some_and(|price| price.is_negative()) {
            errors.add("price", "Price cannot be negative");
        }
        check_discount(&mut errors, self.discount_percentage);
        if self.stock_level.is_some_and(|stock| stock < 0) {
            errors.add("stockLevel", "Stock level cannot be negative");
        }
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

/// A customer review attached to a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A review submitted from the product detail page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub text: String,
}

impl NewReview {
    /// Both fields must be non-blank.
    ///
    /// # Errors
    ///
    /// Returns the blank fields.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.user_name.trim().is_empty() {
            errors.add("userName", "Name is required");
        }
        if self.text.trim().is_empty() {
            errors.add("text", "Review text is required");
        }
        errors.into_result()
    }
}
