//! GROQ queries and typed storefront operations.

use chrono::Utc;
use furnish_core::{
    NewOrder, NewReview, Order, OrderId, OrderStatus, Product, ProductCategory, ProductDetail,
    ProductId, Review, ReviewId,
};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::instrument;

use super::{Mutation, Patch, SanityClient, SanityError};

pub(crate) const PRODUCT_TYPE: &str = "shopProduct";
pub(crate) const REVIEW_TYPE: &str = "review";

/// Fields projected for every product read.
const PRODUCT_FIELDS: &str = r#"_id,
  title,
  "slug": slug.current,
  price,
  description,
  "image": image.asset->url,
  discountPercentage,
  "isFeaturedProduct": coalesce(isFeaturedProduct, false),
  "stockLevel": coalesce(stockLevel, 0),
  category"#;

const REVIEW_PROJECTION: &str = "{ _id, productId, userName, text, createdAt }";

/// Catalog listing filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProductFilter {
    /// Only products in this category.
    #[serde(default)]
    pub category: Option<ProductCategory>,
    /// Only featured products.
    #[serde(default)]
    pub featured: bool,
}

fn products_query() -> String {
    format!(
        r#"*[_type == "{PRODUCT_TYPE}"
  && (!defined($category) || category == $category)
  && (!$featured || isFeaturedProduct == true)
] | order(_createdAt desc) {{
  {PRODUCT_FIELDS}
}}"#
    )
}

fn product_detail_query() -> String {
    format!(
        r#"*[_type == "{PRODUCT_TYPE}" && slug.current == $slug][0]{{
  {PRODUCT_FIELDS},
  "reviews": *[_type == "{REVIEW_TYPE}" && productId == ^._id] | order(createdAt desc) {REVIEW_PROJECTION}
}}"#
    )
}

fn product_by_id_query() -> String {
    format!(r#"*[_type == "{PRODUCT_TYPE}" && _id == $id][0]{{ {PRODUCT_FIELDS} }}"#)
}

/// Stock for one product, read without caching.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StockRecord {
    #[serde(rename = "_id")]
    id: ProductId,
    #[serde(default)]
    stock_level: i64,
    #[serde(rename = "_rev")]
    rev: String,
}

/// Id and revision of any document.
#[derive(Debug, Deserialize)]
struct RevisionRecord {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_rev")]
    rev: String,
}

impl SanityClient {
    /// List products, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the content store request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, SanityError> {
        let category = filter
            .category
            .map_or(Value::Null, |c| Value::String(c.as_str().to_owned()));
        self.query_rows(
            &products_query(),
            &[("category", category), ("featured", json!(filter.featured))],
        )
        .await
    }

    /// Get a product and its reviews by slug.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no product has this slug.
    #[instrument(skip(self))]
    pub async fn product_by_slug(&self, slug: &str) -> Result<ProductDetail, SanityError> {
        let detail: Option<ProductDetail> = self
            .query(&product_detail_query(), &[("slug", json!(slug))])
            .await?;
        detail.ok_or_else(|| SanityError::NotFound(format!("product {slug}")))
    }

    /// Get a product by document id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product does not exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product_by_id(&self, id: &ProductId) -> Result<Product, SanityError> {
        let product: Option<Product> = self
            .query(&product_by_id_query(), &[("id", json!(id))])
            .await?;
        product.ok_or_else(|| SanityError::NotFound(format!("product {id}")))
    }

    /// Take `quantity` units out of stock.
    ///
    /// Reads the live stock level, then writes the new level guarded by the
    /// document revision so a concurrent write fails instead of overselling.
    /// Returns `Ok(None)` when there is not enough stock.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product does not exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn decrement_stock(
        &self,
        id: &ProductId,
        quantity: u32,
    ) -> Result<Option<i64>, SanityError> {
        let record: Option<StockRecord> = self
            .query_fresh(
                &format!(
                    r#"*[_type == "{PRODUCT_TYPE}" && _id == $id][0]{{ _id, _rev, "stockLevel": coalesce(stockLevel, 0) }}"#
                ),
                &[("id", json!(id))],
            )
            .await?;
        let record = record.ok_or_else(|| SanityError::NotFound(format!("product {id}")))?;

        let remaining = record.stock_level - i64::from(quantity);
        if remaining < 0 {
            return Ok(None);
        }

        let mut set = Map::new();
        set.insert("stockLevel".to_owned(), json!(remaining));
        self.mutate(vec![Mutation::Patch(Patch {
            id: record.id.into_inner(),
            set: Some(set),
            if_revision_id: Some(record.rev),
            ..Patch::default()
        })])
        .await?;

        Ok(Some(remaining))
    }

    /// Create an order document.
    ///
    /// # Errors
    ///
    /// Returns an error if the content store rejects the document.
    #[instrument(skip(self, order), fields(order_number = %order.order_number))]
    pub async fn create_order(&self, order: NewOrder) -> Result<Order, SanityError> {
        let response = self
            .mutate(vec![Mutation::create(NewOrder::DOCUMENT_TYPE, &order)?])
            .await?;
        let id = response
            .results
            .first()
            .map(|result| OrderId::new(result.id.clone()))
            .ok_or_else(|| SanityError::NotFound("created order id".to_string()))?;
        Ok(order.into_order(id))
    }

    /// Move an order to a new status.
    ///
    /// # Errors
    ///
    /// Returns an error if the patch fails.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn set_order_status(&self, id: &OrderId, status: OrderStatus) -> Result<(), SanityError> {
        let mut set = Map::new();
        set.insert("status".to_owned(), json!(status));
        self.mutate(vec![Mutation::set(id.as_str(), set)]).await?;
        Ok(())
    }

    /// Add a review to a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the content store rejects the document.
    #[instrument(skip(self, review), fields(product_id = %product_id))]
    pub async fn create_review(
        &self,
        product_id: &ProductId,
        review: &NewReview,
    ) -> Result<Review, SanityError> {
        let doc = json!({
            "productId": product_id,
            "userName": review.user_name.trim(),
            "text": review.text.trim(),
            "createdAt": Utc::now(),
        });
        self.mutate(vec![Mutation::create(REVIEW_TYPE, &doc)?])
            .await?
            .first_document()
    }

    /// Id and revision of a review, read without caching.
    ///
    /// Only documents of the review type match, so other ids are `NotFound`.
    async fn review_revision(&self, id: &ReviewId) -> Result<RevisionRecord, SanityError> {
        let record: Option<RevisionRecord> = self
            .query_fresh(
                &format!(r#"*[_type == "{REVIEW_TYPE}" && _id == $id][0]{{ _id, _rev }}"#),
                &[("id", json!(id))],
            )
            .await?;
        record.ok_or_else(|| SanityError::NotFound(format!("review {id}")))
    }

    /// Replace the text of a review.
    ///
    /// The write is guarded by the revision of the review that was found.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no review has this id.
    #[instrument(skip(self, text), fields(review_id = %id))]
    pub async fn update_review(&self, id: &ReviewId, text: &str) -> Result<Review, SanityError> {
        let record = self.review_revision(id).await?;
        let mut set = Map::new();
        set.insert("text".to_owned(), json!(text.trim()));
        self.mutate(vec![Mutation::Patch(Patch {
            id: record.id,
            set: Some(set),
            if_revision_id: Some(record.rev),
            ..Patch::default()
        })])
        .await?
        .first_document()
    }

    /// Delete a review.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no review has this id.
    #[instrument(skip(self), fields(review_id = %id))]
    pub async fn delete_review(&self, id: &ReviewId) -> Result<(), SanityError> {
        let record = self.review_revision(id).await?;
        self.mutate(vec![Mutation::delete(record.id)]).await?;
        Ok(())
    }

    /// Cheap query used by the readiness probe.
    ///
    /// # Errors
    ///
    /// Returns an error if the content store is unreachable.
    pub async fn ping(&self) -> Result<(), SanityError> {
        let _: Value = self
            .query_fresh(&format!(r#"count(*[_type == "{PRODUCT_TYPE}"])"#), &[])
            .await?;
        Ok(())
    }
}
