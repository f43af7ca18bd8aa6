//! GROQ queries and typed dashboard operations.

use furnish_core::{
    CustomerPatch, Order, OrderId, OrderPatch, OrderStatus, Product, ProductId, ProductPatch,
};
use serde_json::{Value, json};
use tracing::instrument;

use super::{Mutation, SanityClient, SanityError};

pub const PRODUCT_TYPE: &str = "shopProduct";
pub const ORDER_TYPE: &str = "order";

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

/// Order fields, with each line's image falling back to the product's
/// current image.
fn order_fields() -> String {
    format!(
        r#"_id,
  orderNumber,
  customer,
  shippingAddress,
  companyName,
  additionalInfo,
  "items": items[]{{
    _key,
    productId,
    name,
    quantity,
    price,
    "image": coalesce(image, *[_type == "{PRODUCT_TYPE}" && _id == ^.productId][0].image.asset->url)
  }},
  total,
  paymentMethod,
  status,
  createdAt"#
    )
}

fn products_query() -> String {
    format!(r#"*[_type == "{PRODUCT_TYPE}"] | order(_createdAt desc) {{ {PRODUCT_FIELDS} }}"#)
}

fn product_by_id_query() -> String {
    format!(r#"*[_type == "{PRODUCT_TYPE}" && _id == $id][0]{{ {PRODUCT_FIELDS} }}"#)
}

fn orders_query() -> String {
    format!(
        r#"*[_type == "{ORDER_TYPE}" && (!defined($status) || status == $status)] | order(createdAt desc) {{
  {}
}}"#,
        order_fields()
    )
}

fn order_by_id_query() -> String {
    format!(
        r#"*[_type == "{ORDER_TYPE}" && _id == $id][0]{{ {} }}"#,
        order_fields()
    )
}

/// Filter for the listen endpoint, by document type.
#[must_use]
pub fn listen_filter(doc_type: &str) -> String {
    format!(r#"*[_type == "{doc_type}"]"#)
}

impl SanityClient {
    /// All products, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the content store request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, SanityError> {
        self.query_rows(&products_query(), &[]).await
    }

    /// Number of products.
    ///
    /// # Errors
    ///
    /// Returns an error if the content store request fails.
    pub async fn count_products(&self) -> Result<usize, SanityError> {
        self.query(&format!(r#"count(*[_type == "{PRODUCT_TYPE}"])"#), &[])
            .await
    }

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

    /// Apply a validated patch and return the updated product.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product does not exist.
    #[instrument(skip(self, patch), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        id: &ProductId,
        patch: &ProductPatch,
    ) -> Result<Product, SanityError> {
        self.product_by_id(id).await?;
        self.mutate(vec![Mutation::set(id.as_str(), patch.to_set())])
            .await?;
        self.product_by_id(id).await
    }

    /// # Errors
    ///
    /// Returns `NotFound` if the product does not exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: &ProductId) -> Result<(), SanityError> {
        self.product_by_id(id).await?;
        self.mutate(vec![Mutation::delete(id.as_str())]).await?;
        Ok(())
    }

    /// Orders newest first, optionally only those in `status`.
    ///
    /// # Errors
    ///
    /// Returns an error if the content store request fails.
    #[instrument(skip(self))]
    pub async fn list_orders(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, SanityError> {
        let status = status.map_or(Value::Null, |s| Value::String(s.as_str().to_owned()));
        self.query_rows(&orders_query(), &[("status", status)]).await
    }

    /// # Errors
    ///
    /// Returns `NotFound` if the order does not exist.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn order_by_id(&self, id: &OrderId) -> Result<Order, SanityError> {
        let order: Option<Order> = self
            .query(&order_by_id_query(), &[("id", json!(id))])
            .await?;
        order.ok_or_else(|| SanityError::NotFound(format!("order {id}")))
    }

    /// Apply an admin edit and return the updated order.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the order does not exist.
    #[instrument(skip(self, patch), fields(order_id = %id))]
    pub async fn update_order(&self, id: &OrderId, patch: &OrderPatch) -> Result<Order, SanityError> {
        self.order_by_id(id).await?;
        self.mutate(vec![Mutation::set(id.as_str(), patch.to_set())])
            .await?;
        self.order_by_id(id).await
    }

    /// # Errors
    ///
    /// Returns `NotFound` if the order does not exist.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn delete_order(&self, id: &OrderId) -> Result<(), SanityError> {
        self.order_by_id(id).await?;
        self.mutate(vec![Mutation::delete(id.as_str())]).await?;
        Ok(())
    }

    /// Patch the customer record on every order placed with `email`, in one
    /// transaction. Returns how many orders changed.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no order carries this email.
    #[instrument(skip(self, patch))]
    pub async fn update_customer(
        &self,
        email: &str,
        patch: &CustomerPatch,
    ) -> Result<usize, SanityError> {
        let ids: Vec<OrderId> = self
            .query(
                &format!(r#"*[_type == "{ORDER_TYPE}" && customer.email == $email]._id"#),
                &[("email", json!(email))],
            )
            .await?;
        if ids.is_empty() {
            return Err(SanityError::NotFound(format!("customer {email}")));
        }

        let set = patch.to_set();
        let mutations = ids
            .iter()
            .map(|id| Mutation::set(id.as_str(), set.clone()))
            .collect();
        self.mutate(mutations).await?;
        Ok(ids.len())
    }

    /// Cheap query used by the readiness probe.
    ///
    /// # Errors
    ///
    /// Returns an error if the content store is unreachable.
    pub async fn ping(&self) -> Result<(), SanityError> {
        self.count_products().await.map(|_| ())
    }
}
