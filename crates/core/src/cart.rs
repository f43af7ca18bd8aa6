//! Shopping cart reducer.
//!
//! The cart is a list of lines keyed by product id plus a running total.
//! Every mutation recomputes the total from the lines, so the two can never
//! drift apart even when a cart is restored from a stale session.

use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

/// One line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub image: Option<String>,
    pub quantity: u32,
}

impl CartItem {
    /// Price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price * self.quantity
    }
}

/// The visitor's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
    total: Price,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Sum of all line totals.
    #[must_use]
    pub const fn total(&self) -> Price {
        self.total
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add a line, merging with an existing line for the same product.
    ///
    /// A quantity of zero is treated as one. When the product is already in
    /// the cart the quantities are summed and the existing name, price, and
    /// image are kept.
    pub fn add(&mut self, mut item: CartItem) {
        item.quantity = item.quantity.max(1);
        match self.items.iter_mut().find(|line| line.id == item.id) {
            Some(line) => line.quantity = line.quantity.saturating_add(item.quantity),
            None => self.items.push(item),
        }
        self.recompute();
    }

    /// Remove the line for a product. Unknown ids are ignored.
    pub fn remove(&mut self, id: &ProductId) {
        self.items.retain(|line| &line.id != id);
        self.recompute();
    }

    /// Set the quantity of a line, clamped to at least one.
    ///
    /// Returns `false` when the product is not in the cart.
    pub fn update_quantity(&mut self, id: &ProductId, quantity: u32) -> bool {
        let found = self
            .items
            .iter_mut()
            .find(|line| &line.id == id)
            .map(|line| line.quantity = quantity.max(1))
            .is_some();
        self.recompute();
        found
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.items.clear();
        self.recompute();
    }

    fn recompute(&mut self) {
        self.total = self.items.iter().map(CartItem::line_total).sum();
    }
}
