//! Wishlist reducer.

use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

/// A saved product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub image: Option<String>,
}

/// What the last mutation did, so the client can show the right notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WishlistAction {
    Added,
    AlreadyPresent,
    Removed,
    NotFound,
    Cleared,
}

/// The visitor's wishlist. Items are unique by product id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wishlist {
    items: Vec<WishlistItem>,
}

impl Wishlist {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn items(&self) -> &[WishlistItem] {
        &self.items
    }

    #[must_use]
    pub fn contains(&self, id: &ProductId) -> bool {
        self.items.iter().any(|item| &item.id == id)
    }

    /// Save a product unless it is already saved.
    pub fn add(&mut self, item: WishlistItem) -> WishlistAction {
        if self.contains(&item.id) {
            return WishlistAction::AlreadyPresent;
        }
        self.items.push(item);
        WishlistAction::Added
    }

    pub fn remove(&mut self, id: &ProductId) -> WishlistAction {
        let before = self.items.len();
        self.items.retain(|item| &item.id != id);
        if self.items.len() == before {
            WishlistAction::NotFound
        } else {
            WishlistAction::Removed
        }
    }

    pub fn clear(&mut self) -> WishlistAction {
        self.items.clear();
        WishlistAction::Cleared
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> WishlistItem {
        WishlistItem {
            id: ProductId::new(id),
            name: "Velvet Armchair".to_owned(),
            price: Price::from_cents(35_000),
            image: Some("https://cdn.example.com/chair.jpg".to_owned()),
        }
    }

    #[test]
    fn test_add_dedupes_by_id() {
        let mut wishlist = Wishlist::new();
        assert_eq!(wishlist.add(item("chair")), WishlistAction::Added);
        assert_eq!(wishlist.add(item("chair")), WishlistAction::AlreadyPresent);
        assert_eq!(wishlist.items().len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut wishlist = Wishlist::new();
        wishlist.add(item("chair"));

        assert_eq!(wishlist.remove(&ProductId::new("bed")), WishlistAction::NotFound);
        assert_eq!(wishlist.remove(&ProductId::new("chair")), WishlistAction::Removed);
        assert!(wishlist.items().is_empty());
    }

    #[test]
    fn test_clear() {
        let mut wishlist = Wishlist::new();
        wishlist.add(item("chair"));
        wishlist.add(item("bed"));
        assert_eq!(wishlist.clear(), WishlistAction::Cleared);
        assert!(!wishlist.contains(&ProductId::new("bed")));
    }
}
