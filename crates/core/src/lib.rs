//! Furnish Core - Shared domain types and storefront logic.
//!
//! This crate provides the types used by both Furnish binaries:
//! - `storefront` - Public catalog, cart, checkout and shipping API
//! - `admin` - Dashboard API over products, orders and derived customers
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients. Records mirror documents in the content store; the cart and
//! wishlist are reducers that the storefront keeps in the visitor session.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails, and statuses
//! - [`product`] - Products, drafts, patches, and reviews
//! - [`order`] - Order documents and their construction from a checkout
//! - [`customer`] - Customers and analytics derived from orders
//! - [`cart`] - Cart reducer
//! - [`wishlist`] - Wishlist reducer
//! - [`checkout`] - Checkout form validation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod customer;
pub mod order;
pub mod product;
pub mod types;
pub mod wishlist;

pub use cart::{Cart, CartItem};
pub use checkout::{CheckoutErrors, CheckoutForm, ValidatedCheckout};
pub use customer::{Customer, CustomerPatch, DashboardTotals, InventoryLevel, SalesPoint};
pub use order::{
    NewOrder, Order, OrderCustomer, OrderError, OrderItem, OrderPatch, ShippingAddress,
};
pub use product::{NewReview, Product, ProductDetail, ProductDraft, ProductPatch, Review};
pub use types::*;
pub use wishlist::{Wishlist, WishlistAction, WishlistItem};
