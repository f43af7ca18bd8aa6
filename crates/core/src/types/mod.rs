//! Core types for Furnish.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod field_errors;
pub mod id;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use field_errors::FieldErrors;
pub use id::*;
pub use price::Price;
pub use status::*;
