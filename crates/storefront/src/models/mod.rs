//! Domain types for the storefront.
//!
//! These are validated domain objects, separate from database row types; the
//! repositories in [`crate::db`] map rows into them.

pub mod cart;
pub mod customer;
pub mod product;
pub mod store;
