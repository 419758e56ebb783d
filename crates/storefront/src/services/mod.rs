//! Business logic for driftwood.
//!
//! Services wrap the repository layer and hold the rules the routes share:
//! cart reconciliation and merging, price computation, catalog presentation,
//! and customer registration.

pub mod cart;
pub mod catalog;
pub mod customers;
pub mod pricing;
