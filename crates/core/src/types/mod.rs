//! Core domain types shared across Driftwood crates.

pub mod email;
pub mod id;
pub mod price;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::FinalPrice;
