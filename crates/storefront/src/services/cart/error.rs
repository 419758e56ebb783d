//! Cart service errors.

use thiserror::Error;

use driftwood_core::{AttributeId, StoreId};

use crate::db::RepositoryError;
use crate::services::pricing::PricingError;

/// Errors from cart operations.
///
/// Reconciliation never produces `SkuNotFound`; a vanished product is demoted
/// to an obsolete flag there. Merging and explicit add-to-cart requests treat
/// the same condition as a hard error.
#[derive(Debug, Error)]
pub enum CartError {
    /// A requested SKU does not exist in this store's catalog.
    #[error("no product with sku {0} in this store")]
    SkuNotFound(String),

    /// The resolved product belongs to a different store.
    #[error("product {sku} does not belong to store {store}")]
    WrongStore {
        /// The requested SKU.
        sku: String,
        /// The store the cart belongs to.
        store: StoreId,
    },

    /// A requested attribute is not offered on the product.
    #[error("product {sku} does not offer attribute {attribute}")]
    AttributeNotFound {
        /// The requested SKU.
        sku: String,
        /// The attribute that is not offered.
        attribute: AttributeId,
    },

    /// Line items must have a positive quantity.
    #[error("quantity must be positive")]
    InvalidQuantity,

    /// The cart has been converted to an order and cannot change.
    #[error("cart is already attached to an order")]
    CartClosed,

    /// Price computation failed.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// The storage layer failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
