//! Merchant store domain type.

use driftwood_core::StoreId;

/// A merchant store.
///
/// Every cart, customer, and product is scoped to exactly one store; cross-store
/// references are treated as catalog inconsistencies.
#[derive(Debug, Clone)]
pub struct Store {
    /// Unique store ID.
    pub id: StoreId,
    /// Stable store code used in URLs and cache keys.
    pub code: String,
    /// ISO 639-1 code of the store's default language (e.g., "en").
    pub default_language: String,
    /// ISO 4217 currency code (e.g., "USD").
    pub currency: String,
}
