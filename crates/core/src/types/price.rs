//! Price value objects using exact decimal arithmetic.
//!
//! Money never goes through floating point: all amounts are
//! [`rust_decimal::Decimal`] from the moment pricing computes them until they
//! are persisted.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The outcome of pricing a product with a set of selected attributes.
///
/// Produced by the pricing collaborator and copied onto a cart line item; it
/// is never persisted on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalPrice {
    /// The amount the customer pays for one unit.
    pub final_price: Decimal,
    /// The undiscounted amount, equal to `final_price` when no discount applies.
    pub original_price: Decimal,
    /// Whether a discount was applied.
    pub discounted: bool,
}

impl FinalPrice {
    /// A price with no discount applied.
    #[must_use]
    pub const fn undiscounted(amount: Decimal) -> Self {
        Self {
            final_price: amount,
            original_price: amount,
            discounted: false,
        }
    }

    /// A discounted price with its original amount.
    #[must_use]
    pub const fn discounted(final_price: Decimal, original_price: Decimal) -> Self {
        Self {
            final_price,
            original_price,
            discounted: true,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_undiscounted() {
        let price = FinalPrice::undiscounted(dec!(10.00));
        assert_eq!(price.final_price, dec!(10.00));
        assert_eq!(price.original_price, dec!(10.00));
        assert!(!price.discounted);
    }

    #[test]
    fn test_discounted() {
        let price = FinalPrice::discounted(dec!(8.50), dec!(10.00));
        assert_eq!(price.final_price, dec!(8.50));
        assert_eq!(price.original_price, dec!(10.00));
        assert!(price.discounted);
    }

    #[test]
    fn test_serde_uses_string_amounts() {
        let price = FinalPrice::undiscounted(dec!(19.99));
        let json = serde_json::to_string(&price).unwrap();
        // serde-with-str keeps decimals exact over the wire
        assert!(json.contains("\"19.99\""));
    }
}
