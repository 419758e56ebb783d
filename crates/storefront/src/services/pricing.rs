//! Price computation.
//!
//! The pricing rules: the base price is the product price plus the
//! adjustments of every selected attribute; an active special price replaces
//! the product price but still takes the same adjustments. A price is only
//! reported as discounted when the special price actually undercuts the
//! regular one.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use driftwood_core::FinalPrice;

use crate::models::product::{Product, ProductAttribute};

/// Errors from price computation.
#[derive(Debug, Error)]
pub enum PricingError {
    /// Attribute adjustments drove the price below zero.
    #[error("negative price computed for sku {sku}")]
    NegativeAmount {
        /// SKU of the offending product.
        sku: String,
    },
}

/// Computes the unit price of a product with a set of selected attributes.
pub trait Pricing: Send + Sync {
    /// Price `product` with `attributes` selected, as of now.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::NegativeAmount`] if the computed price is
    /// negative.
    fn price_of(
        &self,
        product: &Product,
        attributes: &[ProductAttribute],
    ) -> Result<FinalPrice, PricingError>;
}

/// The standard catalog pricing rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogPricing;

impl CatalogPricing {
    /// Price a product at an explicit instant. Split out from [`Pricing`] so
    /// special-price windows can be tested deterministically.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::NegativeAmount`] if the computed price is
    /// negative.
    pub fn price_at(
        product: &Product,
        attributes: &[ProductAttribute],
        now: DateTime<Utc>,
    ) -> Result<FinalPrice, PricingError> {
        let adjustments: Decimal = attributes.iter().map(|a| a.price_adjustment).sum();
        let regular = product.price + adjustments;

        let price = match &product.special_price {
            Some(special) if special.active_at(now) && special.amount < product.price => {
                FinalPrice::discounted(special.amount + adjustments, regular)
            }
            _ => FinalPrice::undiscounted(regular),
        };

        if price.final_price < Decimal::ZERO {
            return Err(PricingError::NegativeAmount {
                sku: product.sku.clone(),
            });
        }

        Ok(price)
    }
}

impl Pricing for CatalogPricing {
    fn price_of(
        &self,
        product: &Product,
        attributes: &[ProductAttribute],
    ) -> Result<FinalPrice, PricingError> {
        Self::price_at(product, attributes, Utc::now())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    use driftwood_core::{ProductId, StoreId};

    use crate::models::product::SpecialPrice;

    use super::*;

    fn product(price: Decimal, special: Option<SpecialPrice>) -> Product {
        Product {
            id: ProductId::new(1),
            store_id: StoreId::new(1),
            sku: "SHIRT".to_owned(),
            name: "Shirt".to_owned(),
            available: true,
            virtual_product: false,
            price,
            special_price: special,
            attributes: Vec::new(),
        }
    }

    fn adjustment(amount: Decimal) -> ProductAttribute {
        ProductAttribute {
            id: driftwood_core::AttributeId::new(1),
            option_id: 10,
            value_id: 100,
            option_name: "Size".to_owned(),
            value_name: "XL".to_owned(),
            price_adjustment: amount,
        }
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_base_price_without_attributes() {
        let price = CatalogPricing::price_at(&product(dec!(10.00), None), &[], noon()).unwrap();
        assert_eq!(price.final_price, dec!(10.00));
        assert!(!price.discounted);
    }

    #[test]
    fn test_attribute_adjustments_are_added() {
        let price = CatalogPricing::price_at(
            &product(dec!(10.00), None),
            &[adjustment(dec!(2.50))],
            noon(),
        )
        .unwrap();
        assert_eq!(price.final_price, dec!(12.50));
    }

    #[test]
    fn test_active_special_price_discounts() {
        let special = SpecialPrice {
            amount: dec!(8.00),
            starts: None,
            ends: None,
        };
        let price = CatalogPricing::price_at(
            &product(dec!(10.00), Some(special)),
            &[adjustment(dec!(1.00))],
            noon(),
        )
        .unwrap();
        assert_eq!(price.final_price, dec!(9.00));
        assert_eq!(price.original_price, dec!(11.00));
        assert!(price.discounted);
    }

    #[test]
    fn test_expired_special_price_is_ignored() {
        let special = SpecialPrice {
            amount: dec!(8.00),
            starts: None,
            ends: Some(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()),
        };
        let price =
            CatalogPricing::price_at(&product(dec!(10.00), Some(special)), &[], noon()).unwrap();
        assert_eq!(price.final_price, dec!(10.00));
        assert!(!price.discounted);
    }

    #[test]
    fn test_special_price_above_regular_is_not_a_discount() {
        let special = SpecialPrice {
            amount: dec!(12.00),
            starts: None,
            ends: None,
        };
        let price =
            CatalogPricing::price_at(&product(dec!(10.00), Some(special)), &[], noon()).unwrap();
        assert_eq!(price.final_price, dec!(10.00));
        assert!(!price.discounted);
    }

    #[test]
    fn test_negative_price_is_rejected() {
        let result = CatalogPricing::price_at(
            &product(dec!(1.00), None),
            &[adjustment(dec!(-5.00))],
            noon(),
        );
        assert!(matches!(result, Err(PricingError::NegativeAmount { .. })));
    }
}
