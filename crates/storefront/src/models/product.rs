//! Catalog product domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use driftwood_core::{AttributeId, ProductId, StoreId};

/// A catalog product resolved for one store and language.
#[derive(Debug, Clone)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Store that owns this product.
    pub store_id: StoreId,
    /// Canonical SKU.
    pub sku: String,
    /// Display name in the resolved language.
    pub name: String,
    /// Whether the product can currently be purchased.
    pub available: bool,
    /// Virtual products (downloads, services) skip shipping.
    pub virtual_product: bool,
    /// Base unit price.
    pub price: Decimal,
    /// Optional promotional price with a validity window.
    pub special_price: Option<SpecialPrice>,
    /// Configurable attributes currently offered on this product.
    pub attributes: Vec<ProductAttribute>,
}

impl Product {
    /// Look up an offered attribute by its ID.
    #[must_use]
    pub fn attribute(&self, id: AttributeId) -> Option<&ProductAttribute> {
        self.attributes.iter().find(|a| a.id == id)
    }
}

/// A promotional price that applies inside an optional date window.
#[derive(Debug, Clone, Copy)]
pub struct SpecialPrice {
    /// The promotional unit price.
    pub amount: Decimal,
    /// When the promotion starts; `None` means already started.
    pub starts: Option<DateTime<Utc>>,
    /// When the promotion ends; `None` means open-ended.
    pub ends: Option<DateTime<Utc>>,
}

impl SpecialPrice {
    /// Whether the promotion is active at `now`.
    #[must_use]
    pub fn active_at(&self, now: DateTime<Utc>) -> bool {
        self.starts.is_none_or(|s| s <= now) && self.ends.is_none_or(|e| now <= e)
    }
}

/// One configurable option/value pair offered on a product
/// (e.g., option "Size", value "L").
#[derive(Debug, Clone)]
pub struct ProductAttribute {
    /// Unique attribute ID; cart selections reference this.
    pub id: AttributeId,
    /// ID of the option this attribute belongs to.
    pub option_id: i32,
    /// ID of the selected option value.
    pub value_id: i32,
    /// Display name of the option (e.g., "Size").
    pub option_name: String,
    /// Display name of the value (e.g., "L").
    pub value_name: String,
    /// Amount added to the base price when this attribute is selected.
    pub price_adjustment: Decimal,
}

/// Build a display name for a product with selected attributes,
/// e.g. `Shirt [Size: L, Color: Blue]`.
#[must_use]
pub fn item_display_name(product_name: &str, attributes: &[ProductAttribute]) -> String {
    if attributes.is_empty() {
        return product_name.to_owned();
    }

    let selected = attributes
        .iter()
        .map(|a| format!("{}: {}", a.option_name, a.value_name))
        .collect::<Vec<_>>()
        .join(", ");

    format!("{product_name} [{selected}]")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    use super::*;

    fn attribute(id: i32, option: &str, value: &str) -> ProductAttribute {
        ProductAttribute {
            id: AttributeId::new(id),
            option_id: id * 10,
            value_id: id * 100,
            option_name: option.to_owned(),
            value_name: value.to_owned(),
            price_adjustment: dec!(0),
        }
    }

    #[test]
    fn test_display_name_without_attributes() {
        assert_eq!(item_display_name("Shirt", &[]), "Shirt");
    }

    #[test]
    fn test_display_name_with_attributes() {
        let attrs = vec![attribute(1, "Size", "L"), attribute(2, "Color", "Blue")];
        assert_eq!(
            item_display_name("Shirt", &attrs),
            "Shirt [Size: L, Color: Blue]"
        );
    }

    #[test]
    fn test_special_price_window() {
        let now = Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap();
        let open_ended = SpecialPrice {
            amount: dec!(5),
            starts: None,
            ends: None,
        };
        assert!(open_ended.active_at(now));

        let expired = SpecialPrice {
            amount: dec!(5),
            starts: None,
            ends: Some(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()),
        };
        assert!(!expired.active_at(now));

        let upcoming = SpecialPrice {
            amount: dec!(5),
            starts: Some(Utc.with_ymd_and_hms(2026, 12, 1, 0, 0, 0).unwrap()),
            ends: None,
        };
        assert!(!upcoming.active_at(now));
    }
}
