//! Catalog resolution and presentation.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

use driftwood_core::FinalPrice;

use crate::db::RepositoryError;
use crate::db::products::ProductRepository;
use crate::models::product::{Product, ProductAttribute};
use crate::models::store::Store;

/// Resolves SKUs against the catalog of one store.
///
/// Cart reconciliation treats the catalog as the single source of truth:
/// a `None` here means the product is gone for this store, not an error.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Resolve a SKU to its current product, with descriptions in `language`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] only for infrastructure failures; an
    /// unknown SKU is `Ok(None)`.
    async fn resolve(
        &self,
        sku: &str,
        store: &Store,
        language: &str,
    ) -> Result<Option<Product>, RepositoryError>;
}

/// Catalog backed by the product tables.
#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductCatalog for PgCatalog {
    async fn resolve(
        &self,
        sku: &str,
        store: &Store,
        language: &str,
    ) -> Result<Option<Product>, RepositoryError> {
        ProductRepository::new(&self.pool)
            .get_by_sku(store.id, sku, language)
            .await
    }
}

/// A product shaped for API responses, with its price already computed.
/// Cached per store under the product's SKU.
#[derive(Debug, Clone, Serialize)]
pub struct ReadableProduct {
    pub sku: String,
    pub name: String,
    pub available: bool,
    pub virtual_product: bool,
    pub price: Decimal,
    pub original_price: Decimal,
    pub discounted: bool,
    pub attributes: Vec<ReadableAttribute>,
}

/// One offered attribute on a [`ReadableProduct`].
#[derive(Debug, Clone, Serialize)]
pub struct ReadableAttribute {
    pub id: i32,
    pub option: String,
    pub value: String,
    pub price_adjustment: Decimal,
}

impl ReadableProduct {
    /// Shape a resolved product and its computed base price for the API.
    #[must_use]
    pub fn from_product(product: &Product, price: &FinalPrice) -> Self {
        Self {
            sku: product.sku.clone(),
            name: product.name.clone(),
            available: product.available,
            virtual_product: product.virtual_product,
            price: price.final_price,
            original_price: price.original_price,
            discounted: price.discounted,
            attributes: product
                .attributes
                .iter()
                .map(ReadableAttribute::from)
                .collect(),
        }
    }
}

impl From<&ProductAttribute> for ReadableAttribute {
    fn from(attr: &ProductAttribute) -> Self {
        Self {
            id: attr.id.as_i32(),
            option: attr.option_name.clone(),
            value: attr.value_name.clone(),
            price_adjustment: attr.price_adjustment,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use driftwood_core::{AttributeId, ProductId, StoreId};

    use super::*;

    #[test]
    fn test_readable_product_carries_computed_price() {
        let product = Product {
            id: ProductId::new(7),
            store_id: StoreId::new(1),
            sku: "MUG".to_owned(),
            name: "Mug".to_owned(),
            available: true,
            virtual_product: false,
            price: dec!(12.00),
            special_price: None,
            attributes: vec![ProductAttribute {
                id: AttributeId::new(3),
                option_id: 30,
                value_id: 300,
                option_name: "Color".to_owned(),
                value_name: "Blue".to_owned(),
                price_adjustment: dec!(0.50),
            }],
        };
        let price = FinalPrice::discounted(dec!(9.00), dec!(12.00));

        let readable = ReadableProduct::from_product(&product, &price);
        assert_eq!(readable.price, dec!(9.00));
        assert!(readable.discounted);
        assert_eq!(readable.attributes.len(), 1);
        assert_eq!(readable.attributes.first().unwrap().option, "Color");
    }
}
