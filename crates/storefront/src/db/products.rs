//! Catalog product persistence.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use driftwood_core::{AttributeId, ProductId, StoreId};

use crate::models::product::{Product, ProductAttribute, SpecialPrice};

use super::RepositoryError;

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i32,
    store_id: i32,
    sku: String,
    name: String,
    available: bool,
    virtual_product: bool,
    price: Decimal,
    special_price: Option<Decimal>,
    special_price_starts: Option<DateTime<Utc>>,
    special_price_ends: Option<DateTime<Utc>>,
}

#[derive(sqlx::FromRow)]
struct AttributeRow {
    id: i32,
    option_id: i32,
    value_id: i32,
    option_name: String,
    value_name: String,
    price_adjustment: Decimal,
}

impl From<AttributeRow> for ProductAttribute {
    fn from(row: AttributeRow) -> Self {
        Self {
            id: AttributeId::new(row.id),
            option_id: row.option_id,
            value_id: row.value_id,
            option_name: row.option_name,
            value_name: row.value_name,
            price_adjustment: row.price_adjustment,
        }
    }
}

/// Repository for catalog products.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Resolve a product by SKU for one store, with its description in the
    /// requested language (falling back to the SKU when no description
    /// exists) and its currently offered attributes.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if a query fails.
    pub async fn get_by_sku(
        &self,
        store_id: StoreId,
        sku: &str,
        language: &str,
    ) -> Result<Option<Product>, RepositoryError> {
        let Some(row) = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT p.id, p.store_id, p.sku, COALESCE(d.name, p.sku) AS name,
                   p.available, p.virtual_product, p.price,
                   p.special_price, p.special_price_starts, p.special_price_ends
            FROM product p
            LEFT JOIN product_description d
                ON d.product_id = p.id AND d.language = $3
            WHERE p.store_id = $1 AND p.sku = $2
            ",
        )
        .bind(store_id)
        .bind(sku)
        .bind(language)
        .fetch_optional(self.pool)
        .await?
        else {
            return Ok(None);
        };

        let attributes = self.attributes_of(ProductId::new(row.id)).await?;

        Ok(Some(Product {
            id: ProductId::new(row.id),
            store_id: StoreId::new(row.store_id),
            sku: row.sku,
            name: row.name,
            available: row.available,
            virtual_product: row.virtual_product,
            price: row.price,
            special_price: row.special_price.map(|amount| SpecialPrice {
                amount,
                starts: row.special_price_starts,
                ends: row.special_price_ends,
            }),
            attributes,
        }))
    }

    async fn attributes_of(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ProductAttribute>, RepositoryError> {
        let rows = sqlx::query_as::<_, AttributeRow>(
            r"
            SELECT id, option_id, value_id, option_name, value_name, price_adjustment
            FROM product_attribute
            WHERE product_id = $1
            ORDER BY id
            ",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(ProductAttribute::from).collect())
    }
}
