//! Shopping cart persistence.
//!
//! Carts are written wholesale: `update` replaces every line item and
//! selection inside one transaction rather than diffing, which keeps the
//! stored cart exactly equal to the reconciled in-memory cart.

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use driftwood_core::{
    AttributeId, CartId, CartItemId, CustomerId, OrderId, SelectionId, StoreId,
};

use crate::models::cart::{AttributeSelection, Cart, CartItem};

use super::RepositoryError;

#[derive(sqlx::FromRow)]
struct CartRow {
    id: i32,
    code: String,
    store_id: i32,
    customer_id: Option<i32>,
    order_id: Option<i32>,
    ip_address: Option<String>,
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: i32,
    sku: String,
    quantity: i32,
    item_price: Decimal,
    sub_total: Decimal,
    virtual_product: bool,
}

#[derive(sqlx::FromRow)]
struct SelectionRow {
    id: i32,
    cart_item_id: i32,
    attribute_id: i32,
}

/// Repository for shopping carts.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find a cart by its public code, scoped to a store.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] or
    /// [`RepositoryError::DataCorruption`] if a stored quantity is invalid.
    pub async fn find_by_code(
        &self,
        store_id: StoreId,
        code: &str,
    ) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            r"
            SELECT id, code, store_id, customer_id, order_id, ip_address
            FROM shopping_cart
            WHERE store_id = $1 AND code = $2
            ",
        )
        .bind(store_id)
        .bind(code)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.load_items(row).await?)),
            None => Ok(None),
        }
    }

    /// Find a cart by ID, scoped to a store.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] or
    /// [`RepositoryError::DataCorruption`] if a stored quantity is invalid.
    pub async fn find_by_id(
        &self,
        store_id: StoreId,
        id: CartId,
    ) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            r"
            SELECT id, code, store_id, customer_id, order_id, ip_address
            FROM shopping_cart
            WHERE store_id = $1 AND id = $2
            ",
        )
        .bind(store_id)
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.load_items(row).await?)),
            None => Ok(None),
        }
    }

    /// Find a customer's active cart: the oldest cart that has not been
    /// converted to an order.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] or
    /// [`RepositoryError::DataCorruption`] if a stored quantity is invalid.
    pub async fn find_active_by_customer(
        &self,
        store_id: StoreId,
        customer_id: CustomerId,
    ) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            r"
            SELECT id, code, store_id, customer_id, order_id, ip_address
            FROM shopping_cart
            WHERE store_id = $1 AND customer_id = $2 AND order_id IS NULL
            ORDER BY id
            LIMIT 1
            ",
        )
        .bind(store_id)
        .bind(customer_id)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.load_items(row).await?)),
            None => Ok(None),
        }
    }

    /// Insert a new cart with its items, assigning database IDs in place.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if any statement fails.
    pub async fn create(&self, cart: &mut Cart) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let (id,) = sqlx::query_as::<_, (i32,)>(
            r"
            INSERT INTO shopping_cart (code, store_id, customer_id, order_id, ip_address)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            ",
        )
        .bind(&cart.code)
        .bind(cart.store_id)
        .bind(cart.customer_id)
        .bind(cart.order_id)
        .bind(cart.ip_address.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        let cart_id = CartId::new(id);
        cart.id = Some(cart_id);
        Self::insert_items(&mut tx, cart_id, &mut cart.line_items).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Replace a persisted cart with its current in-memory state. Line items
    /// and selections are rewritten, so their IDs are reassigned in place.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if the cart row no longer
    /// exists, [`RepositoryError::Database`] on any other failure.
    pub async fn update(&self, cart: &mut Cart) -> Result<(), RepositoryError> {
        let Some(cart_id) = cart.id else {
            return Err(RepositoryError::NotFound);
        };

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r"
            UPDATE shopping_cart
            SET customer_id = $2, order_id = $3, ip_address = $4, updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(cart_id)
        .bind(cart.customer_id)
        .bind(cart.order_id)
        .bind(cart.ip_address.as_deref())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        // Cascades to cart_item_attribute.
        sqlx::query("DELETE FROM cart_item WHERE cart_id = $1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;

        Self::insert_items(&mut tx, cart_id, &mut cart.line_items).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Delete a cart; items and selections go with it via cascade.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if the delete fails.
    pub async fn delete(&self, cart_id: CartId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM shopping_cart WHERE id = $1")
            .bind(cart_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Delete a single persisted attribute selection.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if the delete fails.
    pub async fn delete_selection(&self, id: SelectionId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM cart_item_attribute WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    async fn insert_items(
        tx: &mut Transaction<'_, Postgres>,
        cart_id: CartId,
        items: &mut [CartItem],
    ) -> Result<(), RepositoryError> {
        for item in items {
            let (item_id,) = sqlx::query_as::<_, (i32,)>(
                r"
                INSERT INTO cart_item
                    (cart_id, sku, quantity, item_price, sub_total, virtual_product)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id
                ",
            )
            .bind(cart_id)
            .bind(&item.sku)
            .bind(i32::try_from(item.quantity).unwrap_or(i32::MAX))
            .bind(item.item_price)
            .bind(item.sub_total)
            .bind(item.virtual_product)
            .fetch_one(&mut **tx)
            .await?;

            item.id = Some(CartItemId::new(item_id));

            for selection in item.attributes.iter_mut().flatten() {
                let (selection_id,) = sqlx::query_as::<_, (i32,)>(
                    r"
                    INSERT INTO cart_item_attribute (cart_item_id, attribute_id)
                    VALUES ($1, $2)
                    RETURNING id
                    ",
                )
                .bind(item_id)
                .bind(selection.attribute_id)
                .fetch_one(&mut **tx)
                .await?;

                selection.id = Some(SelectionId::new(selection_id));
            }
        }
        Ok(())
    }

    async fn load_items(&self, row: CartRow) -> Result<Cart, RepositoryError> {
        let cart_id = CartId::new(row.id);

        let item_rows = sqlx::query_as::<_, ItemRow>(
            r"
            SELECT id, sku, quantity, item_price, sub_total, virtual_product
            FROM cart_item
            WHERE cart_id = $1
            ORDER BY id
            ",
        )
        .bind(cart_id)
        .fetch_all(self.pool)
        .await?;

        let selection_rows = sqlx::query_as::<_, SelectionRow>(
            r"
            SELECT s.id, s.cart_item_id, s.attribute_id
            FROM cart_item_attribute s
            JOIN cart_item i ON i.id = s.cart_item_id
            WHERE i.cart_id = $1
            ORDER BY s.id
            ",
        )
        .bind(cart_id)
        .fetch_all(self.pool)
        .await?;

        let mut items = Vec::with_capacity(item_rows.len());
        for item_row in item_rows {
            let quantity = u32::try_from(item_row.quantity).map_err(|_| {
                RepositoryError::DataCorruption(format!(
                    "cart item {} has negative quantity {}",
                    item_row.id, item_row.quantity
                ))
            })?;

            let selections: Vec<AttributeSelection> = selection_rows
                .iter()
                .filter(|s| s.cart_item_id == item_row.id)
                .map(|s| AttributeSelection {
                    id: Some(SelectionId::new(s.id)),
                    attribute_id: AttributeId::new(s.attribute_id),
                    attribute: None,
                })
                .collect();

            items.push(CartItem {
                id: Some(CartItemId::new(item_row.id)),
                sku: item_row.sku,
                quantity,
                product: None,
                attributes: if selections.is_empty() {
                    None
                } else {
                    Some(selections)
                },
                item_price: item_row.item_price,
                sub_total: item_row.sub_total,
                obsolete: false,
                virtual_product: item_row.virtual_product,
            });
        }

        Ok(Cart {
            id: Some(cart_id),
            code: row.code,
            store_id: StoreId::new(row.store_id),
            customer_id: row.customer_id.map(CustomerId::new),
            order_id: row.order_id.map(OrderId::new),
            ip_address: row.ip_address,
            line_items: items,
            obsolete: false,
        })
    }
}
