//! Merge-on-login.
//!
//! When a customer logs in with an anonymous session cart, the session
//! cart's contents are folded into the customer's cart. Unlike
//! reconciliation, merging is strict: a session item whose product has
//! vanished aborts the whole merge, and the session cart is only deleted
//! after the merged customer cart has been persisted. A failed merge
//! therefore leaves the session cart intact.

use std::collections::HashMap;

use rust_decimal::Decimal;

use driftwood_core::{AttributeId, ProductId};

use crate::models::cart::{Cart, CartItem};
use crate::models::store::Store;
use crate::services::catalog::ProductCatalog;
use crate::services::pricing::Pricing;

use super::{CartError, CartService, CartStore, SelectionStore};

impl<C, P, S> CartService<C, P, S>
where
    C: ProductCatalog,
    P: Pricing,
    S: CartStore + SelectionStore,
{
    /// Fold `session_cart` into `customer_cart` and persist the result.
    ///
    /// Quantities are additive per product: a session item for a product
    /// already in the customer cart raises that item's quantity, anything
    /// else is appended. When the session cart already belongs to the same
    /// customer and both carts have items, nothing is merged and the
    /// customer cart is returned as-is.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::SkuNotFound`] or [`CartError::WrongStore`] when
    /// a session item no longer resolves cleanly, [`CartError::CartClosed`]
    /// when the customer cart is attached to an order, and
    /// [`CartError::Repository`] or [`CartError::Pricing`] otherwise.
    pub async fn merge(
        &self,
        mut customer_cart: Cart,
        session_cart: Cart,
        store: &Store,
    ) -> Result<Cart, CartError> {
        if session_cart.customer_id.is_some()
            && session_cart.customer_id == customer_cart.customer_id
            && !customer_cart.is_empty()
            && !session_cart.is_empty()
        {
            tracing::debug!(
                code = %session_cart.code,
                "session cart already belongs to the customer, nothing to merge"
            );
            return Ok(customer_cart);
        }

        if customer_cart.is_closed() {
            return Err(CartError::CartClosed);
        }

        if !session_cart.is_empty() {
            let incoming = self.materialize_session_items(&session_cart, store).await?;

            let mut by_product: HashMap<ProductId, usize> = customer_cart
                .line_items
                .iter()
                .enumerate()
                .filter_map(|(index, item)| item.product_id().map(|id| (id, index)))
                .collect();

            for item in incoming {
                let Some(product_id) = item.product_id() else {
                    continue; // materialized items always carry a product
                };
                match by_product.get(&product_id) {
                    Some(&index) => {
                        if let Some(existing) = customer_cart.line_items.get_mut(index) {
                            existing.quantity += item.quantity;
                            existing.sub_total =
                                existing.item_price * Decimal::from(existing.quantity);
                        }
                    }
                    None => {
                        by_product.insert(product_id, customer_cart.line_items.len());
                        customer_cart.line_items.push(item);
                    }
                }
            }
        }

        self.save_or_update(&mut customer_cart, None).await?;

        // The session cart survives any failure above.
        if let Some(session_id) = session_cart.id {
            self.store.delete(session_id).await?;
        }

        tracing::info!(
            code = %customer_cart.code,
            items = customer_cart.line_items.len(),
            "merged session cart into customer cart"
        );
        Ok(customer_cart)
    }

    /// Re-resolve every session item against the catalog, keeping only the
    /// attribute selections the product still offers, and price the result.
    async fn materialize_session_items(
        &self,
        session_cart: &Cart,
        store: &Store,
    ) -> Result<Vec<CartItem>, CartError> {
        let mut items = Vec::with_capacity(session_cart.line_items.len());
        for session_item in &session_cart.line_items {
            let product = self
                .catalog
                .resolve(&session_item.sku, store, &store.default_language)
                .await?
                .ok_or_else(|| CartError::SkuNotFound(session_item.sku.clone()))?;

            if product.store_id != store.id {
                return Err(CartError::WrongStore {
                    sku: session_item.sku.clone(),
                    store: store.id,
                });
            }

            let selections: Vec<AttributeId> = session_item
                .attributes
                .as_deref()
                .unwrap_or_default()
                .iter()
                .filter(|s| product.attribute(s.attribute_id).is_some())
                .map(|s| s.attribute_id)
                .collect();

            items.push(self.populate_item(&product, session_item.quantity, &selections)?);
        }
        Ok(items)
    }
}
