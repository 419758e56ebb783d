//! Cart reconciliation.
//!
//! Stored carts are treated as a list of claims, not facts: each line item
//! holds a SKU, a quantity, and attribute selections, and everything else
//! (the product, the attribute objects, the prices) is recomputed here on
//! every fetch. Reconciliation is idempotent when the catalog has not
//! changed.

use std::collections::HashMap;

use rust_decimal::Decimal;

use driftwood_core::AttributeId;

use crate::models::cart::{Cart, CartItem};
use crate::models::product::ProductAttribute;
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
    /// Reconcile one line item against the current catalog.
    ///
    /// When the SKU no longer resolves the item is marked obsolete and
    /// returned otherwise untouched; stored prices stay as they are. When it
    /// does resolve, selections referencing attributes the product no longer
    /// offers are deleted from storage, the survivors are rebound to the
    /// current attribute objects, and prices are recomputed from scratch.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Repository`] or [`CartError::Pricing`].
    pub(crate) async fn reconcile_item(
        &self,
        mut item: CartItem,
        store: &Store,
    ) -> Result<CartItem, CartError> {
        let resolved = self
            .catalog
            .resolve(&item.sku, store, &store.default_language)
            .await?;
        let Some(product) = resolved.filter(|p| p.store_id == store.id) else {
            item.obsolete = true;
            return Ok(item);
        };

        item.sku.clone_from(&product.sku);
        item.virtual_product = product.virtual_product;

        let offered: HashMap<AttributeId, &ProductAttribute> =
            product.attributes.iter().map(|a| (a.id, a)).collect();

        let mut surviving = Vec::new();
        let mut bound: Vec<ProductAttribute> = Vec::new();
        if let Some(selections) = item.attributes.take() {
            for mut selection in selections {
                if let Some(attr) = offered.get(&selection.attribute_id) {
                    selection.attribute = Some((*attr).clone());
                    bound.push((*attr).clone());
                    surviving.push(selection);
                } else if let Some(id) = selection.id {
                    // Orphaned by a catalog change; unpersisted orphans just drop.
                    self.store.delete_selection(id).await?;
                }
            }
        }
        item.attributes = if surviving.is_empty() {
            None
        } else {
            Some(surviving)
        };

        let price = self.pricing.price_of(&product, &bound)?;
        item.item_price = price.final_price;
        item.sub_total = price.final_price * Decimal::from(item.quantity);
        item.product = Some(product);
        item.obsolete = false;
        Ok(item)
    }

    /// Reconcile a whole cart and persist the result.
    ///
    /// An empty cart is marked obsolete immediately, skipping the catalog,
    /// pricing, and persistence entirely. Otherwise every item is
    /// reconciled, the refreshed cart is written back, and the cart-level
    /// obsolete flag is the OR of its items' flags. The flag itself is never
    /// persisted; callers decide what to do with an obsolete cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Repository`] or [`CartError::Pricing`].
    pub(crate) async fn reconcile_cart(
        &self,
        mut cart: Cart,
        store: &Store,
    ) -> Result<Cart, CartError> {
        if cart.line_items.is_empty() {
            cart.obsolete = true;
            return Ok(cart);
        }

        let items = std::mem::take(&mut cart.line_items);
        let mut any_obsolete = false;
        let mut refreshed = Vec::with_capacity(items.len());
        for item in items {
            let item = self.reconcile_item(item, store).await?;
            any_obsolete |= item.obsolete;
            refreshed.push(item);
        }
        cart.line_items = refreshed;

        self.store.update(&mut cart).await?;
        cart.obsolete = any_obsolete;
        Ok(cart)
    }
}
