//! Shopping cart service.
//!
//! Carts never trust their stored state: every fetch re-resolves each line
//! item against the catalog, rebinds attribute selections, and recomputes
//! prices (reconciliation). When a customer logs in, their anonymous session
//! cart is folded into their customer cart ([`CartService::merge`]).

use rust_decimal::Decimal;

use driftwood_core::{AttributeId, CartId, CustomerId};

use crate::models::cart::{AttributeSelection, Cart, CartItem};
use crate::models::product::Product;
use crate::models::store::Store;
use crate::services::catalog::ProductCatalog;
use crate::services::pricing::Pricing;

mod error;
mod merge;
mod reconcile;
mod store;

pub use error::CartError;
pub use store::{CartStore, PgCartStore, SelectionStore};

#[cfg(test)]
mod tests;

/// A request to put a product into a cart.
#[derive(Debug, Clone)]
pub struct ItemRequest {
    /// SKU of the product to add.
    pub sku: String,
    /// Desired quantity; `0` removes the product from the cart.
    pub quantity: u32,
    /// Selected attribute IDs.
    pub attributes: Vec<AttributeId>,
}

/// The cart service, generic over its collaborators so the merge and
/// reconciliation rules are testable without a database.
pub struct CartService<C, P, S> {
    catalog: C,
    pricing: P,
    store: S,
}

impl<C, P, S> CartService<C, P, S>
where
    C: ProductCatalog,
    P: Pricing,
    S: CartStore + SelectionStore,
{
    #[must_use]
    pub const fn new(catalog: C, pricing: P, store: S) -> Self {
        Self {
            catalog,
            pricing,
            store,
        }
    }

    /// The catalog this service resolves SKUs against.
    #[must_use]
    pub const fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Fetch a cart by its public code, reconciled against the catalog.
    ///
    /// Returns `None` for an unknown code or when reconciliation finds the
    /// cart obsolete, in which case the cart is deleted.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Repository`] or [`CartError::Pricing`].
    pub async fn get_by_code(
        &self,
        code: &str,
        store: &Store,
    ) -> Result<Option<Cart>, CartError> {
        let Some(cart) = self.store.find_by_code(store.id, code).await? else {
            return Ok(None);
        };
        self.reconcile_and_prune(cart, store).await
    }

    /// Fetch a cart by ID, reconciled against the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Repository`] or [`CartError::Pricing`].
    pub async fn get_by_id(&self, id: CartId, store: &Store) -> Result<Option<Cart>, CartError> {
        let Some(cart) = self.store.find_by_id(store.id, id).await? else {
            return Ok(None);
        };
        self.reconcile_and_prune(cart, store).await
    }

    /// Fetch a customer's active cart, reconciled against the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Repository`] or [`CartError::Pricing`].
    pub async fn get_for_customer(
        &self,
        customer_id: CustomerId,
        store: &Store,
    ) -> Result<Option<Cart>, CartError> {
        let Some(cart) = self
            .store
            .find_active_by_customer(store.id, customer_id)
            .await?
        else {
            return Ok(None);
        };
        self.reconcile_and_prune(cart, store).await
    }

    /// Create a cart, optionally owned by a customer, priced and persisted.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::SkuNotFound`], [`CartError::WrongStore`],
    /// [`CartError::AttributeNotFound`], or [`CartError::InvalidQuantity`]
    /// for bad requests, [`CartError::Repository`] or [`CartError::Pricing`]
    /// otherwise.
    pub async fn create_cart(
        &self,
        store: &Store,
        customer_id: Option<CustomerId>,
        items: &[ItemRequest],
        ip_address: Option<&str>,
    ) -> Result<Cart, CartError> {
        let mut cart = Cart::new(store.id);
        cart.customer_id = customer_id;

        for request in items {
            let product = self.resolve_for_request(&request.sku, store).await?;
            cart.line_items
                .push(self.populate_item(&product, request.quantity, &request.attributes)?);
        }

        self.save_or_update(&mut cart, ip_address).await?;
        Ok(cart)
    }

    /// Add a product to a cart, or change its quantity. A quantity of zero
    /// removes the product. The cart is persisted before returning.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::CartClosed`] when the cart already belongs to an
    /// order, plus everything [`Self::create_cart`] can return.
    pub async fn add_item(
        &self,
        cart: &mut Cart,
        store: &Store,
        request: &ItemRequest,
        ip_address: Option<&str>,
    ) -> Result<(), CartError> {
        if cart.is_closed() {
            return Err(CartError::CartClosed);
        }

        let product = self.resolve_for_request(&request.sku, store).await?;

        if request.quantity == 0 {
            cart.line_items.retain(|item| item.sku != product.sku);
        } else if let Some(existing) = cart
            .line_items
            .iter_mut()
            .find(|item| item.product_id() == Some(product.id) || item.sku == product.sku)
        {
            existing.quantity = request.quantity;
            existing.sub_total = existing.item_price * Decimal::from(request.quantity);
        } else {
            cart.line_items
                .push(self.populate_item(&product, request.quantity, &request.attributes)?);
        }

        self.save_or_update(cart, ip_address).await
    }

    /// Persist a cart, inserting it on first save.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Repository`] if storage fails.
    pub async fn save_or_update(
        &self,
        cart: &mut Cart,
        ip_address: Option<&str>,
    ) -> Result<(), CartError> {
        if let Some(ip) = ip_address {
            cart.ip_address = Some(ip.to_owned());
        }
        if cart.id.is_none() {
            self.store.create(cart).await?;
        } else {
            self.store.update(cart).await?;
        }
        Ok(())
    }

    /// Delete a cart outright.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Repository`] if storage fails.
    pub async fn delete_cart(&self, cart: &Cart) -> Result<(), CartError> {
        if let Some(id) = cart.id {
            self.store.delete(id).await?;
        }
        Ok(())
    }

    /// Build a fully priced line item for a resolved product.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] for a zero quantity,
    /// [`CartError::AttributeNotFound`] for a selection the product does not
    /// offer, or [`CartError::Pricing`].
    pub(crate) fn populate_item(
        &self,
        product: &Product,
        quantity: u32,
        selections: &[AttributeId],
    ) -> Result<CartItem, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        let mut bound = Vec::with_capacity(selections.len());
        let mut attrs = Vec::with_capacity(selections.len());
        for &attribute_id in selections {
            let attr = product
                .attribute(attribute_id)
                .ok_or_else(|| CartError::AttributeNotFound {
                    sku: product.sku.clone(),
                    attribute: attribute_id,
                })?;
            bound.push(attr.clone());
            attrs.push(AttributeSelection {
                id: None,
                attribute_id,
                attribute: Some(attr.clone()),
            });
        }

        let price = self.pricing.price_of(product, &bound)?;

        let mut item = CartItem::new(product.sku.clone(), quantity);
        item.virtual_product = product.virtual_product;
        item.product = Some(product.clone());
        item.attributes = if attrs.is_empty() { None } else { Some(attrs) };
        item.item_price = price.final_price;
        item.sub_total = price.final_price * Decimal::from(quantity);
        Ok(item)
    }

    /// Resolve a SKU for an explicit request, where a missing product is a
    /// hard error rather than an obsolete flag.
    async fn resolve_for_request(
        &self,
        sku: &str,
        store: &Store,
    ) -> Result<Product, CartError> {
        let product = self
            .catalog
            .resolve(sku, store, &store.default_language)
            .await?
            .ok_or_else(|| CartError::SkuNotFound(sku.to_owned()))?;

        if product.store_id != store.id {
            return Err(CartError::WrongStore {
                sku: sku.to_owned(),
                store: store.id,
            });
        }
        Ok(product)
    }

    /// Reconcile a freshly loaded cart and delete it when obsolete.
    async fn reconcile_and_prune(
        &self,
        cart: Cart,
        store: &Store,
    ) -> Result<Option<Cart>, CartError> {
        let cart = self.reconcile_cart(cart, store).await?;
        if cart.obsolete {
            tracing::debug!(code = %cart.code, "deleting obsolete cart");
            self.delete_cart(&cart).await?;
            return Ok(None);
        }
        Ok(Some(cart))
    }
}
