//! Cart service tests against in-memory collaborators.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use driftwood_core::{
    AttributeId, CartId, CartItemId, CustomerId, FinalPrice, ProductId, SelectionId, StoreId,
};

use crate::db::RepositoryError;
use crate::models::cart::{AttributeSelection, Cart, CartItem};
use crate::models::product::{Product, ProductAttribute};
use crate::models::store::Store;
use crate::services::catalog::ProductCatalog;
use crate::services::pricing::{Pricing, PricingError};

use super::{CartError, CartService, CartStore, ItemRequest, SelectionStore};

#[derive(Default)]
struct FakeCatalog {
    products: HashMap<String, Product>,
}

impl FakeCatalog {
    fn with(products: Vec<Product>) -> Self {
        Self {
            products: products.into_iter().map(|p| (p.sku.clone(), p)).collect(),
        }
    }
}

#[async_trait]
impl ProductCatalog for FakeCatalog {
    async fn resolve(
        &self,
        sku: &str,
        _store: &Store,
        _language: &str,
    ) -> Result<Option<Product>, RepositoryError> {
        Ok(self.products.get(sku).cloned())
    }
}

/// Pricing fake that counts invocations, so tests can assert that pricing
/// is skipped entirely for empty carts.
#[derive(Clone, Default)]
struct CountingPricing {
    calls: Arc<AtomicUsize>,
}

impl Pricing for CountingPricing {
    fn price_of(
        &self,
        product: &Product,
        attributes: &[ProductAttribute],
    ) -> Result<FinalPrice, PricingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let adjustments: Decimal = attributes.iter().map(|a| a.price_adjustment).sum();
        Ok(FinalPrice::undiscounted(product.price + adjustments))
    }
}

#[derive(Default)]
struct MemoryInner {
    carts: HashMap<i32, Cart>,
    next_id: i32,
    deleted_carts: Vec<i32>,
    deleted_selections: Vec<SelectionId>,
}

impl MemoryInner {
    fn next(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn assign_ids(&mut self, cart: &mut Cart) {
        for item in &mut cart.line_items {
            if item.id.is_none() {
                item.id = Some(CartItemId::new(self.next()));
            }
            for selection in item.attributes.iter_mut().flatten() {
                if selection.id.is_none() {
                    selection.id = Some(SelectionId::new(self.next()));
                }
            }
        }
    }
}

#[derive(Clone, Default)]
struct MemoryCartStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryCartStore {
    fn stored(&self, id: CartId) -> Option<Cart> {
        self.inner.lock().unwrap().carts.get(&id.as_i32()).cloned()
    }

    fn deleted_carts(&self) -> Vec<i32> {
        self.inner.lock().unwrap().deleted_carts.clone()
    }

    fn deleted_selections(&self) -> Vec<SelectionId> {
        self.inner.lock().unwrap().deleted_selections.clone()
    }
}

#[async_trait]
impl CartStore for MemoryCartStore {
    async fn find_active_by_customer(
        &self,
        store_id: StoreId,
        customer_id: CustomerId,
    ) -> Result<Option<Cart>, RepositoryError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .carts
            .values()
            .filter(|c| {
                c.store_id == store_id
                    && c.customer_id == Some(customer_id)
                    && c.order_id.is_none()
            })
            .min_by_key(|c| c.id.map(|id| id.as_i32()))
            .cloned())
    }

    async fn find_by_code(
        &self,
        store_id: StoreId,
        code: &str,
    ) -> Result<Option<Cart>, RepositoryError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .carts
            .values()
            .find(|c| c.store_id == store_id && c.code == code)
            .cloned())
    }

    async fn find_by_id(
        &self,
        store_id: StoreId,
        id: CartId,
    ) -> Result<Option<Cart>, RepositoryError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .carts
            .get(&id.as_i32())
            .filter(|c| c.store_id == store_id)
            .cloned())
    }

    async fn create(&self, cart: &mut Cart) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next();
        cart.id = Some(CartId::new(id));
        inner.assign_ids(cart);
        inner.carts.insert(id, cart.clone());
        Ok(())
    }

    async fn update(&self, cart: &mut Cart) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().unwrap();
        let Some(id) = cart.id else {
            return Err(RepositoryError::NotFound);
        };
        if !inner.carts.contains_key(&id.as_i32()) {
            return Err(RepositoryError::NotFound);
        }
        inner.assign_ids(cart);
        inner.carts.insert(id.as_i32(), cart.clone());
        Ok(())
    }

    async fn delete(&self, cart_id: CartId) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().unwrap();
        inner.carts.remove(&cart_id.as_i32());
        inner.deleted_carts.push(cart_id.as_i32());
        Ok(())
    }
}

#[async_trait]
impl SelectionStore for MemoryCartStore {
    async fn delete_selection(&self, id: SelectionId) -> Result<(), RepositoryError> {
        self.inner.lock().unwrap().deleted_selections.push(id);
        Ok(())
    }
}

fn test_store() -> Store {
    Store {
        id: StoreId::new(1),
        code: "DEFAULT".to_owned(),
        default_language: "en".to_owned(),
        currency: "USD".to_owned(),
    }
}

fn product(id: i32, sku: &str, price: Decimal) -> Product {
    Product {
        id: ProductId::new(id),
        store_id: StoreId::new(1),
        sku: sku.to_owned(),
        name: sku.to_owned(),
        available: true,
        virtual_product: false,
        price,
        special_price: None,
        attributes: Vec::new(),
    }
}

fn attribute(id: i32, option: &str, value: &str, adjustment: Decimal) -> ProductAttribute {
    ProductAttribute {
        id: AttributeId::new(id),
        option_id: id * 10,
        value_id: id * 100,
        option_name: option.to_owned(),
        value_name: value.to_owned(),
        price_adjustment: adjustment,
    }
}

type TestService = CartService<FakeCatalog, CountingPricing, MemoryCartStore>;

fn service(products: Vec<Product>) -> (TestService, MemoryCartStore, Arc<AtomicUsize>) {
    let pricing = CountingPricing::default();
    let calls = Arc::clone(&pricing.calls);
    let store = MemoryCartStore::default();
    let service = CartService::new(FakeCatalog::with(products), pricing, store.clone());
    (service, store, calls)
}

/// Persist a raw cart directly in the fake store, bypassing the service.
async fn seed_cart(store: &MemoryCartStore, mut cart: Cart) -> Cart {
    store.create(&mut cart).await.unwrap();
    cart
}

#[tokio::test]
async fn test_empty_cart_is_obsolete_without_touching_pricing() {
    let store = test_store();
    let (service, carts, pricing_calls) = service(vec![product(1, "SHIRT", dec!(10.00))]);

    let cart = seed_cart(&carts, Cart::new(store.id)).await;
    let code = cart.code.clone();

    let fetched = service.get_by_code(&code, &store).await.unwrap();
    assert!(fetched.is_none());
    assert_eq!(pricing_calls.load(Ordering::SeqCst), 0);
    assert_eq!(carts.deleted_carts().len(), 1);
}

#[tokio::test]
async fn test_reconcile_prices_item_from_catalog() {
    let store = test_store();
    let (service, carts, _) = service(vec![product(1, "SHIRT", dec!(10.00))]);

    let mut cart = Cart::new(store.id);
    cart.line_items.push(CartItem::new("SHIRT", 2));
    let cart = seed_cart(&carts, cart).await;

    let fetched = service
        .get_by_code(&cart.code, &store)
        .await
        .unwrap()
        .unwrap();
    let item = fetched.line_items.first().unwrap();
    assert_eq!(item.item_price, dec!(10.00));
    assert_eq!(item.sub_total, dec!(20.00));
    assert!(!item.obsolete);
    assert_eq!(fetched.subtotal(), dec!(20.00));
}

#[tokio::test]
async fn test_vanished_sku_marks_item_obsolete_and_keeps_stored_price() {
    let store = test_store();
    let (service, _, _) = service(vec![]);

    let mut item = CartItem::new("GONE", 1);
    item.item_price = dec!(9.99);
    item.sub_total = dec!(9.99);

    let reconciled = service.reconcile_item(item, &store).await.unwrap();
    assert!(reconciled.obsolete);
    assert_eq!(reconciled.item_price, dec!(9.99));
    assert!(reconciled.product.is_none());
}

#[tokio::test]
async fn test_cart_with_vanished_sku_is_deleted_on_fetch() {
    let store = test_store();
    let (service, carts, _) = service(vec![product(1, "SHIRT", dec!(10.00))]);

    let mut cart = Cart::new(store.id);
    cart.line_items.push(CartItem::new("SHIRT", 1));
    cart.line_items.push(CartItem::new("GONE", 1));
    let cart = seed_cart(&carts, cart).await;

    let fetched = service.get_by_code(&cart.code, &store).await.unwrap();
    assert!(fetched.is_none());
    assert_eq!(carts.deleted_carts(), vec![cart.id.unwrap().as_i32()]);
}

#[tokio::test]
async fn test_orphaned_selection_is_deleted_and_survivor_rebound() {
    let store = test_store();
    let mut shirt = product(1, "SHIRT", dec!(10.00));
    shirt.attributes = vec![attribute(2, "Size", "L", dec!(1.00))];
    let (service, carts, _) = service(vec![shirt]);

    let mut item = CartItem::new("SHIRT", 1);
    item.attributes = Some(vec![
        AttributeSelection {
            id: Some(SelectionId::new(11)),
            attribute_id: AttributeId::new(1), // no longer offered
            attribute: None,
        },
        AttributeSelection {
            id: Some(SelectionId::new(12)),
            attribute_id: AttributeId::new(2),
            attribute: None,
        },
    ]);

    let reconciled = service.reconcile_item(item, &store).await.unwrap();
    let selections = reconciled.attributes.unwrap();
    assert_eq!(selections.len(), 1);
    assert_eq!(selections.first().unwrap().attribute_id, AttributeId::new(2));
    assert!(selections.first().unwrap().attribute.is_some());
    assert_eq!(carts.deleted_selections(), vec![SelectionId::new(11)]);
    // survivor's adjustment priced in
    assert_eq!(reconciled.item_price, dec!(11.00));
}

#[tokio::test]
async fn test_all_selections_orphaned_leaves_none_not_empty_vec() {
    let store = test_store();
    let (service, _, _) = service(vec![product(1, "SHIRT", dec!(10.00))]);

    let mut item = CartItem::new("SHIRT", 1);
    item.attributes = Some(vec![AttributeSelection::new(AttributeId::new(9))]);

    let reconciled = service.reconcile_item(item, &store).await.unwrap();
    assert!(reconciled.attributes.is_none());
}

#[tokio::test]
async fn test_reconciliation_is_idempotent() {
    let store = test_store();
    let mut shirt = product(1, "SHIRT", dec!(10.00));
    shirt.attributes = vec![attribute(2, "Size", "L", dec!(1.50))];
    let (service, carts, _) = service(vec![shirt, product(2, "MUG", dec!(7.50))]);

    let mut cart = Cart::new(store.id);
    let mut item = CartItem::new("SHIRT", 2);
    item.attributes = Some(vec![AttributeSelection::new(AttributeId::new(2))]);
    cart.line_items.push(item);
    cart.line_items.push(CartItem::new("MUG", 1));
    let cart = seed_cart(&carts, cart).await;

    let first = service
        .get_by_code(&cart.code, &store)
        .await
        .unwrap()
        .unwrap();
    let second = service
        .get_by_code(&cart.code, &store)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(first.line_items.len(), second.line_items.len());
    for (a, b) in first.line_items.iter().zip(second.line_items.iter()) {
        assert_eq!(a.sku, b.sku);
        assert_eq!(a.quantity, b.quantity);
        assert_eq!(a.item_price, b.item_price);
        assert_eq!(a.sub_total, b.sub_total);
    }
    assert_eq!(first.subtotal(), dec!(30.50));
}

#[tokio::test]
async fn test_merge_adds_quantities_for_shared_product() {
    let store = test_store();
    let (service, carts, _) = service(vec![product(1, "SHIRT", dec!(10.00))]);

    let customer_id = CustomerId::new(42);
    let mut customer_cart = Cart::new(store.id);
    customer_cart.customer_id = Some(customer_id);
    customer_cart.line_items.push(CartItem::new("SHIRT", 3));
    let customer_cart = seed_cart(&carts, customer_cart).await;
    let customer_cart = service
        .reconcile_cart(customer_cart, &store)
        .await
        .unwrap();

    let mut session_cart = Cart::new(store.id);
    session_cart.line_items.push(CartItem::new("SHIRT", 2));
    let session_cart = seed_cart(&carts, session_cart).await;
    let session_id = session_cart.id.unwrap();

    let merged = service
        .merge(customer_cart, session_cart, &store)
        .await
        .unwrap();

    assert_eq!(merged.line_items.len(), 1);
    let item = merged.line_items.first().unwrap();
    assert_eq!(item.quantity, 5);
    assert_eq!(item.sub_total, dec!(50.00));
    assert!(carts.deleted_carts().contains(&session_id.as_i32()));
    // the merged cart was persisted
    assert_eq!(
        carts.stored(merged.id.unwrap()).unwrap().line_items.len(),
        1
    );
}

#[tokio::test]
async fn test_merge_appends_novel_product() {
    let store = test_store();
    let (service, carts, _) = service(vec![
        product(1, "SHIRT", dec!(10.00)),
        product(2, "MUG", dec!(7.50)),
    ]);

    let customer_id = CustomerId::new(42);
    let mut customer_cart = Cart::new(store.id);
    customer_cart.customer_id = Some(customer_id);
    customer_cart.line_items.push(CartItem::new("SHIRT", 1));
    let customer_cart = seed_cart(&carts, customer_cart).await;
    let customer_cart = service
        .reconcile_cart(customer_cart, &store)
        .await
        .unwrap();

    let mut session_cart = Cart::new(store.id);
    session_cart.line_items.push(CartItem::new("MUG", 2));
    let session_cart = seed_cart(&carts, session_cart).await;

    let merged = service
        .merge(customer_cart, session_cart, &store)
        .await
        .unwrap();

    assert_eq!(merged.line_items.len(), 2);
    let mug = merged
        .line_items
        .iter()
        .find(|i| i.sku == "MUG")
        .unwrap();
    assert_eq!(mug.quantity, 2);
    assert_eq!(mug.sub_total, dec!(15.00));
    assert_eq!(merged.subtotal(), dec!(25.00));
}

#[tokio::test]
async fn test_merge_short_circuits_when_session_cart_already_owned() {
    let store = test_store();
    let (service, carts, _) = service(vec![product(1, "SHIRT", dec!(10.00))]);

    let customer_id = CustomerId::new(42);
    let mut customer_cart = Cart::new(store.id);
    customer_cart.customer_id = Some(customer_id);
    customer_cart.line_items.push(CartItem::new("SHIRT", 1));
    let customer_cart = seed_cart(&carts, customer_cart).await;

    let mut session_cart = Cart::new(store.id);
    session_cart.customer_id = Some(customer_id);
    session_cart.line_items.push(CartItem::new("SHIRT", 4));
    let session_cart = seed_cart(&carts, session_cart).await;
    let session_id = session_cart.id.unwrap();

    let merged = service
        .merge(customer_cart, session_cart, &store)
        .await
        .unwrap();

    assert_eq!(merged.line_items.first().unwrap().quantity, 1);
    assert!(!carts.deleted_carts().contains(&session_id.as_i32()));
}

#[tokio::test]
async fn test_merge_proceeds_for_same_customer_when_customer_cart_empty() {
    let store = test_store();
    let (service, carts, _) = service(vec![product(1, "SHIRT", dec!(10.00))]);

    let customer_id = CustomerId::new(42);
    let mut customer_cart = Cart::new(store.id);
    customer_cart.customer_id = Some(customer_id);
    let customer_cart = seed_cart(&carts, customer_cart).await;

    let mut session_cart = Cart::new(store.id);
    session_cart.customer_id = Some(customer_id);
    session_cart.line_items.push(CartItem::new("SHIRT", 4));
    let session_cart = seed_cart(&carts, session_cart).await;

    let merged = service
        .merge(customer_cart, session_cart, &store)
        .await
        .unwrap();
    assert_eq!(merged.line_items.first().unwrap().quantity, 4);
}

#[tokio::test]
async fn test_failed_merge_preserves_session_cart() {
    let store = test_store();
    let (service, carts, _) = service(vec![product(1, "SHIRT", dec!(10.00))]);

    let customer_id = CustomerId::new(42);
    let mut customer_cart = Cart::new(store.id);
    customer_cart.customer_id = Some(customer_id);
    customer_cart.line_items.push(CartItem::new("SHIRT", 1));
    let customer_cart = seed_cart(&carts, customer_cart).await;
    let customer_cart = service
        .reconcile_cart(customer_cart, &store)
        .await
        .unwrap();

    let mut session_cart = Cart::new(store.id);
    session_cart.line_items.push(CartItem::new("GONE", 1));
    let session_cart = seed_cart(&carts, session_cart).await;
    let session_id = session_cart.id.unwrap();

    let result = service.merge(customer_cart, session_cart, &store).await;
    assert!(matches!(result, Err(CartError::SkuNotFound(sku)) if sku == "GONE"));
    assert!(carts.stored(session_id).is_some());
}

#[tokio::test]
async fn test_merge_rejects_item_from_another_store() {
    let store = test_store();
    let mut foreign = product(9, "IMPORT", dec!(5.00));
    foreign.store_id = StoreId::new(2);
    let (service, carts, _) = service(vec![foreign]);

    let customer_id = CustomerId::new(42);
    let mut customer_cart = Cart::new(store.id);
    customer_cart.customer_id = Some(customer_id);
    let customer_cart = seed_cart(&carts, customer_cart).await;

    let mut session_cart = Cart::new(store.id);
    session_cart.line_items.push(CartItem::new("IMPORT", 1));
    let session_cart = seed_cart(&carts, session_cart).await;

    let result = service.merge(customer_cart, session_cart, &store).await;
    assert!(matches!(result, Err(CartError::WrongStore { .. })));
}

#[tokio::test]
async fn test_merge_into_closed_cart_is_rejected() {
    let store = test_store();
    let (service, carts, _) = service(vec![product(1, "SHIRT", dec!(10.00))]);

    let mut customer_cart = Cart::new(store.id);
    customer_cart.customer_id = Some(CustomerId::new(42));
    customer_cart.order_id = Some(driftwood_core::OrderId::new(7));
    let customer_cart = seed_cart(&carts, customer_cart).await;

    let mut session_cart = Cart::new(store.id);
    session_cart.line_items.push(CartItem::new("SHIRT", 1));
    let session_cart = seed_cart(&carts, session_cart).await;

    let result = service.merge(customer_cart, session_cart, &store).await;
    assert!(matches!(result, Err(CartError::CartClosed)));
}

#[tokio::test]
async fn test_create_cart_prices_and_persists() {
    let store = test_store();
    let mut shirt = product(1, "SHIRT", dec!(10.00));
    shirt.attributes = vec![attribute(2, "Size", "L", dec!(1.00))];
    let (service, carts, _) = service(vec![shirt]);

    let cart = service
        .create_cart(
            &store,
            None,
            &[ItemRequest {
                sku: "SHIRT".to_owned(),
                quantity: 2,
                attributes: vec![AttributeId::new(2)],
            }],
            Some("203.0.113.9"),
        )
        .await
        .unwrap();

    assert!(cart.id.is_some());
    assert_eq!(cart.subtotal(), dec!(22.00));
    assert_eq!(cart.ip_address.as_deref(), Some("203.0.113.9"));
    assert!(carts.stored(cart.id.unwrap()).is_some());
}

#[tokio::test]
async fn test_create_cart_rejects_unknown_attribute() {
    let store = test_store();
    let (service, _, _) = service(vec![product(1, "SHIRT", dec!(10.00))]);

    let result = service
        .create_cart(
            &store,
            None,
            &[ItemRequest {
                sku: "SHIRT".to_owned(),
                quantity: 1,
                attributes: vec![AttributeId::new(99)],
            }],
            None,
        )
        .await;
    assert!(matches!(result, Err(CartError::AttributeNotFound { .. })));
}

#[tokio::test]
async fn test_add_item_updates_quantity_and_zero_removes() {
    let store = test_store();
    let (service, carts, _) = service(vec![product(1, "SHIRT", dec!(10.00))]);

    let mut cart = service.create_cart(&store, None, &[], None).await.unwrap();

    let request = |quantity| ItemRequest {
        sku: "SHIRT".to_owned(),
        quantity,
        attributes: Vec::new(),
    };

    service
        .add_item(&mut cart, &store, &request(1), None)
        .await
        .unwrap();
    assert_eq!(cart.line_items.len(), 1);

    service
        .add_item(&mut cart, &store, &request(3), None)
        .await
        .unwrap();
    assert_eq!(cart.line_items.len(), 1);
    assert_eq!(cart.line_items.first().unwrap().quantity, 3);
    assert_eq!(cart.line_items.first().unwrap().sub_total, dec!(30.00));

    service
        .add_item(&mut cart, &store, &request(0), None)
        .await
        .unwrap();
    assert!(cart.is_empty());
    assert!(carts.stored(cart.id.unwrap()).unwrap().is_empty());
}

#[tokio::test]
async fn test_add_item_to_closed_cart_is_rejected() {
    let store = test_store();
    let (service, _, _) = service(vec![product(1, "SHIRT", dec!(10.00))]);

    let mut cart = Cart::new(store.id);
    cart.order_id = Some(driftwood_core::OrderId::new(7));

    let result = service
        .add_item(
            &mut cart,
            &store,
            &ItemRequest {
                sku: "SHIRT".to_owned(),
                quantity: 1,
                attributes: Vec::new(),
            },
            None,
        )
        .await;
    assert!(matches!(result, Err(CartError::CartClosed)));
}

#[tokio::test]
async fn test_populate_item_rejects_zero_quantity() {
    let (service, _, _) = service(vec![]);
    let result = service.populate_item(&product(1, "SHIRT", dec!(10.00)), 0, &[]);
    assert!(matches!(result, Err(CartError::InvalidQuantity)));
}

#[tokio::test]
async fn test_get_for_customer_skips_ordered_carts() {
    let store = test_store();
    let (service, carts, _) = service(vec![product(1, "SHIRT", dec!(10.00))]);

    let customer_id = CustomerId::new(42);
    let mut ordered = Cart::new(store.id);
    ordered.customer_id = Some(customer_id);
    ordered.order_id = Some(driftwood_core::OrderId::new(1));
    ordered.line_items.push(CartItem::new("SHIRT", 1));
    seed_cart(&carts, ordered).await;

    let mut active = Cart::new(store.id);
    active.customer_id = Some(customer_id);
    active.line_items.push(CartItem::new("SHIRT", 2));
    let active = seed_cart(&carts, active).await;

    let fetched = service
        .get_for_customer(customer_id, &store)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched.id, active.id);
    assert_eq!(fetched.line_items.first().unwrap().quantity, 2);
}
