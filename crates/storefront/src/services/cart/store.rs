//! Cart storage abstraction.
//!
//! The cart service talks to storage through these traits so the merge and
//! reconciliation rules can be exercised against an in-memory store in tests.

use async_trait::async_trait;
use sqlx::PgPool;

use driftwood_core::{CartId, CustomerId, SelectionId, StoreId};

use crate::db::RepositoryError;
use crate::db::carts::CartRepository;
use crate::models::cart::Cart;

/// Loads and persists whole carts.
///
/// All methods return [`RepositoryError`] when the underlying storage fails.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Find a customer's active (not yet ordered) cart.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] if the lookup fails.
    async fn find_active_by_customer(
        &self,
        store_id: StoreId,
        customer_id: CustomerId,
    ) -> Result<Option<Cart>, RepositoryError>;

    /// Find a cart by its public code, scoped to a store.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] if the lookup fails.
    async fn find_by_code(
        &self,
        store_id: StoreId,
        code: &str,
    ) -> Result<Option<Cart>, RepositoryError>;

    /// Find a cart by ID, scoped to a store.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] if the lookup fails.
    async fn find_by_id(
        &self,
        store_id: StoreId,
        id: CartId,
    ) -> Result<Option<Cart>, RepositoryError>;

    /// Insert a new cart, assigning IDs in place.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] if the insert fails.
    async fn create(&self, cart: &mut Cart) -> Result<(), RepositoryError>;

    /// Replace a persisted cart with its in-memory state.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] for an unpersisted cart,
    /// [`RepositoryError`] if the write fails.
    async fn update(&self, cart: &mut Cart) -> Result<(), RepositoryError>;

    /// Delete a cart and everything hanging off it.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] if the delete fails.
    async fn delete(&self, cart_id: CartId) -> Result<(), RepositoryError>;
}

/// Deletes individual attribute selections; reconciliation uses this to drop
/// orphans without rewriting the whole cart first.
#[async_trait]
pub trait SelectionStore: Send + Sync {
    /// Delete one persisted selection.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] if the delete fails.
    async fn delete_selection(&self, id: SelectionId) -> Result<(), RepositoryError>;
}

/// Cart storage backed by the shopping cart tables.
#[derive(Clone)]
pub struct PgCartStore {
    pool: PgPool,
}

impl PgCartStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartStore for PgCartStore {
    async fn find_active_by_customer(
        &self,
        store_id: StoreId,
        customer_id: CustomerId,
    ) -> Result<Option<Cart>, RepositoryError> {
        CartRepository::new(&self.pool)
            .find_active_by_customer(store_id, customer_id)
            .await
    }

    async fn find_by_code(
        &self,
        store_id: StoreId,
        code: &str,
    ) -> Result<Option<Cart>, RepositoryError> {
        CartRepository::new(&self.pool)
            .find_by_code(store_id, code)
            .await
    }

    async fn find_by_id(
        &self,
        store_id: StoreId,
        id: CartId,
    ) -> Result<Option<Cart>, RepositoryError> {
        CartRepository::new(&self.pool).find_by_id(store_id, id).await
    }

    async fn create(&self, cart: &mut Cart) -> Result<(), RepositoryError> {
        CartRepository::new(&self.pool).create(cart).await
    }

    async fn update(&self, cart: &mut Cart) -> Result<(), RepositoryError> {
        CartRepository::new(&self.pool).update(cart).await
    }

    async fn delete(&self, cart_id: CartId) -> Result<(), RepositoryError> {
        CartRepository::new(&self.pool).delete(cart_id).await
    }
}

#[async_trait]
impl SelectionStore for PgCartStore {
    async fn delete_selection(&self, id: SelectionId) -> Result<(), RepositoryError> {
        CartRepository::new(&self.pool).delete_selection(id).await
    }
}
