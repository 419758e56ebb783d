//! Shared application state.

use std::sync::Arc;

use sqlx::PgPool;

use crate::cache::ReferenceCache;
use crate::config::StorefrontConfig;
use crate::services::cart::{CartService, PgCartStore};
use crate::services::catalog::{PgCatalog, ReadableProduct};
use crate::services::pricing::CatalogPricing;

/// The cart service wired to its production collaborators.
pub type AppCartService = CartService<PgCatalog, CatalogPricing, PgCartStore>;

/// Shared application state, cheap to clone.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    carts: AppCartService,
    pricing: CatalogPricing,
    product_cache: ReferenceCache<ReadableProduct>,
}

impl AppState {
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let carts = CartService::new(
            PgCatalog::new(pool.clone()),
            CatalogPricing,
            PgCartStore::new(pool.clone()),
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                carts,
                pricing: CatalogPricing,
                product_cache: ReferenceCache::new(),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn carts(&self) -> &AppCartService {
        &self.inner.carts
    }

    #[must_use]
    pub fn pricing(&self) -> &CatalogPricing {
        &self.inner.pricing
    }

    #[must_use]
    pub fn product_cache(&self) -> &ReferenceCache<ReadableProduct> {
        &self.inner.product_cache
    }
}
