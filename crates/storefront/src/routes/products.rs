//! Product presentation endpoints.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::routes::{StoreQuery, resolve_store};
use crate::services::catalog::{ProductCatalog, ReadableProduct};
use crate::services::pricing::Pricing;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/{sku}", get(get_product))
}

/// `GET /api/v1/products/{sku}` - a product with its computed price.
///
/// Responses are served from the store-scoped reference cache when possible;
/// a miss resolves the product, prices it with no attributes selected, and
/// caches the result under the SKU.
#[instrument(skip(state))]
async fn get_product(
    State(state): State<AppState>,
    Path(sku): Path<String>,
    Query(query): Query<StoreQuery>,
) -> Result<Json<ReadableProduct>> {
    let store = resolve_store(&state, &query).await?;

    if let Some(cached) = state.product_cache().get(store.id, &sku) {
        return Ok(Json(cached));
    }

    let product = state
        .carts()
        .catalog()
        .resolve(&sku, &store, &store.default_language)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {sku}")))?;

    let price = state.pricing().price_of(&product, &[])?;
    let readable = ReadableProduct::from_product(&product, &price);

    state
        .product_cache()
        .put(store.id, &sku, readable.clone());
    Ok(Json(readable))
}
