//! HTTP route handlers.
//!
//! Every storefront request is scoped to a store: handlers accept an
//! optional `?store=CODE` query parameter and fall back to the configured
//! default store.

use axum::Router;
use axum::http::HeaderMap;
use serde::Deserialize;

use crate::db::stores::StoreRepository;
use crate::error::{AppError, Result};
use crate::models::store::Store;
use crate::state::AppState;

pub mod carts;
pub mod customers;
pub mod products;

/// Assemble the public API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/v1/carts", carts::routes())
        .nest("/api/v1/customers", customers::routes())
        .nest("/api/v1/products", products::routes())
}

/// Query parameter naming the store a request operates on.
#[derive(Debug, Deserialize)]
pub struct StoreQuery {
    pub store: Option<String>,
}

/// Resolve the store for a request, falling back to the configured default.
///
/// # Errors
///
/// Returns [`AppError::NotFound`] for an unknown store code, or a database
/// error from the lookup.
pub async fn resolve_store(state: &AppState, query: &StoreQuery) -> Result<Store> {
    let code = query
        .store
        .as_deref()
        .unwrap_or(&state.config().default_store);

    StoreRepository::new(state.pool())
        .get_by_code(code)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("store {code}")))
}

/// Best-effort client IP for cart audit fields, from `X-Forwarded-For`.
#[must_use]
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|ip| ip.trim().to_owned())
        .filter(|ip| !ip.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_client_ip_takes_first_forwarded_address() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers).as_deref(), Some("203.0.113.9"));
    }

    #[test]
    fn test_client_ip_missing_header() {
        assert!(client_ip(&HeaderMap::new()).is_none());
    }
}
