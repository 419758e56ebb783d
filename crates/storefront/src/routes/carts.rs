//! Cart endpoints.
//!
//! Anonymous carts are addressed by their opaque code; no authentication is
//! involved. Every fetch returns the reconciled cart, so prices and
//! availability are current as of the response.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use driftwood_core::AttributeId;

use crate::error::{AppError, Result};
use crate::models::cart::{Cart, CartItem};
use crate::models::product::item_display_name;
use crate::routes::{StoreQuery, client_ip, resolve_store};
use crate::services::cart::ItemRequest;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_cart))
        .route("/{code}", get(get_cart).delete(delete_cart))
        .route("/{code}/items", post(add_item))
}

/// A line item as submitted by clients.
#[derive(Debug, Deserialize)]
pub struct ItemPayload {
    pub sku: String,
    pub quantity: u32,
    #[serde(default)]
    pub attributes: Vec<AttributeId>,
}

impl From<&ItemPayload> for ItemRequest {
    fn from(payload: &ItemPayload) -> Self {
        Self {
            sku: payload.sku.clone(),
            quantity: payload.quantity,
            attributes: payload.attributes.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateCartPayload {
    #[serde(default)]
    pub items: Vec<ItemPayload>,
}

/// A cart shaped for API responses.
#[derive(Debug, Serialize)]
pub struct ReadableCart {
    pub code: String,
    pub customer_id: Option<i32>,
    pub subtotal: Decimal,
    pub items: Vec<ReadableCartItem>,
}

#[derive(Debug, Serialize)]
pub struct ReadableCartItem {
    pub sku: String,
    /// Product name decorated with the selected attributes,
    /// e.g. `Shirt [Size: L]`.
    pub name: String,
    pub quantity: u32,
    pub price: Decimal,
    pub sub_total: Decimal,
    pub virtual_product: bool,
    pub attributes: Vec<ReadableSelection>,
}

#[derive(Debug, Serialize)]
pub struct ReadableSelection {
    pub option: String,
    pub value: String,
}

impl From<&Cart> for ReadableCart {
    fn from(cart: &Cart) -> Self {
        Self {
            code: cart.code.clone(),
            customer_id: cart.customer_id.map(|id| id.as_i32()),
            subtotal: cart.subtotal(),
            items: cart.line_items.iter().map(ReadableCartItem::from).collect(),
        }
    }
}

impl From<&CartItem> for ReadableCartItem {
    fn from(item: &CartItem) -> Self {
        let selected = item.selected_attributes();
        let product_name = item
            .product
            .as_ref()
            .map_or(item.sku.as_str(), |p| p.name.as_str());

        Self {
            sku: item.sku.clone(),
            name: item_display_name(product_name, &selected),
            quantity: item.quantity,
            price: item.item_price,
            sub_total: item.sub_total,
            virtual_product: item.virtual_product,
            attributes: selected
                .iter()
                .map(|attr| ReadableSelection {
                    option: attr.option_name.clone(),
                    value: attr.value_name.clone(),
                })
                .collect(),
        }
    }
}

/// `POST /api/v1/carts` - create an anonymous cart, optionally pre-filled.
#[instrument(skip(state, headers, payload))]
async fn create_cart(
    State(state): State<AppState>,
    Query(query): Query<StoreQuery>,
    headers: HeaderMap,
    Json(payload): Json<CreateCartPayload>,
) -> Result<(StatusCode, Json<ReadableCart>)> {
    let store = resolve_store(&state, &query).await?;
    let items: Vec<ItemRequest> = payload.items.iter().map(ItemRequest::from).collect();

    let cart = state
        .carts()
        .create_cart(&store, None, &items, client_ip(&headers).as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(ReadableCart::from(&cart))))
}

/// `GET /api/v1/carts/{code}` - fetch a reconciled cart.
#[instrument(skip(state))]
async fn get_cart(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<StoreQuery>,
) -> Result<Json<ReadableCart>> {
    let store = resolve_store(&state, &query).await?;

    let cart = state
        .carts()
        .get_by_code(&code, &store)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("cart {code}")))?;

    Ok(Json(ReadableCart::from(&cart)))
}

/// `POST /api/v1/carts/{code}/items` - add a product or change its quantity.
#[instrument(skip(state, headers, payload))]
async fn add_item(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<StoreQuery>,
    headers: HeaderMap,
    Json(payload): Json<ItemPayload>,
) -> Result<Json<ReadableCart>> {
    let store = resolve_store(&state, &query).await?;

    let mut cart = state
        .carts()
        .get_by_code(&code, &store)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("cart {code}")))?;

    state
        .carts()
        .add_item(
            &mut cart,
            &store,
            &ItemRequest::from(&payload),
            client_ip(&headers).as_deref(),
        )
        .await?;

    Ok(Json(ReadableCart::from(&cart)))
}

/// `DELETE /api/v1/carts/{code}` - discard a cart.
#[instrument(skip(state))]
async fn delete_cart(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<StoreQuery>,
) -> Result<StatusCode> {
    let store = resolve_store(&state, &query).await?;

    let cart = state
        .carts()
        .get_by_code(&code, &store)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("cart {code}")))?;

    state.carts().delete_cart(&cart).await?;
    Ok(StatusCode::NO_CONTENT)
}
