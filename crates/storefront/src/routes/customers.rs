//! Customer endpoints: registration, customer cart lookup, merge-on-login.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use driftwood_core::CustomerId;

use crate::error::{AppError, Result};
use crate::models::customer::Customer;
use crate::routes::carts::ReadableCart;
use crate::routes::{StoreQuery, client_ip, resolve_store};
use crate::services::customers::{CustomerService, RegistrationRequest};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(register))
        .route("/{id}/cart", get(get_customer_cart))
        .route("/{id}/cart/merge", post(merge_cart))
}

#[derive(Debug, Deserialize)]
pub struct RegisterPayload {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Debug, Serialize)]
pub struct ReadableCustomer {
    pub id: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<&Customer> for ReadableCustomer {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id.as_i32(),
            email: customer.email.to_string(),
            first_name: customer.first_name.clone(),
            last_name: customer.last_name.clone(),
        }
    }
}

/// Body for the merge endpoint: the anonymous session cart to fold in.
#[derive(Debug, Deserialize)]
pub struct MergePayload {
    pub cart: String,
}

/// `POST /api/v1/customers` - register a new customer.
#[instrument(skip(state, payload), fields(email = %payload.email))]
async fn register(
    State(state): State<AppState>,
    Query(query): Query<StoreQuery>,
    Json(payload): Json<RegisterPayload>,
) -> Result<(StatusCode, Json<ReadableCustomer>)> {
    let store = resolve_store(&state, &query).await?;

    let customer = CustomerService::new(state.pool())
        .register(
            &store,
            &RegistrationRequest {
                email: payload.email,
                password: payload.password,
                first_name: payload.first_name,
                last_name: payload.last_name,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ReadableCustomer::from(&customer)),
    ))
}

/// `GET /api/v1/customers/{id}/cart` - the customer's active cart.
#[instrument(skip(state))]
async fn get_customer_cart(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(query): Query<StoreQuery>,
) -> Result<Json<ReadableCart>> {
    let store = resolve_store(&state, &query).await?;
    let customer_id = CustomerId::new(id);

    let cart = state
        .carts()
        .get_for_customer(customer_id, &store)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no active cart for customer {id}")))?;

    Ok(Json(ReadableCart::from(&cart)))
}

/// `POST /api/v1/customers/{id}/cart/merge` - fold an anonymous session cart
/// into the customer's cart. Called after login.
#[instrument(skip(state, headers, payload))]
async fn merge_cart(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(query): Query<StoreQuery>,
    headers: HeaderMap,
    Json(payload): Json<MergePayload>,
) -> Result<Json<ReadableCart>> {
    let store = resolve_store(&state, &query).await?;
    let customer_id = CustomerId::new(id);

    let session_cart = state
        .carts()
        .get_by_code(&payload.cart, &store)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("cart {}", payload.cart)))?;

    // A customer without an active cart gets an empty one to merge into.
    let customer_cart = match state.carts().get_for_customer(customer_id, &store).await? {
        Some(cart) => cart,
        None => {
            state
                .carts()
                .create_cart(
                    &store,
                    Some(customer_id),
                    &[],
                    client_ip(&headers).as_deref(),
                )
                .await?
        }
    };

    let merged = state
        .carts()
        .merge(customer_cart, session_cart, &store)
        .await?;

    Ok(Json(ReadableCart::from(&merged)))
}
