//! Cart REST endpoints under `/api/v1/cart`.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use cart_store::CartStore;
use checkout::OrderService;
use common::{ProductId, UserId};
use domain::Cart;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

// -- Request types --

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    pub user_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub product_ids: Vec<String>,
}

// -- Response types --

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub id: String,
    pub user_id: String,
    pub items: Vec<CartItemResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemResponse {
    pub id: String,
    pub product_id: String,
    pub quantity: u32,
}

impl From<&Cart> for CartResponse {
    fn from(cart: &Cart) -> Self {
        Self {
            id: cart.id().to_string(),
            user_id: cart.user_id().to_string(),
            items: cart
                .items()
                .iter()
                .map(|item| CartItemResponse {
                    id: item.id.to_string(),
                    product_id: item.product_id.to_string(),
                    quantity: item.quantity,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub order_id: String,
}

// -- Extraction helpers --

pub(crate) fn user_id(query: Result<Query<UserQuery>, QueryRejection>) -> Result<UserId, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::invalid(e.body_text()))?;
    non_blank(query.user_id, "userId").map(UserId::new)
}

pub(crate) fn product_id(value: String) -> Result<ProductId, ApiError> {
    non_blank(value, "productId").map(ProductId::new)
}

/// Largest quantity a cart line can be stored with.
pub(crate) const MAX_QUANTITY: u32 = i32::MAX as u32;

pub(crate) fn quantity(value: u32) -> Result<u32, ApiError> {
    if value > MAX_QUANTITY {
        return Err(ApiError::invalid(format!(
            "quantity must not exceed {MAX_QUANTITY}"
        )));
    }
    Ok(value)
}

fn non_blank(value: String, field: &str) -> Result<String, ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::invalid(format!("{field} must not be blank")));
    }
    Ok(value)
}

fn body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|e| ApiError::invalid(e.body_text()))
}

fn path(path: Result<Path<String>, PathRejection>) -> Result<ProductId, ApiError> {
    let Path(value) = path.map_err(|e| ApiError::invalid(e.body_text()))?;
    product_id(value)
}

// -- Handlers --

/// GET /api/v1/cart: load the user's cart.
#[tracing::instrument(skip_all)]
pub async fn get<S: CartStore + 'static, O: OrderService + 'static>(
    State(state): State<Arc<AppState<S, O>>>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<CartResponse>, ApiError> {
    let user_id = user_id(query)?;
    let cart = state.carts.get_cart(&user_id).await?;
    Ok(Json(CartResponse::from(&cart)))
}

/// POST /api/v1/cart/items: add a product, creating the cart if needed.
#[tracing::instrument(skip_all)]
pub async fn add_item<S: CartStore + 'static, O: OrderService + 'static>(
    State(state): State<Arc<AppState<S, O>>>,
    query: Result<Query<UserQuery>, QueryRejection>,
    req: Result<Json<AddItemRequest>, JsonRejection>,
) -> Result<Json<CartResponse>, ApiError> {
    let user_id = user_id(query)?;
    let req = body(req)?;
    let product_id = product_id(req.product_id)?;
    let quantity = quantity(req.quantity)?;

    let cart = state
        .carts
        .add_item(&user_id, product_id, quantity)
        .await?;
    Ok(Json(CartResponse::from(&cart)))
}

/// PATCH /api/v1/cart/items/{productId}: set a line's quantity.
#[tracing::instrument(skip_all)]
pub async fn update_item<S: CartStore + 'static, O: OrderService + 'static>(
    State(state): State<Arc<AppState<S, O>>>,
    product: Result<Path<String>, PathRejection>,
    query: Result<Query<UserQuery>, QueryRejection>,
    req: Result<Json<UpdateItemRequest>, JsonRejection>,
) -> Result<Json<CartResponse>, ApiError> {
    let product_id = path(product)?;
    let user_id = user_id(query)?;
    let req = body(req)?;
    let quantity = quantity(req.quantity)?;

    let cart = state
        .carts
        .update_item(&user_id, &product_id, quantity)
        .await?;
    Ok(Json(CartResponse::from(&cart)))
}

/// DELETE /api/v1/cart/items/{productId}: remove a line.
#[tracing::instrument(skip_all)]
pub async fn remove_item<S: CartStore + 'static, O: OrderService + 'static>(
    State(state): State<Arc<AppState<S, O>>>,
    product: Result<Path<String>, PathRejection>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<StatusCode, ApiError> {
    let product_id = path(product)?;
    let user_id = user_id(query)?;

    state.carts.remove_item(&user_id, &product_id).await?;
    Ok(StatusCode::OK)
}

/// DELETE /api/v1/cart/items: empty the cart.
#[tracing::instrument(skip_all)]
pub async fn clear<S: CartStore + 'static, O: OrderService + 'static>(
    State(state): State<Arc<AppState<S, O>>>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<StatusCode, ApiError> {
    let user_id = user_id(query)?;
    state.carts.clear_cart(&user_id).await?;
    Ok(StatusCode::OK)
}

/// POST /api/v1/cart/checkout: order the listed products and trim the cart.
#[tracing::instrument(skip_all)]
pub async fn checkout<S: CartStore + 'static, O: OrderService + 'static>(
    State(state): State<Arc<AppState<S, O>>>,
    query: Result<Query<UserQuery>, QueryRejection>,
    req: Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let user_id = user_id(query)?;
    let req = body(req)?;
    if req.product_ids.is_empty() {
        return Err(ApiError::invalid("productIds must not be empty"));
    }
    let product_ids = req
        .product_ids
        .into_iter()
        .map(product_id)
        .collect::<Result<Vec<_>, _>>()?;

    let outcome = state.checkout.checkout(&user_id, &product_ids).await?;
    Ok(Json(CheckoutResponse {
        order_id: outcome.order_id.to_string(),
    }))
}
