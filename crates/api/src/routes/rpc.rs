//! RPC-style endpoints under `/rpc/cart.v1.CartService/`.
//!
//! Each method is a JSON `POST` whose request and response mirror the cart
//! RPC contract used by sibling services. Failures are returned as an
//! [`RpcStatus`] carrying a gRPC status code.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use cart_store::CartStore;
use checkout::OrderService;
use common::UserId;
use domain::Cart;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, RpcStatus};
use crate::routes::cart::{product_id, quantity};
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetCartRequest {
    pub user_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCartItemRequest {
    pub user_id: String,
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidateCartRequest {
    pub user_id: String,
    #[serde(default)]
    pub product_ids: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartInfo {
    pub cart_id: String,
    pub user_id: String,
    /// Number of lines in the cart, as a decimal string.
    pub total: String,
    pub items: Vec<CartItemInfo>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemInfo {
    pub cart_item_id: String,
    pub product_id: String,
    pub quantity: u32,
}

impl From<&Cart> for CartInfo {
    fn from(cart: &Cart) -> Self {
        Self {
            cart_id: cart.id().to_string(),
            user_id: cart.user_id().to_string(),
            total: cart.item_count().to_string(),
            items: cart
                .items()
                .iter()
                .map(|item| CartItemInfo {
                    cart_item_id: item.id.to_string(),
                    product_id: item.product_id.to_string(),
                    quantity: item.quantity,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetCartResponse {
    pub cart: CartInfo,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCartItemResponse {
    pub cart_id: String,
    pub cart: CartInfo,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InvalidateCartResponse {
    pub invalidated: bool,
}

fn request<T>(req: Result<Json<T>, JsonRejection>) -> Result<T, RpcStatus> {
    req.map(|Json(value)| value)
        .map_err(|e| ApiError::invalid(e.body_text()).into())
}

fn user_id(value: String) -> Result<UserId, RpcStatus> {
    if value.trim().is_empty() {
        return Err(ApiError::invalid("userId must not be blank").into());
    }
    Ok(UserId::new(value))
}

/// `GetCart`: returns the user's cart.
#[tracing::instrument(skip_all)]
pub async fn get_cart<S: CartStore + 'static, O: OrderService + 'static>(
    State(state): State<Arc<AppState<S, O>>>,
    req: Result<Json<GetCartRequest>, JsonRejection>,
) -> Result<Json<GetCartResponse>, RpcStatus> {
    let user_id = user_id(request(req)?.user_id)?;
    let cart = state.carts.get_cart(&user_id).await?;
    Ok(Json(GetCartResponse {
        cart: CartInfo::from(&cart),
    }))
}

/// `AddCartItem`: adds a product, creating the cart if needed.
#[tracing::instrument(skip_all)]
pub async fn add_cart_item<S: CartStore + 'static, O: OrderService + 'static>(
    State(state): State<Arc<AppState<S, O>>>,
    req: Result<Json<AddCartItemRequest>, JsonRejection>,
) -> Result<Json<AddCartItemResponse>, RpcStatus> {
    let req = request(req)?;
    let user_id = user_id(req.user_id)?;
    let product_id = product_id(req.product_id)?;
    let quantity = quantity(req.quantity)?;

    let cart = state
        .carts
        .add_item(&user_id, product_id, quantity)
        .await?;
    Ok(Json(AddCartItemResponse {
        cart_id: cart.id().to_string(),
        cart: CartInfo::from(&cart),
    }))
}

/// `InvalidateCart`: drops products processed elsewhere. Idempotent.
#[tracing::instrument(skip_all)]
pub async fn invalidate_cart<S: CartStore + 'static, O: OrderService + 'static>(
    State(state): State<Arc<AppState<S, O>>>,
    req: Result<Json<InvalidateCartRequest>, JsonRejection>,
) -> Result<Json<InvalidateCartResponse>, RpcStatus> {
    let req = request(req)?;
    let user_id = user_id(req.user_id)?;
    let product_ids = req
        .product_ids
        .into_iter()
        .map(product_id)
        .collect::<Result<Vec<_>, _>>()?;

    let invalidated = state.carts.invalidate(&user_id, &product_ids).await?;
    Ok(Json(InvalidateCartResponse { invalidated }))
}
