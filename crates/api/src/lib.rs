//! HTTP API server for the cart service.
//!
//! Exposes the cart operations over two transports backed by the same
//! services:
//! - REST endpoints under `/api/v1/cart`
//! - RPC-style JSON endpoints under `/rpc/cart.v1.CartService/`
//!
//! with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use cart_store::{CartStore, InMemoryCartStore};
use checkout::{InMemoryOrderService, OrderService};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use state::AppState;

const RPC_PREFIX: &str = "/rpc/cart.v1.CartService";

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, O>(state: Arc<AppState<S, O>>, metrics_handle: PrometheusHandle) -> Router
where
    S: CartStore + 'static,
    O: OrderService + 'static,
{
    use routes::{cart, rpc};

    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    let rpc_router = Router::new()
        .route("/GetCart", post(rpc::get_cart::<S, O>))
        .route("/AddCartItem", post(rpc::add_cart_item::<S, O>))
        .route("/InvalidateCart", post(rpc::invalidate_cart::<S, O>));

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/api/v1/cart", get(cart::get::<S, O>))
        .route(
            "/api/v1/cart/items",
            post(cart::add_item::<S, O>).delete(cart::clear::<S, O>),
        )
        .route(
            "/api/v1/cart/items/{product_id}",
            patch(cart::update_item::<S, O>).delete(cart::remove_item::<S, O>),
        )
        .route("/api/v1/cart/checkout", post(cart::checkout::<S, O>))
        .nest(RPC_PREFIX, rpc_router)
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state backed by the in-memory store and order service.
pub fn create_default_state() -> Arc<AppState<InMemoryCartStore, InMemoryOrderService>> {
    Arc::new(AppState::new(
        InMemoryCartStore::new(),
        InMemoryOrderService::new(),
    ))
}
