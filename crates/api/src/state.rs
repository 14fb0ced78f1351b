//! Shared application state.

use std::sync::Arc;

use cart_store::CartStore;
use checkout::{CheckoutCoordinator, OrderService};
use domain::CartService;

use crate::config::Config;

/// Shared application state accessible from all handlers.
pub struct AppState<S: CartStore, O: OrderService> {
    pub carts: Arc<CartService<S>>,
    pub checkout: CheckoutCoordinator<S, O>,
}

impl<S: CartStore, O: OrderService> AppState<S, O> {
    /// Creates state with default retry and timeout settings.
    pub fn new(store: S, orders: O) -> Self {
        Self::with_config(store, orders, &Config::default())
    }

    /// Creates state using the retry and timeout settings from `config`.
    pub fn with_config(store: S, orders: O, config: &Config) -> Self {
        let carts = Arc::new(
            CartService::new(store).with_max_conflict_retries(config.max_conflict_retries),
        );
        let checkout = CheckoutCoordinator::new(carts.clone(), orders)
            .with_order_timeout(config.order_service_timeout);
        Self { carts, checkout }
    }
}
