//! Checkout coordinator.

use std::sync::Arc;
use std::time::{Duration, Instant};

use cart_store::CartStore;
use common::{ProductId, UserId};
use domain::{Cart, CartService, DomainError};

use crate::error::CheckoutError;
use crate::intent::{OrderId, OrderIntent};
use crate::services::{OrderService, OrderServiceError};

/// Default bound on the order service call.
pub const DEFAULT_ORDER_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of a successful checkout.
#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    pub order_id: OrderId,
    /// The cart as written after the checked-out lines were removed.
    pub remaining: Cart,
}

/// Turns cart lines into an order and trims them from the cart.
///
/// Order of effects: load the cart, partition it, call the order service,
/// and only then write the trimmed cart. Nothing is written unless the
/// order service accepted the intent.
pub struct CheckoutCoordinator<S, O>
where
    S: CartStore,
    O: OrderService,
{
    carts: Arc<CartService<S>>,
    orders: O,
    order_timeout: Duration,
}

impl<S, O> CheckoutCoordinator<S, O>
where
    S: CartStore,
    O: OrderService,
{
    pub fn new(carts: Arc<CartService<S>>, orders: O) -> Self {
        Self {
            carts,
            orders,
            order_timeout: DEFAULT_ORDER_TIMEOUT,
        }
    }

    /// Sets how long to wait for the order service before giving up.
    pub fn with_order_timeout(mut self, timeout: Duration) -> Self {
        self.order_timeout = timeout;
        self
    }

    pub fn order_timeout(&self) -> Duration {
        self.order_timeout
    }

    pub fn order_service(&self) -> &O {
        &self.orders
    }

    /// Checks out the listed products from the user's cart.
    ///
    /// Products not in the cart are ignored, but at least one must match.
    #[tracing::instrument(skip(self))]
    pub async fn checkout(
        &self,
        user_id: &UserId,
        product_ids: &[ProductId],
    ) -> Result<CheckoutOutcome, CheckoutError> {
        metrics::counter!("checkout_total").increment(1);
        let started = Instant::now();

        let result = self.run(user_id, product_ids).await;

        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());
        if let Err(e) = &result {
            metrics::counter!("checkout_failed_total", "reason" => failure_reason(e))
                .increment(1);
        }
        result
    }

    async fn run(
        &self,
        user_id: &UserId,
        product_ids: &[ProductId],
    ) -> Result<CheckoutOutcome, CheckoutError> {
        // 1. Load and partition; nothing is written on failure here
        let cart = self.carts.get_cart(user_id).await?;
        let split = cart.split_for_checkout(product_ids).map_err(DomainError::from)?;
        let checked_out = split.checkout_product_ids();

        // 2. Commit point: the order service accepts the intent
        let intent = OrderIntent::from_items(user_id.clone(), cart.id(), &split.checkout);
        let order_id = self.place_order(&intent).await?;
        tracing::info!(%order_id, lines = intent.lines.len(), "order intent accepted");

        // 3. Trim the cart
        let remaining = match self.carts.save_cart(split.remaining).await {
            Ok(cart) => cart,
            Err(DomainError::ConcurrencyConflict { .. }) => {
                // The cart changed while the order was being placed. Remove
                // the ordered products from the newer state instead.
                tracing::debug!(%order_id, "cart changed during checkout, re-applying trim");
                self.carts
                    .remove_items(user_id, &checked_out)
                    .await
                    .map_err(|source| self.trim_failed(&order_id, source))?
            }
            Err(source) => return Err(self.trim_failed(&order_id, source)),
        };

        tracing::info!(%order_id, remaining = remaining.item_count(), "checkout completed");
        Ok(CheckoutOutcome {
            order_id,
            remaining,
        })
    }

    async fn place_order(&self, intent: &OrderIntent) -> Result<OrderId, CheckoutError> {
        let started = Instant::now();
        let result =
            tokio::time::timeout(self.order_timeout, self.orders.create_order_intent(intent)).await;
        metrics::histogram!("order_intent_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        let error = match result {
            Ok(Ok(receipt)) => return Ok(receipt.order_id),
            Ok(Err(e)) => e,
            Err(_) => OrderServiceError::Timeout(self.order_timeout),
        };
        tracing::warn!(user_id = %intent.user_id, error = %error, "order intent failed, cart left unchanged");
        Err(CheckoutError::OrderServiceUnavailable(error))
    }

    fn trim_failed(&self, order_id: &OrderId, source: DomainError) -> CheckoutError {
        tracing::error!(%order_id, error = %source, "order created but cart was not trimmed");
        CheckoutError::CartNotSaved {
            order_id: order_id.clone(),
            source,
        }
    }
}

fn failure_reason(error: &CheckoutError) -> &'static str {
    match error {
        CheckoutError::OrderServiceUnavailable(OrderServiceError::Timeout(_)) => "timeout",
        CheckoutError::OrderServiceUnavailable(_) => "order_service",
        CheckoutError::CartNotSaved { .. } => "cart_not_saved",
        CheckoutError::Domain(DomainError::CartNotFound { .. }) => "cart_not_found",
        CheckoutError::Domain(DomainError::Cart(_)) => "no_matching_items",
        CheckoutError::Domain(_) => "domain",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cart_store::InMemoryCartStore;
    use crate::services::InMemoryOrderService;

    fn setup() -> (
        Arc<CartService<InMemoryCartStore>>,
        CheckoutCoordinator<InMemoryCartStore, InMemoryOrderService>,
    ) {
        let carts = Arc::new(CartService::new(InMemoryCartStore::new()));
        let coordinator = CheckoutCoordinator::new(carts.clone(), InMemoryOrderService::new());
        (carts, coordinator)
    }

    #[tokio::test]
    async fn test_checkout_without_cart() {
        let (_, coordinator) = setup();
        let user = UserId::new("u1");

        let result = coordinator.checkout(&user, &["A".into()]).await;

        assert!(matches!(
            result,
            Err(CheckoutError::Domain(DomainError::CartNotFound { .. }))
        ));
        assert_eq!(coordinator.order_service().intent_count(), 0);
    }

    #[tokio::test]
    async fn test_checkout_all_items_leaves_empty_cart() {
        let (carts, coordinator) = setup();
        let user = UserId::new("u1");
        carts.add_item(&user, "A".into(), 1).await.unwrap();

        let outcome = coordinator.checkout(&user, &["A".into()]).await.unwrap();

        assert!(outcome.remaining.is_empty());
        assert!(carts.get_cart(&user).await.unwrap().is_empty());
    }

    #[test]
    fn test_default_timeout() {
        let (_, coordinator) = setup();
        assert_eq!(coordinator.order_timeout(), Duration::from_secs(5));
    }
}
