//! Order service trait and in-memory implementation.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::intent::{OrderId, OrderIntent, OrderIntentReceipt};

/// Failures of the remote order service.
///
/// Checkout treats every variant the same way; the distinction is only
/// kept for logs.
#[derive(Debug, Error)]
pub enum OrderServiceError {
    /// The service answered but refused the intent.
    #[error("Order intent rejected: {0}")]
    Rejected(String),

    /// The service answered with a non-success status.
    #[error("Order service returned status {status}")]
    Status { status: u16 },

    /// The request could not be sent or the answer could not be read.
    #[error("Order service request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// No answer arrived within the configured bound.
    #[error("Order service did not answer within {0:?}")]
    Timeout(Duration),
}

/// Trait for the order-intent operation of the order service.
#[async_trait]
pub trait OrderService: Send + Sync {
    /// Starts order creation for the given cart lines.
    async fn create_order_intent(
        &self,
        intent: &OrderIntent,
    ) -> Result<OrderIntentReceipt, OrderServiceError>;
}

#[derive(Debug, Default)]
struct InMemoryOrderState {
    intents: Vec<(OrderId, OrderIntent)>,
    next_id: u32,
    fail_on_create: bool,
    delay: Duration,
}

/// In-memory order service for testing and local development.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderService {
    state: Arc<RwLock<InMemoryOrderState>>,
}

impl InMemoryOrderService {
    /// Creates a new in-memory order service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the service to reject every intent until reset.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .fail_on_create = fail;
    }

    /// Makes every call wait before answering. `Duration::ZERO` disables it.
    pub fn set_delay(&self, delay: Duration) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .delay = delay;
    }

    /// Returns the number of accepted intents.
    pub fn intent_count(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .intents
            .len()
    }

    /// Returns the intent accepted under the given order ID.
    pub fn intent(&self, order_id: &OrderId) -> Option<OrderIntent> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .intents
            .iter()
            .find(|(id, _)| id == order_id)
            .map(|(_, intent)| intent.clone())
    }
}

#[async_trait]
impl OrderService for InMemoryOrderService {
    async fn create_order_intent(
        &self,
        intent: &OrderIntent,
    ) -> Result<OrderIntentReceipt, OrderServiceError> {
        let delay = self
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);

        if state.fail_on_create {
            return Err(OrderServiceError::Rejected(
                "order placement disabled".to_string(),
            ));
        }

        state.next_id += 1;
        let order_id = OrderId::new(format!("ORD-{:04}", state.next_id));
        state.intents.push((order_id.clone(), intent.clone()));

        tracing::debug!(%order_id, user_id = %intent.user_id, cart_id = %intent.cart_id, "order intent accepted");
        Ok(OrderIntentReceipt { order_id })
    }
}
