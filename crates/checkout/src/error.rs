//! Checkout error types.

use domain::DomainError;
use thiserror::Error;

use crate::intent::OrderId;
use crate::services::OrderServiceError;

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The order service failed or did not answer in time. The cart is unchanged.
    #[error("Order service unavailable: {0}")]
    OrderServiceUnavailable(#[source] OrderServiceError),

    /// The order was created but the cart could not be trimmed.
    #[error("Order {order_id} created but cart was not saved: {source}")]
    CartNotSaved {
        order_id: OrderId,
        #[source]
        source: DomainError,
    },

    /// Loading or partitioning the cart failed before any remote call.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}

/// Convenience type alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;
