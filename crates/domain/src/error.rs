//! Domain error types.

use cart_store::CartStoreError;
use common::UserId;
use thiserror::Error;

use crate::cart::CartError;

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The user has no cart.
    #[error("Cart not found for user {user_id}")]
    CartNotFound { user_id: UserId },

    /// Another actor created the user's cart first.
    #[error("Cart already exists for user {user_id}")]
    CartAlreadyExists { user_id: UserId },

    /// An invariant of the cart aggregate rejected the operation.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Writing the cart failed; the previously stored cart is unchanged.
    #[error("Cart not saved: {0}")]
    CartNotSaved(#[source] CartStoreError),

    /// The cart kept changing underneath the operation until retries ran out.
    #[error("Cart for user {user_id} was modified concurrently")]
    ConcurrencyConflict { user_id: UserId },

    /// Reading from the cart store failed.
    #[error("Cart store error: {0}")]
    Store(#[source] CartStoreError),
}

impl DomainError {
    /// Classifies a failed write of the given user's cart.
    pub(crate) fn from_save(user_id: &UserId, err: CartStoreError) -> Self {
        match err {
            CartStoreError::ConcurrencyConflict { .. } => DomainError::ConcurrencyConflict {
                user_id: user_id.clone(),
            },
            CartStoreError::DuplicateCart { user_id } => DomainError::CartAlreadyExists { user_id },
            other => {
                tracing::error!(%user_id, error = %other, "cart write failed");
                DomainError::CartNotSaved(other)
            }
        }
    }
}
