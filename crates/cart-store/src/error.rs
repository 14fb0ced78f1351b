use thiserror::Error;

use crate::{CartId, UserId, Version};

/// Errors that can occur when interacting with the cart store.
#[derive(Debug, Error)]
pub enum CartStoreError {
    /// The stored cart is not at the version the write expected.
    #[error(
        "Concurrency conflict for cart {cart_id}: expected {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        cart_id: CartId,
        expected: Version,
        actual: Version,
    },

    /// A cart already exists for this user.
    #[error("A cart already exists for user {user_id}")]
    DuplicateCart { user_id: UserId },

    /// The record violates a structural constraint and was not written.
    #[error("Invalid cart record: {0}")]
    InvalidRecord(String),

    /// The store could not serve the request.
    #[error("Cart store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl CartStoreError {
    /// Returns true if retrying the whole read-modify-write may succeed.
    pub fn is_conflict(&self) -> bool {
        matches!(self, CartStoreError::ConcurrencyConflict { .. })
    }
}

/// Result type for cart store operations.
pub type Result<T> = std::result::Result<T, CartStoreError>;
