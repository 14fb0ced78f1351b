//! Cart aggregate and related types.

mod aggregate;
mod service;

pub use aggregate::{Cart, CartItem, CheckoutSplit};
pub use service::{CartService, EnsureOutcome};

use common::ProductId;
use thiserror::Error;

/// Errors raised by the cart aggregate's invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// The product already has a line in the cart.
    #[error("Product already in cart: {product_id}")]
    DuplicateCartItem { product_id: ProductId },

    /// No line in the cart matches the requested product(s).
    #[error("Cart item not found: {product_id}")]
    CartItemNotFound { product_id: String },
}

impl CartError {
    /// Item-not-found error for a single product.
    pub fn item_not_found(product_id: &ProductId) -> Self {
        CartError::CartItemNotFound {
            product_id: product_id.to_string(),
        }
    }

    /// Item-not-found error when none of several products is present.
    pub fn none_found(product_ids: &[ProductId]) -> Self {
        let joined = product_ids
            .iter()
            .map(ProductId::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        CartError::CartItemNotFound { product_id: joined }
    }
}
