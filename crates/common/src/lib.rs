//! Identifier types shared by every layer of the cart service.

mod types;

pub use types::{CartId, CartItemId, ProductId, UserId};
