//! Domain layer for the cart service.
//!
//! This crate provides:
//! - the `Cart` aggregate with its item-uniqueness invariant
//! - a command handler running whole-aggregate read-modify-write cycles
//!   against a `CartStore`, retrying on optimistic-version conflicts
//! - `CartService`, the operations exposed to transports and to checkout

pub mod cart;
pub mod command;
pub mod error;

pub use cart::{Cart, CartError, CartItem, CartService, CheckoutSplit, EnsureOutcome};
pub use command::{CommandHandler, CommandResult};
pub use common::{CartId, CartItemId, ProductId, UserId};
pub use error::DomainError;
