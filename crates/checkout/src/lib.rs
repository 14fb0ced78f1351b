//! Checkout orchestration.
//!
//! Turns a selection of cart lines into an order by calling the order
//! service, then trims the cart. The remote call is the commit point:
//! - if it fails or times out, the cart is left exactly as it was
//! - only after it succeeds are the checked-out lines removed
//!
//! If the trim cannot be written after the order exists, the order is not
//! rolled back; the error reports the order ID so the gap can be reconciled.

pub mod coordinator;
pub mod error;
pub mod intent;
pub mod services;

pub use coordinator::{CheckoutCoordinator, CheckoutOutcome};
pub use error::CheckoutError;
pub use intent::{OrderId, OrderIntent, OrderIntentReceipt, OrderLine};
pub use services::{HttpOrderService, InMemoryOrderService, OrderService, OrderServiceError};
