//! Order service trait and its implementations.

pub mod http;
pub mod order;

pub use http::HttpOrderService;
pub use order::{InMemoryOrderService, OrderService, OrderServiceError};
