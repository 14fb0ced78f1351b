//! Storage for cart aggregates.
//!
//! A cart and its items are persisted as one unit. Every write carries the
//! version the caller loaded, so a stale read-modify-write is rejected with
//! [`CartStoreError::ConcurrencyConflict`] instead of silently overwriting a
//! newer cart.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod store;
pub mod version;

pub use common::{CartId, CartItemId, ProductId, UserId};
pub use error::{CartStoreError, Result};
pub use memory::InMemoryCartStore;
pub use postgres::PostgresCartStore;
pub use record::{CartItemRecord, CartRecord};
pub use store::{CartStore, CartStoreExt, SaveOptions};
pub use version::Version;
