use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    CartRecord, CartStoreError, Result, UserId, Version,
    store::{CartStore, SaveOptions, validate_record_for_save},
};

#[derive(Debug, Default)]
struct InMemoryCartState {
    carts: HashMap<UserId, CartRecord>,
    fail_on_save: bool,
}

/// In-memory cart store implementation for testing and local development.
///
/// Provides the same guarantees as the PostgreSQL implementation: one cart
/// per user and version-checked whole-aggregate writes. A single write lock
/// makes each save atomic.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCartStore {
    state: Arc<RwLock<InMemoryCartState>>,
}

impl InMemoryCartStore {
    /// Creates a new empty in-memory cart store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the store to fail every save until reset.
    pub async fn set_fail_on_save(&self, fail: bool) {
        self.state.write().await.fail_on_save = fail;
    }

    /// Returns the number of stored carts.
    pub async fn cart_count(&self) -> usize {
        self.state.read().await.carts.len()
    }

    /// Clears all carts.
    pub async fn clear(&self) {
        self.state.write().await.carts.clear();
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn find_by_user_id(&self, user_id: &UserId) -> Result<Option<CartRecord>> {
        let state = self.state.read().await;
        Ok(state.carts.get(user_id).cloned())
    }

    async fn save(&self, mut cart: CartRecord, options: SaveOptions) -> Result<CartRecord> {
        validate_record_for_save(&cart)?;

        let mut state = self.state.write().await;

        if state.fail_on_save {
            return Err(CartStoreError::Unavailable(
                "simulated write failure".to_string(),
            ));
        }

        let current = state.carts.get(&cart.user_id);

        let expected = options.expected_version;
        match current {
            Some(_) if expected == Version::initial() => {
                return Err(CartStoreError::DuplicateCart {
                    user_id: cart.user_id.clone(),
                });
            }
            Some(stored) if stored.version != expected || stored.id != cart.id => {
                return Err(CartStoreError::ConcurrencyConflict {
                    cart_id: cart.id,
                    expected,
                    actual: stored.version,
                });
            }
            None if expected != Version::initial() => {
                return Err(CartStoreError::ConcurrencyConflict {
                    cart_id: cart.id,
                    expected,
                    actual: Version::initial(),
                });
            }
            _ => {}
        }

        let base = current.map(|c| c.version).unwrap_or(Version::initial());
        if let Some(stored) = current {
            cart.created_at = stored.created_at;
        }
        cart.version = base.next();
        cart.updated_at = Utc::now();

        state.carts.insert(cart.user_id.clone(), cart.clone());
        Ok(cart)
    }
}
