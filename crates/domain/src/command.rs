//! Command handling infrastructure.

use cart_store::{CartRecord, CartStore, SaveOptions};
use common::UserId;

use crate::cart::{Cart, CartError};
use crate::error::DomainError;

/// Retries allowed after the first attempt unless configured otherwise.
pub const DEFAULT_MAX_CONFLICT_RETRIES: u32 = 3;

/// Result of command execution.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// The cart after the command, as stored.
    pub cart: Cart,

    /// False if the command produced no change and nothing was written.
    pub persisted: bool,

    /// Number of read-modify-write attempts it took.
    pub attempts: u32,
}

/// Handler for executing commands against cart aggregates.
///
/// The handler is responsible for:
/// 1. Loading the cart from the store
/// 2. Running the command to compute the next state
/// 3. Saving the whole cart, conditioned on the version that was loaded
/// 4. Repeating from 1 when the save lost a race to another writer
pub struct CommandHandler<S: CartStore> {
    store: S,
    max_conflict_retries: u32,
}

impl<S: CartStore> CommandHandler<S> {
    /// Creates a new command handler with the given cart store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
        }
    }

    /// Sets how many times a conflicting write is retried.
    pub fn with_max_conflict_retries(mut self, retries: u32) -> Self {
        self.max_conflict_retries = retries;
        self
    }

    /// Returns a reference to the underlying cart store.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn max_conflict_retries(&self) -> u32 {
        self.max_conflict_retries
    }

    /// Loads a user's cart, returning None if the user has none.
    pub async fn load(&self, user_id: &UserId) -> Result<Option<Cart>, DomainError> {
        let record = self
            .store
            .find_by_user_id(user_id)
            .await
            .map_err(DomainError::Store)?;
        Ok(record.map(Cart::from))
    }

    /// Loads a user's cart, failing with `CartNotFound` if absent.
    pub async fn load_existing(&self, user_id: &UserId) -> Result<Cart, DomainError> {
        self.load(user_id)
            .await?
            .ok_or_else(|| DomainError::CartNotFound {
                user_id: user_id.clone(),
            })
    }

    /// Stores a cart that must not exist yet.
    pub async fn insert(&self, cart: Cart) -> Result<Cart, DomainError> {
        let user_id = cart.user_id().clone();
        self.store
            .save(CartRecord::from(cart), SaveOptions::expect_new())
            .await
            .map(Cart::from)
            .map_err(|e| DomainError::from_save(&user_id, e))
    }

    /// Stores the next state of a cart, conditioned on the version it was loaded at.
    pub async fn save(&self, cart: Cart) -> Result<Cart, DomainError> {
        let user_id = cart.user_id().clone();
        let options = SaveOptions::expect_version(cart.version());
        self.store
            .save(CartRecord::from(cart), options)
            .await
            .map(Cart::from)
            .map_err(|e| DomainError::from_save(&user_id, e))
    }

    /// Executes a command against the user's cart and persists the result.
    ///
    /// The command receives the current cart and returns the next state. If
    /// the items did not change nothing is written. On a version conflict the
    /// whole cycle is repeated against the freshly stored cart.
    pub async fn execute<F>(
        &self,
        user_id: &UserId,
        operation: &'static str,
        command_fn: F,
    ) -> Result<CommandResult, DomainError>
    where
        F: Fn(&Cart) -> Result<Cart, CartError>,
    {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let cart = self.load_existing(user_id).await?;
            let next = command_fn(&cart)?;

            if next.items() == cart.items() {
                return Ok(CommandResult {
                    cart,
                    persisted: false,
                    attempts,
                });
            }

            match self.save(next).await {
                Ok(saved) => {
                    metrics::counter!("cart_mutations_total", "operation" => operation)
                        .increment(1);
                    return Ok(CommandResult {
                        cart: saved,
                        persisted: true,
                        attempts,
                    });
                }
                Err(DomainError::ConcurrencyConflict { .. })
                    if attempts <= self.max_conflict_retries =>
                {
                    metrics::counter!("cart_conflict_retries_total").increment(1);
                    tracing::debug!(%user_id, operation, attempts, "cart version conflict, retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cart_store::{InMemoryCartStore, Version};

    async fn handler_with_cart(user: &str) -> CommandHandler<InMemoryCartStore> {
        let handler = CommandHandler::new(InMemoryCartStore::new());
        handler.insert(Cart::new(user)).await.unwrap();
        handler
    }

    #[tokio::test]
    async fn test_execute_persists_next_state() {
        let handler = handler_with_cart("u1").await;
        let user = UserId::new("u1");

        let result = handler
            .execute(&user, "add_item", |cart| cart.add_item("A".into(), 2))
            .await
            .unwrap();

        assert!(result.persisted);
        assert_eq!(result.attempts, 1);
        assert_eq!(result.cart.version(), Version::new(2));
        assert_eq!(result.cart.item_count(), 1);
    }

    #[tokio::test]
    async fn test_execute_without_change_skips_write() {
        let handler = handler_with_cart("u1").await;
        let user = UserId::new("u1");

        let result = handler
            .execute(&user, "remove_items", |cart| Ok(cart.remove_items(&[])))
            .await
            .unwrap();

        assert!(!result.persisted);
        assert_eq!(result.cart.version(), Version::first());
    }

    #[tokio::test]
    async fn test_execute_returns_command_error() {
        let handler = handler_with_cart("u1").await;
        let user = UserId::new("u1");

        let result = handler
            .execute(&user, "update_item", |cart| cart.update_item(&"Z".into(), 1))
            .await;

        assert!(matches!(
            result,
            Err(DomainError::Cart(CartError::CartItemNotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_execute_on_missing_cart() {
        let handler = CommandHandler::new(InMemoryCartStore::new());
        let result = handler
            .execute(&UserId::new("ghost"), "clear_cart", |cart| Ok(cart.clear()))
            .await;

        assert!(matches!(result, Err(DomainError::CartNotFound { .. })));
    }

    #[tokio::test]
    async fn test_save_with_stale_version_conflicts() {
        let handler = handler_with_cart("u1").await;
        let user = UserId::new("u1");

        let stale = handler.load_existing(&user).await.unwrap();
        handler
            .execute(&user, "add_item", |cart| cart.add_item("A".into(), 1))
            .await
            .unwrap();

        let result = handler.save(stale.add_item("B".into(), 1).unwrap()).await;
        assert!(matches!(
            result,
            Err(DomainError::ConcurrencyConflict { .. })
        ));
    }

    #[tokio::test]
    async fn test_insert_twice_reports_existing_cart() {
        let handler = handler_with_cart("u1").await;
        let result = handler.insert(Cart::new("u1")).await;

        assert!(matches!(result, Err(DomainError::CartAlreadyExists { .. })));
    }

    #[tokio::test]
    async fn test_store_failure_maps_to_not_saved() {
        let store = InMemoryCartStore::new();
        let handler = CommandHandler::new(store.clone());
        handler.insert(Cart::new("u1")).await.unwrap();
        store.set_fail_on_save(true).await;

        let result = handler
            .execute(&UserId::new("u1"), "add_item", |cart| {
                cart.add_item("A".into(), 1)
            })
            .await;

        assert!(matches!(result, Err(DomainError::CartNotSaved(_))));
    }
}
