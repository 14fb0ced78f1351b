use std::collections::HashSet;

use async_trait::async_trait;

use crate::{CartRecord, CartStoreError, Result, UserId, Version};

/// Options for saving a cart aggregate.
///
/// Every save is conditioned on a version; [`Version::initial`] means no cart
/// may exist for the user yet.
#[derive(Debug, Clone, Copy)]
pub struct SaveOptions {
    /// Version the stored cart must be at for the write to succeed.
    pub expected_version: Version,
}

impl SaveOptions {
    /// Creates options expecting the stored cart to be at a specific version.
    pub fn expect_version(version: Version) -> Self {
        Self {
            expected_version: version,
        }
    }

    /// Creates options expecting no cart to exist for the user yet.
    pub fn expect_new() -> Self {
        Self::expect_version(Version::initial())
    }

    /// Whether the save creates the user's cart rather than updating it.
    pub fn creates(&self) -> bool {
        self.expected_version == Version::initial()
    }
}

/// Core trait for cart store implementations.
///
/// The store is the only shared mutable resource of the cart service and the
/// sole arbiter of concurrent writes. Implementations must enforce:
/// - at most one cart per user (`DuplicateCart` on a second insert)
/// - the optimistic version check of [`SaveOptions`] (`ConcurrencyConflict`)
/// - all-or-nothing replacement of the cart and its items
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Loads the cart owned by a user.
    ///
    /// Returns None if the user has no cart.
    async fn find_by_user_id(&self, user_id: &UserId) -> Result<Option<CartRecord>>;

    /// Persists the whole cart aggregate.
    ///
    /// Returns the stored record, with its version advanced by one and
    /// `updated_at` refreshed.
    async fn save(&self, cart: CartRecord, options: SaveOptions) -> Result<CartRecord>;
}

/// Extension trait providing convenience methods for cart stores.
#[async_trait]
pub trait CartStoreExt: CartStore {
    /// Checks if a user already owns a cart.
    async fn exists_by_user_id(&self, user_id: &UserId) -> Result<bool> {
        Ok(self.find_by_user_id(user_id).await?.is_some())
    }

    /// Inserts a cart that must not exist yet.
    async fn insert(&self, cart: CartRecord) -> Result<CartRecord> {
        self.save(cart, SaveOptions::expect_new()).await
    }
}

// Blanket implementation for all CartStore implementations
impl<T: CartStore + ?Sized> CartStoreExt for T {}

/// Validates a record before it is written.
///
/// Product IDs must be unique within a cart.
pub fn validate_record_for_save(cart: &CartRecord) -> Result<()> {
    let mut seen = HashSet::with_capacity(cart.items.len());
    for item in &cart.items {
        if !seen.insert(&item.product_id) {
            return Err(CartStoreError::InvalidRecord(format!(
                "product {} appears more than once in cart {}",
                item.product_id, cart.id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CartId, CartItemId, CartItemRecord};

    #[test]
    fn test_save_options_constructors() {
        assert_eq!(SaveOptions::expect_new().expected_version, Version::initial());
        assert!(SaveOptions::expect_new().creates());
        assert_eq!(
            SaveOptions::expect_version(Version::new(4)).expected_version,
            Version::new(4)
        );
        assert!(!SaveOptions::expect_version(Version::new(4)).creates());
    }

    #[test]
    fn test_validate_rejects_duplicate_products() {
        let mut cart = CartRecord::empty(CartId::new(), UserId::new("u1"));
        cart.items.push(CartItemRecord::new(CartItemId::new(), "P1".into(), 1));
        cart.items.push(CartItemRecord::new(CartItemId::new(), "P1".into(), 2));

        let result = validate_record_for_save(&cart);
        assert!(matches!(result, Err(CartStoreError::InvalidRecord(_))));
    }

    #[test]
    fn test_validate_accepts_distinct_products() {
        let mut cart = CartRecord::empty(CartId::new(), UserId::new("u1"));
        cart.items.push(CartItemRecord::new(CartItemId::new(), "P1".into(), 1));
        cart.items.push(CartItemRecord::new(CartItemId::new(), "P2".into(), 0));

        assert!(validate_record_for_save(&cart).is_ok());
    }
}
