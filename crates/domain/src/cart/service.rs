//! Cart service providing the cart operations used by transports and checkout.

use cart_store::CartStore;
use common::{ProductId, UserId};

use crate::command::CommandHandler;
use crate::error::DomainError;

use super::Cart;

/// Outcome of [`CartService::ensure_cart`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// This call created the cart.
    Created(Cart),
    /// The cart already existed, possibly created by a concurrent caller.
    Existing(Cart),
}

impl EnsureOutcome {
    pub fn cart(&self) -> &Cart {
        match self {
            EnsureOutcome::Created(cart) | EnsureOutcome::Existing(cart) => cart,
        }
    }

    pub fn into_cart(self) -> Cart {
        match self {
            EnsureOutcome::Created(cart) | EnsureOutcome::Existing(cart) => cart,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, EnsureOutcome::Created(_))
    }
}

/// Service for managing carts.
///
/// Every mutation loads the whole cart, computes the next state on the
/// aggregate, and writes the whole cart back in one versioned save.
pub struct CartService<S: CartStore> {
    handler: CommandHandler<S>,
}

impl<S: CartStore> CartService<S> {
    /// Creates a new cart service with the given cart store.
    pub fn new(store: S) -> Self {
        Self {
            handler: CommandHandler::new(store),
        }
    }

    /// Sets how many times a mutation is retried after losing a write race.
    pub fn with_max_conflict_retries(mut self, retries: u32) -> Self {
        self.handler = self.handler.with_max_conflict_retries(retries);
        self
    }

    /// Returns a reference to the underlying command handler.
    pub fn handler(&self) -> &CommandHandler<S> {
        &self.handler
    }

    /// Loads the user's cart.
    #[tracing::instrument(skip(self))]
    pub async fn get_cart(&self, user_id: &UserId) -> Result<Cart, DomainError> {
        self.handler.load_existing(user_id).await
    }

    /// Creates an empty cart for the user unless one exists.
    ///
    /// Losing a creation race to another caller is not a failure: the
    /// store's duplicate report surfaces as `CartAlreadyExists` and is
    /// resolved here by returning the winner's cart.
    #[tracing::instrument(skip(self))]
    pub async fn ensure_cart(&self, user_id: &UserId) -> Result<EnsureOutcome, DomainError> {
        if let Some(cart) = self.handler.load(user_id).await? {
            return Ok(EnsureOutcome::Existing(cart));
        }

        match self.handler.insert(Cart::new(user_id.clone())).await {
            Ok(cart) => {
                tracing::info!(%user_id, cart_id = %cart.id(), "cart created");
                Ok(EnsureOutcome::Created(cart))
            }
            Err(DomainError::CartAlreadyExists { .. }) => {
                tracing::debug!(%user_id, "cart created concurrently by another request");
                let cart = self.handler.load_existing(user_id).await?;
                Ok(EnsureOutcome::Existing(cart))
            }
            Err(e) => Err(e),
        }
    }

    /// Adds a product line, creating the cart first if the user has none.
    ///
    /// Fails with `DuplicateCartItem` if the product is already in the cart;
    /// use [`update_item`](Self::update_item) to change its quantity.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: &UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart, DomainError> {
        self.ensure_cart(user_id).await?;

        let result = self
            .handler
            .execute(user_id, "add_item", |cart| {
                cart.add_item(product_id.clone(), quantity)
            })
            .await?;
        Ok(result.cart)
    }

    /// Sets the quantity of a product line. Zero keeps the line in the cart.
    #[tracing::instrument(skip(self))]
    pub async fn update_item(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Cart, DomainError> {
        let result = self
            .handler
            .execute(user_id, "update_item", |cart| {
                cart.update_item(product_id, quantity)
            })
            .await?;
        Ok(result.cart)
    }

    /// Removes a product line.
    #[tracing::instrument(skip(self))]
    pub async fn remove_item(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
    ) -> Result<(), DomainError> {
        self.handler
            .execute(user_id, "remove_item", |cart| cart.remove_item(product_id))
            .await?;
        Ok(())
    }

    /// Removes every listed product in a single write.
    ///
    /// Products not in the cart are ignored; if none match nothing is written.
    #[tracing::instrument(skip(self))]
    pub async fn remove_items(
        &self,
        user_id: &UserId,
        product_ids: &[ProductId],
    ) -> Result<Cart, DomainError> {
        let result = self
            .handler
            .execute(user_id, "remove_items", |cart| {
                Ok(cart.remove_items(product_ids))
            })
            .await?;
        Ok(result.cart)
    }

    /// Empties the cart; the cart itself remains.
    #[tracing::instrument(skip(self))]
    pub async fn clear_cart(&self, user_id: &UserId) -> Result<(), DomainError> {
        self.handler
            .execute(user_id, "clear_cart", |cart| Ok(cart.clear()))
            .await?;
        Ok(())
    }

    /// Drops products that were processed elsewhere from the user's cart.
    ///
    /// Idempotent: products already gone, or a user without a cart, are not
    /// errors. Returns true once the cart reflects the removal.
    #[tracing::instrument(skip(self))]
    pub async fn invalidate(
        &self,
        user_id: &UserId,
        product_ids: &[ProductId],
    ) -> Result<bool, DomainError> {
        match self.remove_items(user_id, product_ids).await {
            Ok(_) => Ok(true),
            Err(DomainError::CartNotFound { .. }) => {
                tracing::debug!(%user_id, "no cart to invalidate");
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }

    /// Writes a cart state computed from a previously loaded cart.
    ///
    /// Fails with `ConcurrencyConflict` if the cart changed since it was
    /// loaded; the caller decides how to recompute.
    #[tracing::instrument(skip(self, cart), fields(user_id = %cart.user_id()))]
    pub async fn save_cart(&self, cart: Cart) -> Result<Cart, DomainError> {
        self.handler.save(cart).await
    }
}
