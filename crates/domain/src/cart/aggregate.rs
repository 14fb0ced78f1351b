//! Cart aggregate implementation.

use std::collections::HashSet;

use cart_store::{CartItemRecord, CartRecord, Version};
use chrono::{DateTime, Utc};
use common::{CartId, CartItemId, ProductId, UserId};
use serde::{Deserialize, Serialize};

use super::CartError;

/// A single product line in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub product_id: ProductId,
    /// Zero is a legal quantity and is not pruned automatically.
    pub quantity: u32,
}

impl CartItem {
    /// Creates a new line with a fresh identifier.
    pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            id: CartItemId::new(),
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Cart aggregate root.
///
/// One cart exists per user. Within a cart each product appears at most once.
/// Command methods never mutate `self`: they return the next state, which the
/// service persists as a whole. A rejected command or a failed write therefore
/// leaves the stored cart exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    id: CartId,
    user_id: UserId,

    /// Stored version this state was loaded at.
    version: Version,

    /// Items in insertion order.
    items: Vec<CartItem>,

    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Result of partitioning a cart for checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSplit {
    /// Lines being turned into an order, in cart order.
    pub checkout: Vec<CartItem>,

    /// The cart as it should look once the order exists.
    pub remaining: Cart,
}

impl CheckoutSplit {
    /// Product IDs of the lines being checked out.
    pub fn checkout_product_ids(&self) -> Vec<ProductId> {
        self.checkout
            .iter()
            .map(|item| item.product_id.clone())
            .collect()
    }
}

// Query methods
impl Cart {
    /// Creates an empty cart for a user that has not been stored yet.
    pub fn new(user_id: impl Into<UserId>) -> Self {
        CartRecord::empty(CartId::new(), user_id.into()).into()
    }

    pub fn id(&self) -> CartId {
        self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns all items in insertion order.
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Returns the item for a product.
    pub fn get_item(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.product_id == product_id)
    }

    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.get_item(product_id).is_some()
    }

    /// Returns the number of lines.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the total quantity of all lines.
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

// Command methods (return the next state)
impl Cart {
    /// Appends a line for a product not yet in the cart.
    pub fn add_item(&self, product_id: ProductId, quantity: u32) -> Result<Cart, CartError> {
        if self.contains(&product_id) {
            return Err(CartError::DuplicateCartItem { product_id });
        }

        let mut next = self.clone();
        next.items.push(CartItem::new(product_id, quantity));
        Ok(next)
    }

    /// Sets the quantity of an existing line. Zero keeps the line.
    pub fn update_item(&self, product_id: &ProductId, quantity: u32) -> Result<Cart, CartError> {
        let mut next = self.clone();
        let item = next
            .items
            .iter_mut()
            .find(|item| &item.product_id == product_id)
            .ok_or_else(|| CartError::item_not_found(product_id))?;

        item.quantity = quantity;
        Ok(next)
    }

    /// Removes the line for a product.
    pub fn remove_item(&self, product_id: &ProductId) -> Result<Cart, CartError> {
        if !self.contains(product_id) {
            return Err(CartError::item_not_found(product_id));
        }

        Ok(self.retain_items(|item| &item.product_id != product_id))
    }

    /// Removes every line whose product is listed. Unknown products are ignored.
    pub fn remove_items(&self, product_ids: &[ProductId]) -> Cart {
        let targets: HashSet<&ProductId> = product_ids.iter().collect();
        self.retain_items(|item| !targets.contains(&item.product_id))
    }

    /// Empties the cart. The cart itself keeps its identity.
    pub fn clear(&self) -> Cart {
        self.retain_items(|_| false)
    }

    /// Partitions the cart into the lines to check out and the rest.
    ///
    /// Fails with `CartItemNotFound` when none of the requested products is
    /// in the cart, since there would be nothing to order.
    pub fn split_for_checkout(&self, product_ids: &[ProductId]) -> Result<CheckoutSplit, CartError> {
        let targets: HashSet<&ProductId> = product_ids.iter().collect();
        let (checkout, remain): (Vec<CartItem>, Vec<CartItem>) = self
            .items
            .iter()
            .cloned()
            .partition(|item| targets.contains(&item.product_id));

        if checkout.is_empty() {
            return Err(CartError::none_found(product_ids));
        }

        let mut remaining = self.clone();
        remaining.items = remain;
        Ok(CheckoutSplit {
            checkout,
            remaining,
        })
    }

    fn retain_items(&self, keep: impl Fn(&CartItem) -> bool) -> Cart {
        let mut next = self.clone();
        next.items.retain(|item| keep(item));
        next
    }
}

impl From<CartRecord> for Cart {
    fn from(record: CartRecord) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            version: record.version,
            items: record
                .items
                .into_iter()
                .map(|item| CartItem {
                    id: item.id,
                    product_id: item.product_id,
                    quantity: item.quantity,
                })
                .collect(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

impl From<Cart> for CartRecord {
    fn from(cart: Cart) -> Self {
        Self {
            id: cart.id,
            user_id: cart.user_id,
            version: cart.version,
            items: cart
                .items
                .into_iter()
                .map(|item| CartItemRecord::new(item.id, item.product_id, item.quantity))
                .collect(),
            created_at: cart.created_at,
            updated_at: cart.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cart_with(items: &[(&str, u32)]) -> Cart {
        let mut cart = Cart::new("user-1");
        for (product, quantity) in items {
            cart = cart.add_item((*product).into(), *quantity).unwrap();
        }
        cart
    }

    fn products(cart: &Cart) -> Vec<(&str, u32)> {
        cart.items()
            .iter()
            .map(|item| (item.product_id.as_str(), item.quantity))
            .collect()
    }

    #[test]
    fn test_new_cart_is_empty_and_unstored() {
        let cart = Cart::new("user-1");
        assert!(cart.is_empty());
        assert_eq!(cart.version(), Version::initial());
        assert_eq!(cart.user_id().as_str(), "user-1");
    }

    #[test]
    fn test_add_item_appends_in_order() {
        let cart = cart_with(&[("A", 2), ("B", 1)]);
        assert_eq!(products(&cart), vec![("A", 2), ("B", 1)]);
        assert_eq!(cart.total_quantity(), 3);
    }

    #[test]
    fn test_add_duplicate_fails_and_leaves_cart_unchanged() {
        let cart = cart_with(&[("A", 2)]);
        let result = cart.add_item("A".into(), 5);

        assert_eq!(
            result,
            Err(CartError::DuplicateCartItem {
                product_id: "A".into()
            })
        );
        assert_eq!(products(&cart), vec![("A", 2)]);
    }

    #[test]
    fn test_update_to_zero_keeps_item() {
        let cart = cart_with(&[("A", 2)]);
        let next = cart.update_item(&"A".into(), 0).unwrap();

        assert_eq!(products(&next), vec![("A", 0)]);
        assert_eq!(next.get_item(&"A".into()).unwrap().id, cart.items()[0].id);
    }

    #[test]
    fn test_update_missing_item_fails() {
        let cart = cart_with(&[("A", 2)]);
        let result = cart.update_item(&"Z".into(), 1);
        assert!(matches!(result, Err(CartError::CartItemNotFound { .. })));
    }

    #[test]
    fn test_remove_item() {
        let cart = cart_with(&[("A", 2), ("B", 1)]);
        let next = cart.remove_item(&"A".into()).unwrap();
        assert_eq!(products(&next), vec![("B", 1)]);

        let result = next.remove_item(&"A".into());
        assert!(matches!(result, Err(CartError::CartItemNotFound { .. })));
    }

    #[test]
    fn test_remove_items_ignores_unknown_products() {
        let cart = cart_with(&[("A", 2), ("B", 1), ("C", 3)]);

        let next = cart.remove_items(&["A".into(), "Z".into()]);
        assert_eq!(products(&next), vec![("B", 1), ("C", 3)]);

        let unchanged = cart.remove_items(&[]);
        assert_eq!(unchanged, cart);
    }

    #[test]
    fn test_clear_keeps_identity() {
        let cart = cart_with(&[("A", 2), ("B", 1)]);
        let cleared = cart.clear();

        assert!(cleared.is_empty());
        assert_eq!(cleared.id(), cart.id());
    }

    #[test]
    fn test_split_for_checkout() {
        let cart = cart_with(&[("A", 2), ("B", 1), ("C", 3)]);
        let split = cart.split_for_checkout(&["A".into(), "C".into()]).unwrap();

        let checkout: Vec<_> = split
            .checkout
            .iter()
            .map(|i| (i.product_id.as_str(), i.quantity))
            .collect();
        assert_eq!(checkout, vec![("A", 2), ("C", 3)]);
        assert_eq!(products(&split.remaining), vec![("B", 1)]);
        assert_eq!(split.remaining.version(), cart.version());
    }

    #[test]
    fn test_split_without_matches_fails() {
        let cart = cart_with(&[("A", 2), ("B", 1)]);
        let result = cart.split_for_checkout(&["Z".into()]);

        assert_eq!(
            result,
            Err(CartError::CartItemNotFound {
                product_id: "Z".to_string()
            })
        );
    }

    #[test]
    fn test_record_conversion_preserves_state() {
        let cart = cart_with(&[("A", 2), ("B", 0)]);
        let record: CartRecord = cart.clone().into();
        let back: Cart = record.into();
        assert_eq!(back, cart);
    }
}
