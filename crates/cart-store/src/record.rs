use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CartId, CartItemId, ProductId, UserId, Version};

/// Persistent shape of a cart aggregate.
///
/// Items are kept in insertion order. The store treats the record as one
/// unit: a save replaces the stored cart and all of its items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartRecord {
    pub id: CartId,
    pub user_id: UserId,
    pub version: Version,
    pub items: Vec<CartItemRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Persistent shape of a single cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItemRecord {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub quantity: u32,
}

impl CartRecord {
    /// Creates an empty, not yet stored record for a user.
    pub fn empty(id: CartId, user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id,
            version: Version::initial(),
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true if the record has not been written yet.
    pub fn is_new(&self) -> bool {
        !self.version.is_stored()
    }
}

impl CartItemRecord {
    pub fn new(id: CartItemId, product_id: ProductId, quantity: u32) -> Self {
        Self {
            id,
            product_id,
            quantity,
        }
    }
}
