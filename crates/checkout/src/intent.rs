//! Request and response shapes of the order service's order-intent operation.

use common::{CartId, ProductId, UserId};
use domain::CartItem;
use serde::{Deserialize, Serialize};

/// Identifier issued by the order service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One cart line to be ordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl From<&CartItem> for OrderLine {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product_id.clone(),
            quantity: item.quantity,
        }
    }
}

/// Request to begin order creation from cart contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderIntent {
    pub user_id: UserId,
    pub cart_id: CartId,
    #[serde(rename = "items")]
    pub lines: Vec<OrderLine>,
}

impl OrderIntent {
    /// Builds an intent with one line per checked-out cart item.
    pub fn from_items(user_id: UserId, cart_id: CartId, items: &[CartItem]) -> Self {
        Self {
            user_id,
            cart_id,
            lines: items.iter().map(OrderLine::from).collect(),
        }
    }
}

/// Successful answer to an order intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderIntentReceipt {
    pub order_id: OrderId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_wire_format() {
        let cart_id = CartId::new();
        let items = vec![CartItem::new("A", 2), CartItem::new("C", 3)];
        let intent = OrderIntent::from_items(UserId::new("u1"), cart_id, &items);

        let json = serde_json::to_value(&intent).unwrap();
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["cartId"], cart_id.to_string());
        assert_eq!(json["items"][0]["productId"], "A");
        assert_eq!(json["items"][1]["quantity"], 3);
    }

    #[test]
    fn test_receipt_parses_order_id() {
        let receipt: OrderIntentReceipt =
            serde_json::from_str(r#"{"orderId":"ORD-7"}"#).unwrap();
        assert_eq!(receipt.order_id.as_str(), "ORD-7");
    }
}
