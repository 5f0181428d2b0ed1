use serde::{Deserialize, Serialize};

use super::cart::Cart;
use super::money::{deserialize_optional_amount, Amount};
use super::payment::PaymentMethod;
use super::product::ProductId;

/// One `{id, quantity}` entry of an order payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: ProductId,
    pub quantity: u32,
}

/// Body of `POST /api/order`. Built from the cart at submission time and
/// never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub items: Vec<OrderItem>,
    pub payment_method: PaymentMethod,
}

impl OrderRequest {
    pub fn from_cart(cart: &Cart, payment_method: PaymentMethod) -> Self {
        Self {
            items: cart.order_items(),
            payment_method,
        }
    }
}

/// The `data` object the backend returns for a paid order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub transaction_code: String,
    #[serde(default)]
    pub order_id: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_amount")]
    pub total: Option<Amount>,
}

impl OrderReceipt {
    pub fn new(transaction_code: impl Into<String>) -> Self {
        Self {
            transaction_code: transaction_code.into(),
            order_id: None,
            total: None,
        }
    }
}
