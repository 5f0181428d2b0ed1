use serde::{Deserialize, Serialize};

use super::money::{deserialize_amount, Amount};

pub type ProductId = i64;

/// A product as served by the catalog endpoint.
///
/// Products are snapshots: the terminal never edits one, it only replaces
/// the whole list on refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(deserialize_with = "deserialize_amount")]
    pub price: Amount,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub is_inventory_managed: bool,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub category: Option<String>,
}

impl Product {
    pub fn new(id: ProductId, name: impl Into<String>, price: Amount) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            image_url: String::new(),
            is_inventory_managed: false,
            stock: 0,
            category: None,
        }
    }

    /// Marks the product as inventory-managed with `stock` units on hand.
    pub fn managed(mut self, stock: i64) -> Self {
        self.is_inventory_managed = true;
        self.stock = stock;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn is_out_of_stock(&self) -> bool {
        self.is_inventory_managed && self.stock <= 0
    }

    /// Whether `in_cart` units already exhaust the stock on hand.
    pub fn is_exhausted_by(&self, in_cart: u32) -> bool {
        self.is_inventory_managed && i64::from(in_cart) >= self.stock
    }
}
