use crate::error::CartError;

use super::money::{tax_on, Amount};
use super::order::OrderItem;
use super::product::{Product, ProductId};

/// One product in the cart with its aggregated quantity. `qty` is never 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub product: Product,
    pub qty: u32,
}

impl CartLine {
    pub fn line_total(&self) -> Amount {
        self.product.price.saturating_mul(Amount::from(self.qty))
    }
}

/// Subtotal, tax and grand total of a cart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CartSummary {
    pub subtotal: Amount,
    pub tax: Amount,
    pub total: Amount,
}

impl CartSummary {
    pub fn from_subtotal(subtotal: Amount) -> Self {
        let tax = tax_on(subtotal);
        Self {
            subtotal,
            tax,
            total: subtotal.saturating_add(tax),
        }
    }
}

/// Product id → line mapping, kept in insertion order so the order
/// payload is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Adds one unit of `product`, returning the new quantity.
    ///
    /// # Errors
    /// `InsufficientStock` when the product is inventory-managed and the cart
    /// already holds everything on hand. `TotalOverflow` when one more unit
    /// would push the grand total past [`Amount::MAX`]. Either way the cart
    /// is left unchanged.
    pub fn add_line(&mut self, product: &Product) -> Result<u32, CartError> {
        let current = self.quantity_of(product.id);
        if product.is_exhausted_by(current) {
            return Err(CartError::InsufficientStock {
                name: product.name.clone(),
                requested: current.saturating_add(1),
                available: product.stock,
            });
        }
        let overflow = || CartError::TotalOverflow {
            name: product.name.clone(),
        };
        let next_qty = current.checked_add(1).ok_or_else(overflow)?;
        self.total_with(product.price).ok_or_else(overflow)?;

        match self.lines.iter_mut().find(|line| line.product.id == product.id) {
            Some(line) => {
                line.qty = next_qty;
                Ok(line.qty)
            }
            None => {
                self.lines.push(CartLine {
                    product: product.clone(),
                    qty: 1,
                });
                Ok(1)
            }
        }
    }

    /// Removes one unit, dropping the line when it reaches zero.
    ///
    /// Returns the remaining quantity, or `None` when the product was not in
    /// the cart.
    pub fn remove_line(&mut self, product_id: ProductId) -> Option<u32> {
        let index = self.lines.iter().position(|line| line.product.id == product_id)?;
        let line = &mut self.lines[index];
        line.qty = line.qty.saturating_sub(1);
        let remaining = line.qty;
        if remaining == 0 {
            self.lines.remove(index);
        }
        Some(remaining)
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.lines
            .iter()
            .find(|line| line.product.id == product_id)
            .map_or(0, |line| line.qty)
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn summary(&self) -> CartSummary {
        let subtotal = self
            .lines
            .iter()
            .map(CartLine::line_total)
            .fold(0, Amount::saturating_add);
        CartSummary::from_subtotal(subtotal)
    }

    /// Grand total after adding one more unit at `extra`, or `None` when it
    /// does not fit in an [`Amount`].
    fn total_with(&self, extra: Amount) -> Option<Amount> {
        let subtotal = self.lines.iter().try_fold(extra, |acc, line| {
            line.product
                .price
                .checked_mul(Amount::from(line.qty))
                .and_then(|line_total| acc.checked_add(line_total))
        })?;
        subtotal.checked_add(tax_on(subtotal))
    }

    /// The `{id, quantity}` items of an order, in insertion order.
    pub fn order_items(&self) -> Vec<OrderItem> {
        self.lines
            .iter()
            .map(|line| OrderItem {
                id: line.product.id,
                quantity: line.qty,
            })
            .collect()
    }
}
