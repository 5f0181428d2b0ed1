//! Declarative view model of the terminal.
//!
//! [`render`] is a pure function of [`AppState`]; the controller calls it
//! after every mutation and publishes the result.

use crate::domain::{
    format_rupiah, Amount, CartSummary, CashChange, PaymentFlow, PaymentMethod, PaymentPhase, Product,
    ProductId,
};
use crate::pos_actor::AppState;

pub const EMPTY_CART_MESSAGE: &str = "Cart is empty";
pub const OUT_OF_STOCK_LABEL: &str = "OUT OF STOCK";
pub const INSUFFICIENT_LABEL: &str = "Insufficient";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StockBadge {
    Unmanaged,
    Available(i64),
    OutOfStock,
}

impl StockBadge {
    fn for_product(product: &Product) -> Self {
        if !product.is_inventory_managed {
            StockBadge::Unmanaged
        } else if product.stock <= 0 {
            StockBadge::OutOfStock
        } else {
            StockBadge::Available(product.stock)
        }
    }

    pub fn label(&self) -> Option<String> {
        match self {
            StockBadge::Unmanaged => None,
            StockBadge::Available(stock) => Some(format!("Stock: {}", stock)),
            StockBadge::OutOfStock => Some(OUT_OF_STOCK_LABEL.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductTile {
    pub id: ProductId,
    pub name: String,
    pub image_url: String,
    pub price_label: String,
    /// Quantity already in the cart, if any.
    pub badge: Option<u32>,
    pub stock: StockBadge,
    pub can_add: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartRow {
    pub product_id: ProductId,
    pub name: String,
    pub qty: u32,
    /// `Rp 10.000 x 2`
    pub unit_label: String,
    pub line_total: Amount,
    pub line_total_label: String,
    pub can_increment: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartPanel {
    pub rows: Vec<CartRow>,
    pub empty_message: Option<&'static str>,
    pub summary: CartSummary,
    pub subtotal_label: String,
    pub tax_label: String,
    pub total_label: String,
    pub pay_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentModal {
    pub method: PaymentMethod,
    pub total_due: Amount,
    pub total_label: String,
    pub tendered_input: String,
    /// Cash only: the change or the insufficient indicator.
    pub change: Option<CashChange>,
    pub change_label: Option<String>,
    pub confirm_enabled: bool,
    pub confirm_label: &'static str,
    pub in_flight: bool,
    pub rejection: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PosView {
    /// False until the first catalog fetch succeeds.
    pub catalog_loaded: bool,
    pub grid: Vec<ProductTile>,
    pub categories: Vec<String>,
    pub category_filter: Option<String>,
    pub cart: CartPanel,
    pub payment: Option<PaymentModal>,
    pub last_transaction_code: Option<String>,
}

impl PosView {
    pub fn tile(&self, id: ProductId) -> Option<&ProductTile> {
        self.grid.iter().find(|tile| tile.id == id)
    }
}

pub fn render(state: &AppState) -> PosView {
    PosView {
        catalog_loaded: state.catalog.is_loaded(),
        grid: render_grid(state),
        categories: state.catalog.categories(),
        category_filter: state.category_filter.clone(),
        cart: render_cart(state),
        payment: state
            .payment
            .as_ref()
            .map(|flow| render_payment(flow, !state.cart.is_empty())),
        last_transaction_code: state
            .last_receipt
            .as_ref()
            .map(|receipt| receipt.transaction_code.clone()),
    }
}

fn render_grid(state: &AppState) -> Vec<ProductTile> {
    state
        .catalog
        .products()
        .iter()
        .filter(|product| match &state.category_filter {
            Some(filter) => product.category.as_deref() == Some(filter.as_str()),
            None => true,
        })
        .map(|product| {
            let qty = state.cart.quantity_of(product.id);
            ProductTile {
                id: product.id,
                name: product.name.clone(),
                image_url: product.image_url.clone(),
                price_label: format_rupiah(product.price),
                badge: (qty > 0).then_some(qty),
                stock: StockBadge::for_product(product),
                can_add: !product.is_out_of_stock(),
            }
        })
        .collect()
}

fn render_cart(state: &AppState) -> CartPanel {
    let summary = state.cart.summary();
    let rows: Vec<CartRow> = state
        .cart
        .lines()
        .iter()
        .map(|line| {
            // Increment is checked against the current catalog, not the snapshot.
            let can_increment = state
                .catalog
                .find(line.product.id)
                .is_some_and(|product| !product.is_exhausted_by(line.qty));
            CartRow {
                product_id: line.product.id,
                name: line.product.name.clone(),
                qty: line.qty,
                unit_label: format!("{} x {}", format_rupiah(line.product.price), line.qty),
                line_total: line.line_total(),
                line_total_label: format_rupiah(line.line_total()),
                can_increment,
            }
        })
        .collect();

    CartPanel {
        empty_message: rows.is_empty().then_some(EMPTY_CART_MESSAGE),
        pay_enabled: !rows.is_empty(),
        rows,
        summary,
        subtotal_label: format_rupiah(summary.subtotal),
        tax_label: format_rupiah(summary.tax),
        total_label: format_rupiah(summary.total),
    }
}

fn render_payment(flow: &PaymentFlow, cart_has_items: bool) -> PaymentModal {
    let change = flow.change();
    let rejection = match flow.phase() {
        PaymentPhase::Rejected { reason } => Some(reason.clone()),
        _ => None,
    };
    PaymentModal {
        method: flow.method(),
        total_due: flow.total_due(),
        total_label: format_rupiah(flow.total_due()),
        tendered_input: flow.tendered_input().to_string(),
        change,
        change_label: change.map(|change| match change {
            CashChange::Change(amount) => format_rupiah(amount),
            CashChange::Insufficient { .. } => INSUFFICIENT_LABEL.to_string(),
        }),
        confirm_enabled: cart_has_items && flow.is_confirmable(),
        confirm_label: flow.confirm_label(),
        in_flight: flow.is_in_flight(),
        rejection,
    }
}
