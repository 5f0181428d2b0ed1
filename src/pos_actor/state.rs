use crate::domain::{
    Amount, Cart, Catalog, CashChange, OrderReceipt, OrderRequest, PaymentFlow, PaymentMethod,
    ProductId,
};
use crate::error::{CartError, PaymentError};

/// Everything the terminal knows during a session.
///
/// Owned by exactly one `PosService`; nothing else mutates it.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub catalog: Catalog,
    pub cart: Cart,
    /// `Some` while the payment modal is open.
    pub payment: Option<PaymentFlow>,
    pub category_filter: Option<String>,
    pub last_receipt: Option<OrderReceipt>,
}

impl AppState {
    /// Adds one unit of a catalog product to the cart.
    pub fn add_to_cart(&mut self, product_id: ProductId) -> Result<u32, CartError> {
        let product = self
            .catalog
            .find(product_id)
            .ok_or(CartError::UnknownProduct(product_id))?;
        let qty = self.cart.add_line(product)?;
        self.sync_total_due();
        Ok(qty)
    }

    /// Removes one unit; returns the remaining quantity (0 when absent).
    pub fn remove_from_cart(&mut self, product_id: ProductId) -> u32 {
        let remaining = self.cart.remove_line(product_id).unwrap_or(0);
        self.sync_total_due();
        remaining
    }

    pub fn clear_cart(&mut self) {
        self.cart.clear();
        self.sync_total_due();
    }

    pub fn submission_in_flight(&self) -> bool {
        self.payment.as_ref().is_some_and(PaymentFlow::is_in_flight)
    }

    /// Opens a fresh payment flow for the current cart total.
    pub fn open_payment(&mut self) -> Result<Amount, PaymentError> {
        if self.submission_in_flight() {
            return Err(PaymentError::SubmissionInFlight);
        }
        if self.cart.is_empty() {
            return Err(PaymentError::EmptyCart);
        }
        let total = self.cart.summary().total;
        self.payment = Some(PaymentFlow::open(total));
        Ok(total)
    }

    pub fn close_payment(&mut self) -> Result<(), PaymentError> {
        if self.submission_in_flight() {
            return Err(PaymentError::SubmissionInFlight);
        }
        self.payment = None;
        Ok(())
    }

    pub fn select_payment_method(&mut self, method: PaymentMethod) -> Result<(), PaymentError> {
        self.payment_mut()?.select_method(method)
    }

    pub fn enter_tendered(&mut self, input: &str) -> Result<Option<CashChange>, PaymentError> {
        let flow = self.payment_mut()?;
        flow.enter_tendered(input)?;
        Ok(flow.change())
    }

    /// Whether the confirm control is live right now.
    pub fn confirm_enabled(&self) -> bool {
        !self.cart.is_empty() && self.payment.as_ref().is_some_and(PaymentFlow::is_confirmable)
    }

    /// Locks the payment flow and builds the order to post.
    pub fn begin_submission(&mut self) -> Result<OrderRequest, PaymentError> {
        if self.cart.is_empty() {
            return Err(PaymentError::EmptyCart);
        }
        let method = self.payment_mut()?.begin_submission()?;
        Ok(OrderRequest::from_cart(&self.cart, method))
    }

    /// A paid order: the cart empties, the modal closes and the receipt is
    /// kept as the last transaction.
    pub fn settle_success(&mut self, receipt: OrderReceipt) {
        self.cart.clear();
        self.payment = None;
        self.last_receipt = Some(receipt);
    }

    /// A failed order: the cart stays for a retry.
    pub fn settle_failure(&mut self, reason: &str) {
        if let Some(flow) = self.payment.as_mut() {
            flow.settle_rejected(reason);
        }
    }

    fn payment_mut(&mut self) -> Result<&mut PaymentFlow, PaymentError> {
        self.payment.as_mut().ok_or(PaymentError::NotOpen)
    }

    fn sync_total_due(&mut self) {
        let total = self.cart.summary().total;
        if let Some(flow) = self.payment.as_mut() {
            flow.set_total_due(total);
        }
    }
}
