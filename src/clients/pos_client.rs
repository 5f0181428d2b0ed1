use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, instrument};

use crate::domain::{Amount, CashChange, Notification, OrderRequest, PaymentMethod, ProductId};
use crate::error::PosError;
use crate::messages::PosRequest;
use crate::view::PosView;

use super::client_method;

/// Handle to the controller actor.
///
/// Commands go through the mpsc channel; the rendered view and the toasts
/// come back through the watch and broadcast channels.
#[derive(Clone)]
pub struct PosClient {
    sender: mpsc::Sender<PosRequest>,
    view: watch::Receiver<PosView>,
    notifications: broadcast::Sender<Notification>,
}

impl PosClient {
    pub fn new(
        sender: mpsc::Sender<PosRequest>,
        view: watch::Receiver<PosView>,
        notifications: broadcast::Sender<Notification>,
    ) -> Self {
        Self {
            sender,
            view,
            notifications,
        }
    }

    /// The most recently rendered view.
    pub fn current_view(&self) -> PosView {
        self.view.borrow().clone()
    }

    /// A receiver that wakes on every re-render.
    pub fn subscribe_view(&self) -> watch::Receiver<PosView> {
        self.view.clone()
    }

    pub fn subscribe_notifications(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    #[instrument(skip(self))]
    pub async fn shutdown(&self) {
        debug!("Sending request");
        let _ = self.sender.send(PosRequest::Shutdown).await;
    }
}

client_method!(PosClient => fn refresh_catalog() -> () as PosRequest::RefreshCatalog, Error = PosError);
client_method!(PosClient => fn add_to_cart(product_id: ProductId) -> u32 as PosRequest::AddToCart, Error = PosError);
client_method!(PosClient => fn remove_from_cart(product_id: ProductId) -> u32 as PosRequest::RemoveFromCart, Error = PosError);
client_method!(PosClient => fn clear_cart() -> () as PosRequest::ClearCart, Error = PosError);
client_method!(PosClient => fn set_category_filter(category: Option<String>) -> () as PosRequest::SetCategoryFilter, Error = PosError);
client_method!(PosClient => fn open_payment() -> Amount as PosRequest::OpenPayment, Error = PosError);
client_method!(PosClient => fn close_payment() -> () as PosRequest::ClosePayment, Error = PosError);
client_method!(PosClient => fn select_payment_method(method: PaymentMethod) -> () as PosRequest::SelectPaymentMethod, Error = PosError);
client_method!(PosClient => fn enter_tendered(input: String) -> Option<CashChange> as PosRequest::EnterTendered, Error = PosError);
client_method!(PosClient => fn confirm_payment() -> OrderRequest as PosRequest::ConfirmPayment, Error = PosError);
