use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, error, info, info_span, instrument, warn, Instrument};

use crate::api::StorefrontApi;
use crate::clients::PosClient;
use crate::domain::{
    Amount, CashChange, Notification, OrderReceipt, OrderRequest, PaymentMethod, Product, ProductId,
};
use crate::error::{ApiError, PosError};
use crate::messages::{Completion, PosRequest, ServiceResponse};
use crate::view::{render, PosView};

use super::state::AppState;

const NOTIFICATION_CAPACITY: usize = 64;

/// The controller: owns [`AppState`] and handles one message at a time.
///
/// Network calls never run inside a handler. They are spawned and post a
/// [`Completion`] back onto the same queue, so commands keep flowing while
/// a request is in flight.
pub struct PosService<A: StorefrontApi> {
    receiver: mpsc::Receiver<PosRequest>,
    completions: mpsc::WeakSender<PosRequest>,
    api: Arc<A>,
    state: AppState,
    view: watch::Sender<PosView>,
    notifications: broadcast::Sender<Notification>,
}

impl<A: StorefrontApi> PosService<A> {
    pub fn new(buffer_size: usize, api: Arc<A>) -> (Self, PosClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let state = AppState::default();
        let (view, view_rx) = watch::channel(render(&state));
        let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);

        let service = Self {
            receiver,
            completions: sender.downgrade(),
            api,
            state,
            view,
            notifications: notifications.clone(),
        };
        let client = PosClient::new(sender, view_rx, notifications);
        (service, client)
    }

    #[instrument(name = "pos_service", skip(self))]
    pub async fn run(mut self) {
        info!("PosService starting");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                PosRequest::RefreshCatalog { respond_to } => {
                    self.handle_refresh_catalog(respond_to);
                }
                PosRequest::AddToCart { product_id, respond_to } => {
                    self.handle_add_to_cart(product_id, respond_to);
                }
                PosRequest::RemoveFromCart { product_id, respond_to } => {
                    self.handle_remove_from_cart(product_id, respond_to);
                }
                PosRequest::ClearCart { respond_to } => {
                    self.state.clear_cart();
                    self.publish();
                    let _ = respond_to.send(Ok(()));
                }
                PosRequest::SetCategoryFilter { category, respond_to } => {
                    self.handle_set_category_filter(category, respond_to);
                }
                PosRequest::OpenPayment { respond_to } => {
                    self.handle_open_payment(respond_to);
                }
                PosRequest::ClosePayment { respond_to } => {
                    let result = self.state.close_payment().map_err(PosError::from);
                    self.publish();
                    let _ = respond_to.send(result);
                }
                PosRequest::SelectPaymentMethod { method, respond_to } => {
                    self.handle_select_payment_method(method, respond_to);
                }
                PosRequest::EnterTendered { input, respond_to } => {
                    self.handle_enter_tendered(input, respond_to);
                }
                PosRequest::ConfirmPayment { respond_to } => {
                    self.handle_confirm_payment(respond_to);
                }
                PosRequest::Completed(Completion::CatalogFetched(result)) => {
                    self.handle_catalog_fetched(result);
                }
                PosRequest::Completed(Completion::OrderSettled(result)) => {
                    self.handle_order_settled(result);
                }
                PosRequest::Shutdown => {
                    info!("PosService shutting down");
                    break;
                }
            }
        }
        info!("PosService stopped");
    }

    // -------------------------------------------------------------------------
    // Catalog
    // -------------------------------------------------------------------------

    #[instrument(skip(self, respond_to))]
    fn handle_refresh_catalog(&mut self, respond_to: ServiceResponse<(), PosError>) {
        debug!("Processing refresh_catalog request");
        self.spawn_catalog_fetch();
        let _ = respond_to.send(Ok(()));
    }

    fn spawn_catalog_fetch(&self) {
        let api = Arc::clone(&self.api);
        let completions = self.completions.clone();
        tokio::spawn(
            async move {
                let result = api.fetch_products().await;
                post_completion(&completions, Completion::CatalogFetched(result)).await;
            }
            .instrument(info_span!("catalog_fetch")),
        );
    }

    #[instrument(skip(self, result))]
    fn handle_catalog_fetched(&mut self, result: Result<Vec<Product>, ApiError>) {
        match result {
            Ok(products) => {
                info!(count = products.len(), "Catalog refreshed");
                self.state.catalog.replace(products);
                self.publish();
            }
            Err(e) => {
                warn!(error = %e, "Catalog refresh failed, keeping previous list");
                self.notify(Notification::warning("Error loading products"));
            }
        }
    }

    #[instrument(fields(category = ?category), skip(self, category, respond_to))]
    fn handle_set_category_filter(
        &mut self,
        category: Option<String>,
        respond_to: ServiceResponse<(), PosError>,
    ) {
        debug!("Processing set_category_filter request");
        self.state.category_filter = category.filter(|c| !c.trim().is_empty());
        self.publish();
        let _ = respond_to.send(Ok(()));
    }

    // -------------------------------------------------------------------------
    // Cart
    // -------------------------------------------------------------------------

    #[instrument(fields(product_id = %product_id), skip(self, respond_to))]
    fn handle_add_to_cart(&mut self, product_id: ProductId, respond_to: ServiceResponse<u32, PosError>) {
        debug!("Processing add_to_cart request");
        let result = match self.state.add_to_cart(product_id) {
            Ok(qty) => {
                info!(qty, "Added to cart");
                self.publish();
                Ok(qty)
            }
            Err(e) => {
                warn!(error = %e, "Add to cart refused");
                self.notify(Notification::error(e.to_string()));
                Err(PosError::from(e))
            }
        };
        let _ = respond_to.send(result);
    }

    #[instrument(fields(product_id = %product_id), skip(self, respond_to))]
    fn handle_remove_from_cart(&mut self, product_id: ProductId, respond_to: ServiceResponse<u32, PosError>) {
        debug!("Processing remove_from_cart request");
        let remaining = self.state.remove_from_cart(product_id);
        info!(remaining, "Removed from cart");
        self.publish();
        let _ = respond_to.send(Ok(remaining));
    }

    // -------------------------------------------------------------------------
    // Payment
    // -------------------------------------------------------------------------

    #[instrument(skip(self, respond_to))]
    fn handle_open_payment(&mut self, respond_to: ServiceResponse<Amount, PosError>) {
        debug!("Processing open_payment request");
        let result = self.state.open_payment().map_err(PosError::from);
        if let Ok(total) = &result {
            info!(total, "Payment opened");
        }
        self.publish();
        let _ = respond_to.send(result);
    }

    #[instrument(fields(method = %method), skip(self, respond_to))]
    fn handle_select_payment_method(&mut self, method: PaymentMethod, respond_to: ServiceResponse<(), PosError>) {
        debug!("Processing select_payment_method request");
        let result = self.state.select_payment_method(method).map_err(PosError::from);
        self.publish();
        let _ = respond_to.send(result);
    }

    #[instrument(skip(self, input, respond_to))]
    fn handle_enter_tendered(&mut self, input: String, respond_to: ServiceResponse<Option<CashChange>, PosError>) {
        debug!("Processing enter_tendered request");
        let result = self.state.enter_tendered(&input).map_err(PosError::from);
        self.publish();
        let _ = respond_to.send(result);
    }

    #[instrument(skip(self, respond_to))]
    fn handle_confirm_payment(&mut self, respond_to: ServiceResponse<OrderRequest, PosError>) {
        debug!("Processing confirm_payment request");
        let order = match self.state.begin_submission() {
            Ok(order) => order,
            Err(e) => {
                warn!(error = %e, "Confirm refused");
                let _ = respond_to.send(Err(PosError::from(e)));
                return;
            }
        };

        info!(items = order.items.len(), method = %order.payment_method, "Submitting order");
        self.publish();
        self.spawn_order_submission(order.clone());
        let _ = respond_to.send(Ok(order));
    }

    fn spawn_order_submission(&self, order: OrderRequest) {
        let api = Arc::clone(&self.api);
        let completions = self.completions.clone();
        tokio::spawn(
            async move {
                let result = api.submit_order(order).await;
                post_completion(&completions, Completion::OrderSettled(result)).await;
            }
            .instrument(info_span!("order_submission")),
        );
    }

    #[instrument(skip(self, result))]
    fn handle_order_settled(&mut self, result: Result<OrderReceipt, ApiError>) {
        match result {
            Ok(receipt) => {
                info!(transaction_code = %receipt.transaction_code, "Order paid");
                let message = format!("Order Success! {}", receipt.transaction_code);
                self.state.settle_success(receipt);
                self.publish();
                self.notify(Notification::success(message));
                // Stock changed server-side.
                self.spawn_catalog_fetch();
            }
            Err(e) => {
                error!(error = %e, "Order failed");
                let message = e.order_failure_message();
                self.state.settle_failure(&message);
                self.publish();
                self.notify(Notification::error(message));
            }
        }
    }

    // -------------------------------------------------------------------------
    // Output
    // -------------------------------------------------------------------------

    fn publish(&self) {
        self.view.send_replace(render(&self.state));
    }

    fn notify(&self, notification: Notification) {
        debug!(notification = %notification, "Notifying");
        // No subscribers is fine; toasts are fire-and-forget.
        let _ = self.notifications.send(notification);
    }
}

async fn post_completion(completions: &mpsc::WeakSender<PosRequest>, completion: Completion) {
    match completions.upgrade() {
        Some(sender) => {
            if sender.send(PosRequest::Completed(completion)).await.is_err() {
                debug!("PosService stopped before completion arrived");
            }
        }
        None => debug!("PosService gone, dropping completion"),
    }
}
