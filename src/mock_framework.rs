//! # Mock Framework
//!
//! Utilities for testing the controller without a backend.
//!
//! Use [`create_mock_api`] to get an API and a receiver. Every call the
//! controller makes shows up on the receiver carrying a responder, so a test
//! decides when and how each request completes. Helpers like
//! [`expect_fetch_products`] and [`expect_submit_order`] assert the next call.

use tokio::sync::{mpsc, oneshot};

use crate::api::StorefrontApi;
use crate::domain::{OrderReceipt, OrderRequest, Product};
use crate::error::ApiError;

pub type Responder<T> = oneshot::Sender<Result<T, ApiError>>;

#[derive(Debug)]
pub enum ApiCall {
    FetchProducts {
        respond_to: Responder<Vec<Product>>,
    },
    SubmitOrder {
        order: OrderRequest,
        respond_to: Responder<OrderReceipt>,
    },
}

#[derive(Clone)]
pub struct MockApi {
    sender: mpsc::Sender<ApiCall>,
}

impl StorefrontApi for MockApi {
    async fn fetch_products(&self) -> Result<Vec<Product>, ApiError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(ApiCall::FetchProducts { respond_to })
            .await
            .map_err(|_| ApiError::Transport("Mock closed".to_string()))?;
        response
            .await
            .map_err(|_| ApiError::Transport("Mock dropped".to_string()))?
    }

    async fn submit_order(&self, order: OrderRequest) -> Result<OrderReceipt, ApiError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(ApiCall::SubmitOrder { order, respond_to })
            .await
            .map_err(|_| ApiError::Transport("Mock closed".to_string()))?;
        response
            .await
            .map_err(|_| ApiError::Transport("Mock dropped".to_string()))?
    }
}

/// Creates a mock API and the receiver its calls arrive on.
pub fn create_mock_api(buffer_size: usize) -> (MockApi, mpsc::Receiver<ApiCall>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (MockApi { sender }, receiver)
}

/// Helper to verify that the next call is a catalog fetch
pub async fn expect_fetch_products(
    receiver: &mut mpsc::Receiver<ApiCall>,
) -> Option<Responder<Vec<Product>>> {
    match receiver.recv().await {
        Some(ApiCall::FetchProducts { respond_to }) => Some(respond_to),
        _ => None,
    }
}

/// Helper to verify that the next call is an order submission
pub async fn expect_submit_order(
    receiver: &mut mpsc::Receiver<ApiCall>,
) -> Option<(OrderRequest, Responder<OrderReceipt>)> {
    match receiver.recv().await {
        Some(ApiCall::SubmitOrder { order, respond_to }) => Some((order, respond_to)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OrderItem, PaymentMethod};

    #[tokio::test]
    async fn test_mock_api() {
        let (api, mut receiver) = create_mock_api(10);

        let submit_task = tokio::spawn(async move {
            let order = OrderRequest {
                items: vec![OrderItem { id: 1, quantity: 3 }],
                payment_method: PaymentMethod::Qris,
            };
            api.submit_order(order).await
        });

        let (order, responder) = expect_submit_order(&mut receiver).await.expect("Expected SubmitOrder");
        assert_eq!(order.items[0].quantity, 3);
        responder.send(Ok(OrderReceipt::new("TRX-20231027-0001"))).unwrap();

        let result = submit_task.await.unwrap();
        assert_eq!(result, Ok(OrderReceipt::new("TRX-20231027-0001")));
    }

    #[tokio::test]
    async fn test_dropped_responder_is_transport_error() {
        let (api, mut receiver) = create_mock_api(10);
        let fetch_task = tokio::spawn(async move { api.fetch_products().await });

        let responder = expect_fetch_products(&mut receiver).await.expect("Expected FetchProducts");
        drop(responder);

        assert!(matches!(fetch_task.await.unwrap(), Err(ApiError::Transport(_))));
    }
}
