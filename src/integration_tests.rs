#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::{broadcast, mpsc};

    use crate::app_system::PosSystem;
    use crate::config::Config;
    use crate::domain::{
        CashChange, Notification, OrderItem, OrderReceipt, PaymentFlow, PaymentMethod, Product,
    };
    use crate::error::{ApiError, CartError, PaymentError, PosError};
    use crate::mock_framework::{create_mock_api, expect_fetch_products, expect_submit_order, ApiCall};
    use crate::view::PosView;

    const WAIT: Duration = Duration::from_secs(2);

    fn catalog() -> Vec<Product> {
        vec![
            Product::new(1, "Kopi Susu", 10_000).with_category("Drinks"),
            Product::new(2, "Roti Bakar", 8_000).managed(0).with_category("Food"),
            Product::new(3, "Teh Manis", 5_000).managed(2).with_category("Drinks"),
        ]
    }

    /// Starts a system and answers the start-up fetch with `products`.
    async fn started_with(products: Vec<Product>) -> (PosSystem, mpsc::Receiver<ApiCall>) {
        let (api, mut calls) = create_mock_api(10);
        let system = PosSystem::start(&Config::default(), api).await.unwrap();

        let responder = expect_fetch_products(&mut calls).await.expect("Expected start-up fetch");
        let expected = products.len();
        responder.send(Ok(products)).unwrap();
        wait_for_view(&system, |v| v.grid.len() == expected).await;

        (system, calls)
    }

    async fn wait_for_view(system: &PosSystem, predicate: impl FnMut(&PosView) -> bool) -> PosView {
        let mut view = system.client.subscribe_view();
        let result = tokio::time::timeout(WAIT, view.wait_for(predicate))
            .await
            .expect("Timed out waiting for view");
        let snapshot = result.expect("View channel closed").clone();
        snapshot
    }

    async fn next_notification(receiver: &mut broadcast::Receiver<Notification>) -> Notification {
        tokio::time::timeout(WAIT, receiver.recv())
            .await
            .expect("Timed out waiting for notification")
            .expect("Notification channel closed")
    }

    #[tokio::test]
    async fn test_cash_order_end_to_end() {
        let (system, mut calls) = started_with(catalog()).await;
        let client = system.client.clone();
        let mut notifications = client.subscribe_notifications();

        // 1. Fill the cart
        assert_eq!(client.add_to_cart(1).await, Ok(1));
        assert_eq!(client.add_to_cart(1).await, Ok(2));
        let view = client.current_view();
        assert_eq!(view.tile(1).unwrap().badge, Some(2));
        assert_eq!(view.cart.summary.subtotal, 20_000);
        assert_eq!(view.cart.summary.tax, 2_000);
        assert_eq!(view.cart.summary.total, 22_000);
        assert!(view.cart.pay_enabled);

        // 2. Pay cash
        assert_eq!(client.open_payment().await, Ok(22_000));
        assert!(!client.current_view().payment.unwrap().confirm_enabled);
        assert_eq!(
            client.enter_tendered("25000".to_string()).await,
            Ok(Some(CashChange::Change(3_000)))
        );
        let modal = client.current_view().payment.unwrap();
        assert_eq!(modal.change_label.as_deref(), Some("Rp 3.000"));
        assert!(modal.confirm_enabled);

        // 3. Confirm: in flight until the backend answers
        let order = client.confirm_payment().await.unwrap();
        assert_eq!(order.items, vec![OrderItem { id: 1, quantity: 2 }]);
        let modal = client.current_view().payment.unwrap();
        assert_eq!(modal.confirm_label, PaymentFlow::PROCESSING_LABEL);
        assert!(!modal.confirm_enabled);
        assert_eq!(
            client.confirm_payment().await,
            Err(PosError::Payment(PaymentError::SubmissionInFlight))
        );

        let (posted, responder) = expect_submit_order(&mut calls).await.expect("Expected SubmitOrder");
        assert_eq!(posted.payment_method, PaymentMethod::Cash);
        assert_eq!(posted.items, order.items);
        responder.send(Ok(OrderReceipt::new("TRX-20231027-0001"))).unwrap();

        // 4. Success: toast, empty cart, modal closed, catalog refreshed
        assert_eq!(
            next_notification(&mut notifications).await,
            Notification::success("Order Success! TRX-20231027-0001")
        );
        let view = client.current_view();
        assert!(view.cart.rows.is_empty());
        assert!(view.payment.is_none());
        assert!(!view.cart.pay_enabled);
        assert_eq!(view.last_transaction_code.as_deref(), Some("TRX-20231027-0001"));

        let responder = expect_fetch_products(&mut calls).await.expect("Expected refresh after order");
        responder
            .send(Ok(vec![Product::new(1, "Kopi Susu", 10_000), Product::new(3, "Teh Manis", 5_000).managed(1)]))
            .unwrap();
        let view = wait_for_view(&system, |v| v.grid.len() == 2).await;
        assert_eq!(view.tile(3).unwrap().stock.label().as_deref(), Some("Stock: 1"));

        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_order_keeps_cart_for_retry() {
        let (system, mut calls) = started_with(catalog()).await;
        let client = system.client.clone();
        let mut notifications = client.subscribe_notifications();

        client.add_to_cart(3).await.unwrap();
        client.open_payment().await.unwrap();
        client.select_payment_method(PaymentMethod::Qris).await.unwrap();
        assert!(client.current_view().payment.unwrap().confirm_enabled);
        client.confirm_payment().await.unwrap();

        let (posted, responder) = expect_submit_order(&mut calls).await.expect("Expected SubmitOrder");
        assert_eq!(posted.payment_method, PaymentMethod::Qris);
        responder
            .send(Err(ApiError::Rejected {
                status: 400,
                message: Some("Insufficient stock for Teh Manis. Available: 0".to_string()),
            }))
            .unwrap();

        assert_eq!(
            next_notification(&mut notifications).await,
            Notification::error("Insufficient stock for Teh Manis. Available: 0")
        );
        let view = client.current_view();
        assert_eq!(view.cart.rows.len(), 1);
        let modal = view.payment.unwrap();
        assert_eq!(modal.confirm_label, PaymentFlow::CONFIRM_LABEL);
        assert!(modal.confirm_enabled);
        assert_eq!(modal.rejection.as_deref(), Some("Insufficient stock for Teh Manis. Available: 0"));

        // Retry goes through
        client.confirm_payment().await.unwrap();
        let (_, responder) = expect_submit_order(&mut calls).await.expect("Expected retry");
        responder.send(Ok(OrderReceipt::new("TRX-20231027-0002"))).unwrap();
        assert_eq!(
            next_notification(&mut notifications).await,
            Notification::success("Order Success! TRX-20231027-0002")
        );

        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_generic_messages_for_bare_and_transport_failures() {
        let (system, mut calls) = started_with(catalog()).await;
        let client = system.client.clone();
        let mut notifications = client.subscribe_notifications();

        client.add_to_cart(1).await.unwrap();
        client.open_payment().await.unwrap();
        client.select_payment_method(PaymentMethod::Qris).await.unwrap();

        client.confirm_payment().await.unwrap();
        let (_, responder) = expect_submit_order(&mut calls).await.unwrap();
        responder.send(Err(ApiError::Rejected { status: 500, message: None })).unwrap();
        assert_eq!(next_notification(&mut notifications).await, Notification::error("Transaction failed"));

        client.confirm_payment().await.unwrap();
        let (_, responder) = expect_submit_order(&mut calls).await.unwrap();
        responder.send(Err(ApiError::Transport("connection reset".to_string()))).unwrap();
        assert_eq!(next_notification(&mut notifications).await, Notification::error("Network error"));

        assert_eq!(client.current_view().cart.rows.len(), 1);
        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_cart_emptied_during_flight_leaves_confirm_disabled() {
        let (system, mut calls) = started_with(catalog()).await;
        let client = system.client.clone();
        let mut notifications = client.subscribe_notifications();

        client.add_to_cart(1).await.unwrap();
        client.open_payment().await.unwrap();
        client.select_payment_method(PaymentMethod::Qris).await.unwrap();
        client.confirm_payment().await.unwrap();

        // The terminal stays responsive while the order is in flight.
        assert_eq!(client.remove_from_cart(1).await, Ok(0));
        assert_eq!(
            client.close_payment().await,
            Err(PosError::Payment(PaymentError::SubmissionInFlight))
        );

        let (_, responder) = expect_submit_order(&mut calls).await.unwrap();
        responder.send(Err(ApiError::Transport("timeout".to_string()))).unwrap();
        next_notification(&mut notifications).await;

        let modal = client.current_view().payment.unwrap();
        assert!(!modal.confirm_enabled);
        assert_eq!(modal.confirm_label, PaymentFlow::CONFIRM_LABEL);
        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_stock_limits_surface_as_errors() {
        let (system, _calls) = started_with(catalog()).await;
        let client = system.client.clone();
        let mut notifications = client.subscribe_notifications();

        let err = client.add_to_cart(2).await.unwrap_err();
        assert!(matches!(err, PosError::Cart(CartError::InsufficientStock { .. })));
        assert_eq!(
            next_notification(&mut notifications).await,
            Notification::error("Insufficient stock for Roti Bakar")
        );
        assert!(client.current_view().cart.rows.is_empty());
        assert!(!client.current_view().tile(2).unwrap().can_add);

        client.add_to_cart(3).await.unwrap();
        client.add_to_cart(3).await.unwrap();
        assert!(client.add_to_cart(3).await.is_err());
        assert_eq!(client.current_view().tile(3).unwrap().badge, Some(2));

        assert_eq!(client.add_to_cart(42).await, Err(PosError::Cart(CartError::UnknownProduct(42))));
        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_oversized_total_is_refused_and_controller_keeps_running() {
        let (system, _calls) = started_with(vec![
            Product::new(1, "Kopi Susu", 10_000),
            Product::new(7, "Emas Batangan", 10_000_000_000_000_000_000),
        ])
        .await;
        let client = system.client.clone();
        let mut notifications = client.subscribe_notifications();

        assert_eq!(client.add_to_cart(7).await, Ok(1));
        assert_eq!(
            client.add_to_cart(7).await,
            Err(PosError::Cart(CartError::TotalOverflow { name: "Emas Batangan".to_string() }))
        );
        assert_eq!(
            next_notification(&mut notifications).await,
            Notification::error("Cart total too large to add Emas Batangan")
        );

        assert_eq!(client.open_payment().await, Ok(11_000_000_000_000_000_000));
        assert_eq!(client.current_view().cart.rows[0].qty, 1);
        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_payment_needs_items_and_exact_cash_boundary() {
        let (system, _calls) = started_with(catalog()).await;
        let client = system.client.clone();

        assert_eq!(client.open_payment().await, Err(PosError::Payment(PaymentError::EmptyCart)));
        assert_eq!(
            client.enter_tendered("100".to_string()).await,
            Err(PosError::Payment(PaymentError::NotOpen))
        );

        client.add_to_cart(1).await.unwrap();
        let total = client.open_payment().await.unwrap();
        assert_eq!(total, 11_000);

        client.enter_tendered(total.to_string()).await.unwrap();
        let modal = client.current_view().payment.unwrap();
        assert_eq!(modal.change, Some(CashChange::Change(0)));
        assert!(modal.confirm_enabled);

        client.enter_tendered((total - 1).to_string()).await.unwrap();
        let modal = client.current_view().payment.unwrap();
        assert_eq!(modal.change_label.as_deref(), Some("Insufficient"));
        assert!(!modal.confirm_enabled);
        assert_eq!(
            client.confirm_payment().await,
            Err(PosError::Payment(PaymentError::InsufficientCash { short_by: 1 }))
        );

        client.close_payment().await.unwrap();
        assert!(client.current_view().payment.is_none());
        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_category_filter_and_clear() {
        let (system, _calls) = started_with(catalog()).await;
        let client = system.client.clone();

        client.add_to_cart(1).await.unwrap();
        client.set_category_filter(Some("Food".to_string())).await.unwrap();
        let view = client.current_view();
        assert_eq!(view.grid.len(), 1);
        assert_eq!(view.category_filter.as_deref(), Some("Food"));
        assert_eq!(view.cart.rows.len(), 1);

        client.set_category_filter(None).await.unwrap();
        assert_eq!(client.current_view().grid.len(), 3);

        client.clear_cart().await.unwrap();
        assert_eq!(client.current_view().cart.empty_message, Some("Cart is empty"));
        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_calls_after_shutdown_fail() {
        let (system, _calls) = started_with(catalog()).await;
        let client = system.client.clone();
        system.shutdown().await.unwrap();

        assert!(matches!(
            client.add_to_cart(1).await,
            Err(PosError::ActorCommunicationError(_))
        ));
    }
}
