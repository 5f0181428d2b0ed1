use tokio::sync::oneshot;

use crate::domain::{Amount, CashChange, OrderReceipt, OrderRequest, PaymentMethod, Product, ProductId};
use crate::error::{ApiError, PosError};

/// Generic type aliases for service communication
pub type ServiceResult<T, E> = std::result::Result<T, E>;
pub type ServiceResponse<T, E> = oneshot::Sender<ServiceResult<T, E>>;

/// Commands the terminal sends to the controller. Each variant carries a
/// oneshot channel for the reply.
#[derive(Debug)]
pub enum PosRequest {
    RefreshCatalog {
        respond_to: ServiceResponse<(), PosError>,
    },
    AddToCart {
        product_id: ProductId,
        respond_to: ServiceResponse<u32, PosError>,
    },
    RemoveFromCart {
        product_id: ProductId,
        respond_to: ServiceResponse<u32, PosError>,
    },
    ClearCart {
        respond_to: ServiceResponse<(), PosError>,
    },
    SetCategoryFilter {
        category: Option<String>,
        respond_to: ServiceResponse<(), PosError>,
    },
    OpenPayment {
        respond_to: ServiceResponse<Amount, PosError>,
    },
    ClosePayment {
        respond_to: ServiceResponse<(), PosError>,
    },
    SelectPaymentMethod {
        method: PaymentMethod,
        respond_to: ServiceResponse<(), PosError>,
    },
    EnterTendered {
        input: String,
        respond_to: ServiceResponse<Option<CashChange>, PosError>,
    },
    /// Starts the order submission and replies with the posted order; the
    /// outcome arrives later as a notification.
    ConfirmPayment {
        respond_to: ServiceResponse<OrderRequest, PosError>,
    },
    /// Network completions posted back by the controller's own tasks.
    Completed(Completion),
    Shutdown,
}

#[derive(Debug)]
pub enum Completion {
    CatalogFetched(Result<Vec<Product>, ApiError>),
    OrderSettled(Result<OrderReceipt, ApiError>),
}
