use thiserror::Error;

use crate::domain::{Amount, ProductId};

/// Local cart validation failures.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CartError {
    #[error("Insufficient stock for {name}")]
    InsufficientStock {
        name: String,
        requested: u32,
        available: i64,
    },
    #[error("Product not found: {0}")]
    UnknownProduct(ProductId),
    #[error("Cart total too large to add {name}")]
    TotalOverflow { name: String },
}

/// Refusals of the payment flow.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PaymentError {
    #[error("Cart is empty")]
    EmptyCart,
    #[error("Payment is not open")]
    NotOpen,
    #[error("An order is already being processed")]
    SubmissionInFlight,
    #[error("Insufficient cash: {short_by} short")]
    InsufficientCash { short_by: Amount },
}

/// Failures talking to the storefront backend.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Transport(String),
    #[error("Malformed response: {0}")]
    Decode(String),
    #[error("Request rejected ({status}): {}", .message.as_deref().unwrap_or("no detail"))]
    Rejected { status: u16, message: Option<String> },
}

impl ApiError {
    /// The text shown to the cashier when an order fails.
    pub fn order_failure_message(&self) -> String {
        match self {
            ApiError::Rejected {
                message: Some(message),
                ..
            } if !message.is_empty() => message.clone(),
            ApiError::Rejected { .. } => "Transaction failed".to_string(),
            ApiError::Transport(_) | ApiError::Decode(_) => "Network error".to_string(),
        }
    }
}

/// Everything a `PosClient` call can fail with.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PosError {
    #[error(transparent)]
    Cart(#[from] CartError),
    #[error(transparent)]
    Payment(#[from] PaymentError),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}
