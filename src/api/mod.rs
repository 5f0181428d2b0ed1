//! The storefront backend seam.
//!
//! The controller only sees [`StorefrontApi`]; production wires in
//! [`HttpApi`], tests wire in the channel-backed mock.

pub mod http;

use std::future::Future;

use crate::domain::{OrderReceipt, OrderRequest, Product};
use crate::error::ApiError;

pub use http::HttpApi;

pub trait StorefrontApi: Send + Sync + 'static {
    /// `GET /api/products`
    fn fetch_products(&self) -> impl Future<Output = Result<Vec<Product>, ApiError>> + Send;

    /// `POST /api/order`
    fn submit_order(
        &self,
        order: OrderRequest,
    ) -> impl Future<Output = Result<OrderReceipt, ApiError>> + Send;
}
