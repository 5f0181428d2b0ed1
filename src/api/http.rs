use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::config::Config;
use crate::domain::{OrderReceipt, OrderRequest, Product};
use crate::error::ApiError;

use super::StorefrontApi;

const PRODUCTS_PATH: &str = "/api/products";
const ORDER_PATH: &str = "/api/order";

/// `reqwest`-backed client for the storefront REST endpoints.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(config.api_base_url.clone(), config.request_timeout)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl StorefrontApi for HttpApi {
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn fetch_products(&self) -> Result<Vec<Product>, ApiError> {
        debug!("Sending request");
        let response = self
            .client
            .get(self.url(PRODUCTS_PATH))
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        decode_products(status, &body)
    }

    #[instrument(skip(self, order), fields(items = order.items.len(), method = %order.payment_method))]
    async fn submit_order(&self, order: OrderRequest) -> Result<OrderReceipt, ApiError> {
        debug!("Sending request");
        let response = self
            .client
            .post(self.url(ORDER_PATH))
            .json(&order)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        decode_order_response(status, &body)
    }
}

#[derive(Debug, Deserialize)]
struct OrderEnvelope {
    #[serde(default)]
    data: Option<OrderReceipt>,
    #[serde(default)]
    error: Option<String>,
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

pub(crate) fn decode_products(status: u16, body: &[u8]) -> Result<Vec<Product>, ApiError> {
    if !is_success(status) {
        warn!(status, "Catalog request rejected");
        return Err(ApiError::Rejected {
            status,
            message: None,
        });
    }
    serde_json::from_slice(body).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Interprets an order response.
///
/// A non-2xx status is an application failure whether or not its body
/// parses. A 2xx body carrying `error` is one too. A 2xx body that does
/// not parse, or lacks `data`, is treated as malformed.
pub(crate) fn decode_order_response(status: u16, body: &[u8]) -> Result<OrderReceipt, ApiError> {
    if !is_success(status) {
        let message = serde_json::from_slice::<OrderEnvelope>(body)
            .ok()
            .and_then(|envelope| envelope.error);
        warn!(status, message = ?message, "Order rejected");
        return Err(ApiError::Rejected { status, message });
    }

    let envelope: OrderEnvelope =
        serde_json::from_slice(body).map_err(|e| ApiError::Decode(e.to_string()))?;
    match envelope {
        OrderEnvelope {
            error: Some(message),
            ..
        } => Err(ApiError::Rejected {
            status,
            message: Some(message),
        }),
        OrderEnvelope {
            data: Some(receipt),
            ..
        } => Ok(receipt),
        OrderEnvelope { data: None, .. } => {
            Err(ApiError::Decode("response has no data".to_string()))
        }
    }
}
