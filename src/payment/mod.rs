//! Payment provider seam. The storefront talks to PayPal through
//! [`PaymentGateway`]; tests substitute an in-process implementation.

pub mod paypal;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use utoipa::ToSchema;

use crate::pricing::{OrderTotals, PricedLine};

pub use paypal::PayPalClient;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("unexpected provider response: {0}")]
    Parse(String),

    #[error("payment not completed, capture status {0}")]
    NotCompleted(String),
}

/// Everything the provider needs to open an order.
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub currency: String,
    pub lines: Vec<PricedLine>,
    pub totals: OrderTotals,
}

/// Provider order as returned to the client for approval.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProviderOrder {
    pub id: String,
    pub status: String,
    /// Untouched provider payload.
    #[schema(value_type = Object)]
    pub payload: Value,
}

/// Result of a successful capture.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CaptureDetails {
    pub provider_order_id: String,
    pub capture_id: String,
    pub status: String,
    pub amount: Decimal,
    pub currency: String,
    pub payer_email: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(&self, request: &OrderRequest) -> Result<ProviderOrder, PaymentError>;

    async fn capture_order(&self, provider_order_id: &str) -> Result<CaptureDetails, PaymentError>;

    /// Compensation for a capture whose order could not be recorded.
    async fn refund_capture(&self, capture_id: &str) -> Result<(), PaymentError>;
}
