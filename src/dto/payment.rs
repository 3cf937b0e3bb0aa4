use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{checkout::ShippingForm, models::ShippingMethod};

/// Product and quantity only; prices always come from the catalog.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct LineRequest {
    pub id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePaymentOrderRequest {
    pub items: Vec<LineRequest>,
    #[serde(default)]
    pub shipping_method: ShippingMethod,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CapturePaymentRequest {
    pub shipping: ShippingForm,
    pub items: Vec<LineRequest>,
}
