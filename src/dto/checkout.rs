use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    cart::CartItem,
    checkout::{CheckoutStep, ShippingInfo},
    pricing::OrderTotals,
};

/// What the review step shows before payment.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewSummary {
    pub step: CheckoutStep,
    pub shipping: ShippingInfo,
    pub items: Vec<CartItem>,
    pub totals: OrderTotals,
}

/// Draft state returned when jumping back to the shipping step.
#[derive(Debug, Serialize, ToSchema)]
pub struct ShippingStep {
    pub step: CheckoutStep,
    pub shipping: Option<ShippingInfo>,
}
