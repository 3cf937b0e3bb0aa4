use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    models::{Order, OrderItem, OrderStatus},
    payment::CaptureDetails,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

/// Confirmation snapshot returned after a successful capture.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderConfirmation {
    pub order: OrderWithItems,
    /// `None` when the provider order had already been recorded.
    pub details: Option<CaptureDetails>,
}
