use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{DeriveActiveEnum, EnumIter, FromJsonQueryResult};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{order_items, orders, products, users};

/// Sentinel stored in `products.quantity` for products hidden from the shop.
pub const HIDDEN_QUANTITY: i32 = -1;

/// Maximum number of image slots on a product.
pub const MAX_PRODUCT_IMAGES: usize = 10;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "i16", db_type = "SmallInteger")]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[sea_orm(num_value = 0)]
    Rings,
    #[sea_orm(num_value = 1)]
    Necklaces,
    #[sea_orm(num_value = 2)]
    Earrings,
    #[sea_orm(num_value = 3)]
    Bracelets,
}

impl Category {
    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug.trim().to_ascii_lowercase().as_str() {
            "rings" | "0" => Some(Category::Rings),
            "necklaces" | "1" => Some(Category::Necklaces),
            "earrings" | "2" => Some(Category::Earrings),
            "bracelets" | "3" => Some(Category::Bracelets),
            _ => None,
        }
    }
}

/// Shop-facing state derived from the stock column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Available,
    SoldOut,
    Hidden,
}

impl Availability {
    pub fn from_quantity(quantity: i32) -> Self {
        match quantity {
            q if q > 0 => Availability::Available,
            0 => Availability::SoldOut,
            _ => Availability::Hidden,
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum ShippingMethod {
    #[default]
    #[sea_orm(string_value = "standard")]
    Standard,
    #[sea_orm(string_value = "express")]
    Express,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "processing")]
    Processing,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("order cannot move from {from:?} to {to:?}")]
pub struct TransitionError {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

impl OrderStatus {
    /// pending -> processing | cancelled, processing -> completed | cancelled.
    /// Completed and cancelled are terminal.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Processing)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
                | (OrderStatus::Processing, OrderStatus::Completed)
                | (OrderStatus::Processing, OrderStatus::Cancelled)
        )
    }

    pub fn transition_to(self, next: OrderStatus) -> Result<OrderStatus, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError {
                from: self,
                to: next,
            })
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

/// Structured shipping destination, stored as JSONB on the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult, ToSchema)]
pub struct ShippingAddress {
    pub phone: String,
    pub address: String,
    pub apartment: Option<String>,
    pub city: String,
    pub country: String,
    pub postal_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub quantity: i32,
    pub availability: Availability,
    pub materials: String,
    pub category: Category,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub guest_email: String,
    pub customer_name: String,
    pub shipping_address: ShippingAddress,
    pub shipping_method: ShippingMethod,
    pub shipping_cost: Decimal,
    pub total_amount: Decimal,
    pub paypal_order_id: String,
    pub paypal_capture_id: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Option<Uuid>,
    pub title: String,
    pub quantity: i32,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            is_admin: model.is_admin,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<products::Model> for Product {
    fn from(model: products::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            price: model.price,
            quantity: model.quantity,
            availability: Availability::from_quantity(model.quantity),
            materials: model.materials,
            category: model.category,
            images: model.images,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            guest_email: model.guest_email,
            customer_name: model.customer_name,
            shipping_address: model.shipping_address,
            shipping_method: model.shipping_method,
            shipping_cost: model.shipping_cost,
            total_amount: model.total_amount,
            paypal_order_id: model.paypal_order_id,
            paypal_capture_id: model.paypal_capture_id,
            status: model.status,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<order_items::Model> for OrderItem {
    fn from(model: order_items::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            title: model.title,
            quantity: model.quantity,
            price: model.price,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
