use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Category, Product};

/// Body for create and for full-replace update: every field is written,
/// including all image slots.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ProductRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub quantity: i32,
    #[serde(default)]
    pub materials: String,
    pub category: Category,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UnhideRequest {
    pub quantity: i32,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}
