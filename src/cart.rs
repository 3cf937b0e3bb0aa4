//! Cart state and its reducer.
//!
//! The cart is a list of (product snapshot, quantity) lines. Every change goes
//! through [`CartState::apply`]; persistence lives in
//! [`crate::services::cart_service::CartStore`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::products;

/// Catalog fields the cart needs, captured when the cart is hydrated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CartProduct {
    pub id: Uuid,
    pub title: String,
    pub price: Decimal,
    /// Stock at hydration time.
    pub stock: i32,
    pub image: Option<String>,
}

impl From<&products::Model> for CartProduct {
    fn from(model: &products::Model) -> Self {
        Self {
            id: model.id,
            title: model.title.clone(),
            price: model.price,
            stock: model.quantity,
            image: model.images.first().cloned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub product: CartProduct,
    pub quantity: i32,
}

impl CartItem {
    pub fn line_total(&self) -> Decimal {
        self.product.price * Decimal::from(self.quantity)
    }
}

/// Persisted form of a cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    pub id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone)]
pub enum CartAction {
    SetItems(Vec<CartItem>),
    AddItem { product: CartProduct, quantity: i32 },
    RemoveItem(Uuid),
    UpdateQuantity { id: Uuid, quantity: i32 },
    ClearCart,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("quantity must be greater than 0")]
    InvalidQuantity,
    #[error("only {available} of product {product_id} available, {requested} requested")]
    InsufficientStock {
        product_id: Uuid,
        requested: i32,
        available: i32,
    },
    #[error("product {0} is not in the cart")]
    NotInCart(Uuid),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartState {
    items: Vec<CartItem>,
}

impl CartState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Units held for a product, zero when absent.
    pub fn quantity_of(&self, product_id: Uuid) -> i32 {
        self.items
            .iter()
            .find(|item| item.product.id == product_id)
            .map_or(0, |item| item.quantity)
    }

    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|item| i64::from(item.quantity)).sum()
    }

    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    pub fn lines(&self) -> Vec<CartLine> {
        self.items
            .iter()
            .map(|item| CartLine {
                id: item.product.id,
                quantity: item.quantity,
            })
            .collect()
    }

    pub fn apply(&mut self, action: CartAction) -> Result<(), CartError> {
        match action {
            CartAction::SetItems(items) => {
                self.items = items.into_iter().filter(|item| item.quantity > 0).collect();
            }
            CartAction::AddItem { product, quantity } => {
                if quantity <= 0 {
                    return Err(CartError::InvalidQuantity);
                }
                let held = self.quantity_of(product.id);
                let available = (product.stock - held).max(0);
                if quantity > available {
                    return Err(CartError::InsufficientStock {
                        product_id: product.id,
                        requested: quantity,
                        available,
                    });
                }
                match self.items.iter_mut().find(|item| item.product.id == product.id) {
                    Some(item) => {
                        item.quantity += quantity;
                        item.product = product;
                    }
                    None => self.items.push(CartItem { product, quantity }),
                }
            }
            CartAction::RemoveItem(id) => {
                self.items.retain(|item| item.product.id != id);
            }
            CartAction::UpdateQuantity { id, quantity } => {
                if quantity < 1 {
                    self.items.retain(|item| item.product.id != id);
                    return Ok(());
                }
                let item = self
                    .items
                    .iter_mut()
                    .find(|item| item.product.id == id)
                    .ok_or(CartError::NotInCart(id))?;
                if quantity > item.product.stock {
                    return Err(CartError::InsufficientStock {
                        product_id: id,
                        requested: quantity,
                        available: item.product.stock.max(0),
                    });
                }
                item.quantity = quantity;
            }
            CartAction::ClearCart => self.items.clear(),
        }
        Ok(())
    }
}

/// Reads persisted cart lines. Anything that is not an array of
/// `{id, quantity > 0}` is treated as corrupt and yields `None`.
/// Repeated ids are merged.
pub fn parse_stored_lines(value: Value) -> Option<Vec<CartLine>> {
    let lines: Vec<CartLine> = serde_json::from_value(value).ok()?;
    if lines.iter().any(|line| line.quantity <= 0) {
        return None;
    }

    let mut merged: Vec<CartLine> = Vec::with_capacity(lines.len());
    for line in lines {
        match merged.iter_mut().find(|existing| existing.id == line.id) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(line.quantity),
            None => merged.push(line),
        }
    }
    Some(merged)
}
