//! Order totals shared by the cart, the checkout review and the payment
//! gateway. Every amount is rounded half away from zero to two decimals.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::ShippingMethod;

/// Flat surcharge for express delivery. Standard shipping is free.
pub fn express_surcharge() -> Decimal {
    Decimal::new(4000, 2)
}

pub fn shipping_cost(method: ShippingMethod) -> Decimal {
    match method {
        ShippingMethod::Standard => Decimal::ZERO,
        ShippingMethod::Express => express_surcharge(),
    }
}

pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Two-decimal string, the format the payment provider expects.
pub fn format_money(amount: Decimal) -> String {
    format!("{:.2}", round_money(amount))
}

pub fn amounts_match(left: Decimal, right: Decimal) -> bool {
    round_money(left) == round_money(right)
}

/// A line priced from the catalog, never from client input.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub product_id: Uuid,
    pub title: String,
    pub unit_price: Decimal,
    pub quantity: i32,
}

impl PricedLine {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    /// `"Free"` when no shipping is charged, the amount otherwise.
    pub shipping_label: String,
}

impl OrderTotals {
    pub fn new(subtotal: Decimal, method: ShippingMethod) -> Self {
        let subtotal = round_money(subtotal);
        let shipping = shipping_cost(method);
        let shipping_label = if shipping.is_zero() {
            "Free".to_string()
        } else {
            format_money(shipping)
        };
        Self {
            subtotal,
            shipping,
            total: round_money(subtotal + shipping),
            shipping_label,
        }
    }
}

pub fn subtotal(lines: &[PricedLine]) -> Decimal {
    lines.iter().map(PricedLine::line_total).sum()
}

pub fn compute_totals(lines: &[PricedLine], method: ShippingMethod) -> OrderTotals {
    OrderTotals::new(subtotal(lines), method)
}
