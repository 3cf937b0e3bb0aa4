//! Checkout draft: shipping form validation and the
//! shipping → review → payment step machine kept in the session.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::{
    cart::CartLine,
    error::FieldErrors,
    models::{ShippingAddress, ShippingMethod},
};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9\s\-()]{7,20}$").expect("valid phone regex"));

const MIN_PHONE_DIGITS: usize = 7;
const MAX_PHONE_DIGITS: usize = 15;

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn is_valid_phone(phone: &str) -> bool {
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    PHONE_RE.is_match(phone) && (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits)
}

/// Raw shipping step input. Fields default to empty so that a missing key is
/// reported as a missing field rather than a malformed body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct ShippingForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub apartment: Option<String>,
    pub city: String,
    pub country: String,
    pub postal_code: String,
    pub shipping_method: ShippingMethod,
}

/// Validated shipping details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ShippingInfo {
    pub name: String,
    pub email: String,
    pub address: ShippingAddress,
    pub shipping_method: ShippingMethod,
}

impl ShippingForm {
    /// Trims every field and checks it. A missing field only reports
    /// `"<field> is required"`; format checks run on present values.
    pub fn validate(&self) -> Result<ShippingInfo, FieldErrors> {
        let mut errors = FieldErrors::new();
        let mut required = |field: &str, value: &str| -> String {
            let value = value.trim();
            if value.is_empty() {
                errors.insert(field.to_string(), format!("{field} is required"));
            }
            value.to_string()
        };

        let name = required("name", &self.name);
        let email = required("email", &self.email);
        let phone = required("phone", &self.phone);
        let address = required("address", &self.address);
        let city = required("city", &self.city);
        let country = required("country", &self.country);
        let postal_code = required("postal_code", &self.postal_code);

        if !email.is_empty() && !is_valid_email(&email) {
            errors.insert("email".into(), "email is not a valid address".into());
        }
        if !phone.is_empty() && !is_valid_phone(&phone) {
            errors.insert("phone".into(), "phone is not a valid number".into());
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let apartment = self
            .apartment
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        Ok(ShippingInfo {
            name,
            email,
            address: ShippingAddress {
                phone,
                address,
                apartment,
                city,
                country,
                postal_code,
            },
            shipping_method: self.shipping_method,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutStep {
    #[default]
    Shipping,
    Review,
    Payment,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("shipping details have not been completed")]
    ShippingIncomplete,
    #[error("checkout must be reviewed before payment")]
    NotReviewed,
    #[error("no payment is pending for order {0}")]
    UnknownPaymentOrder(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CheckoutDraft {
    pub step: CheckoutStep,
    pub shipping: Option<ShippingInfo>,
    pub provider_order_id: Option<String>,
    /// Cart lines the pending provider order was opened for.
    #[serde(default)]
    pub payment_lines: Vec<CartLine>,
}

/// A provider order awaiting capture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingPayment<'a> {
    pub shipping: &'a ShippingInfo,
    pub lines: &'a [CartLine],
}

impl CheckoutDraft {
    /// Validates the form and advances to review. The draft is left
    /// untouched when validation fails.
    pub fn submit_shipping(&mut self, form: &ShippingForm) -> Result<&ShippingInfo, FieldErrors> {
        let info = form.validate()?;
        self.step = CheckoutStep::Review;
        self.provider_order_id = None;
        self.payment_lines.clear();
        Ok(self.shipping.insert(info))
    }

    /// Back to the shipping step, keeping what was entered.
    pub fn edit(&mut self) {
        self.step = CheckoutStep::Shipping;
        self.provider_order_id = None;
        self.payment_lines.clear();
    }

    pub fn reviewed_shipping(&self) -> Result<&ShippingInfo, CheckoutError> {
        match (&self.step, &self.shipping) {
            (CheckoutStep::Review | CheckoutStep::Payment, Some(info)) => Ok(info),
            _ => Err(CheckoutError::ShippingIncomplete),
        }
    }

    /// Records the provider order created for this checkout and the lines it
    /// was opened for. Allowed again from the payment step so an abandoned
    /// approval can be restarted.
    pub fn begin_payment(
        &mut self,
        provider_order_id: String,
        lines: Vec<CartLine>,
    ) -> Result<(), CheckoutError> {
        match self.step {
            CheckoutStep::Review | CheckoutStep::Payment if self.shipping.is_some() => {
                self.step = CheckoutStep::Payment;
                self.provider_order_id = Some(provider_order_id);
                self.payment_lines = lines;
                Ok(())
            }
            CheckoutStep::Shipping if self.shipping.is_none() => Err(CheckoutError::ShippingIncomplete),
            _ => Err(CheckoutError::NotReviewed),
        }
    }

    /// Shipping details and lines for the pending provider order `order_id`.
    pub fn pending_payment(&self, order_id: &str) -> Result<PendingPayment<'_>, CheckoutError> {
        match (&self.step, &self.provider_order_id, &self.shipping) {
            (CheckoutStep::Payment, Some(pending), Some(info)) if pending == order_id => {
                Ok(PendingPayment {
                    shipping: info,
                    lines: &self.payment_lines,
                })
            }
            _ => Err(CheckoutError::UnknownPaymentOrder(order_id.to_string())),
        }
    }
}
