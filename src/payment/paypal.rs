//! PayPal Orders v2 client.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{Response, header::CONTENT_TYPE};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use tracing::instrument;

use super::{CaptureDetails, OrderRequest, PaymentError, PaymentGateway, ProviderOrder};
use crate::{config::PayPalConfig, pricing::format_money};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// PayPal REST client. Cheap to clone.
#[derive(Clone)]
pub struct PayPalClient {
    inner: Arc<PayPalClientInner>,
}

struct PayPalClientInner {
    client: reqwest::Client,
    api_base: String,
    client_id: String,
    client_secret: SecretString,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct CreatedOrder {
    id: String,
    status: String,
}

#[derive(Debug, Deserialize)]
pub struct CaptureResponse {
    pub id: String,
    pub status: String,
    #[serde(default)]
    purchase_units: Vec<CapturedUnit>,
    payer: Option<Payer>,
}

#[derive(Debug, Deserialize)]
struct CapturedUnit {
    payments: Option<Payments>,
}

#[derive(Debug, Deserialize)]
struct Payments {
    #[serde(default)]
    captures: Vec<Capture>,
}

#[derive(Debug, Deserialize)]
struct Capture {
    id: String,
    status: String,
    amount: Money,
}

#[derive(Debug, Deserialize)]
struct Money {
    currency_code: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct Payer {
    email_address: Option<String>,
}

impl CaptureResponse {
    /// Pulls the first capture of the first purchase unit.
    pub fn into_details(self) -> Result<CaptureDetails, PaymentError> {
        if self.status != "COMPLETED" {
            return Err(PaymentError::NotCompleted(self.status));
        }
        let capture = self
            .purchase_units
            .into_iter()
            .next()
            .and_then(|unit| unit.payments)
            .and_then(|payments| payments.captures.into_iter().next())
            .ok_or_else(|| PaymentError::Parse("capture response has no captures".into()))?;
        let amount = capture
            .amount
            .value
            .parse::<Decimal>()
            .map_err(|e| PaymentError::Parse(format!("captured amount: {e}")))?;

        Ok(CaptureDetails {
            provider_order_id: self.id,
            capture_id: capture.id,
            status: capture.status,
            amount,
            currency: capture.amount.currency_code,
            payer_email: self.payer.and_then(|payer| payer.email_address),
        })
    }
}

/// Request body for `POST /v2/checkout/orders`.
pub fn order_body(request: &OrderRequest) -> Value {
    let currency = request.currency.as_str();
    let money = |amount: Decimal| json!({ "currency_code": currency, "value": format_money(amount) });

    let items: Vec<Value> = request
        .lines
        .iter()
        .map(|line| {
            json!({
                "name": line.title,
                "sku": line.product_id.to_string(),
                "unit_amount": money(line.unit_price),
                "quantity": line.quantity.to_string(),
            })
        })
        .collect();

    json!({
        "intent": "CAPTURE",
        "purchase_units": [{
            "amount": {
                "currency_code": currency,
                "value": format_money(request.totals.total),
                "breakdown": {
                    "item_total": money(request.totals.subtotal),
                    "shipping": money(request.totals.shipping),
                },
            },
            "items": items,
        }],
    })
}

impl PayPalClient {
    pub fn new(config: &PayPalConfig) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            inner: Arc::new(PayPalClientInner {
                client,
                api_base: config.api_base.clone(),
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.clone(),
            }),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.inner.api_base, path)
    }

    /// Client-credentials exchange; a fresh token per provider call.
    async fn access_token(&self) -> Result<String, PaymentError> {
        let response = self
            .inner
            .client
            .post(self.url("/v1/oauth2/token"))
            .basic_auth(
                &self.inner.client_id,
                Some(self.inner.client_secret.expose_secret()),
            )
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;
        let token: TokenResponse = read_json(response).await?;
        Ok(token.access_token)
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T, PaymentError> {
        let token = self.access_token().await?;
        let response = self
            .inner
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .header(CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await?;
        read_json(response).await
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, PaymentError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(PaymentError::Api {
            status: status.as_u16(),
            body,
        });
    }
    serde_json::from_str(&body).map_err(|e| PaymentError::Parse(e.to_string()))
}

#[async_trait]
impl PaymentGateway for PayPalClient {
    #[instrument(skip(self, request), fields(total = %request.totals.total))]
    async fn create_order(&self, request: &OrderRequest) -> Result<ProviderOrder, PaymentError> {
        let payload: Value = self.post_json("/v2/checkout/orders", &order_body(request)).await?;
        let created: CreatedOrder = serde_json::from_value(payload.clone())
            .map_err(|e| PaymentError::Parse(e.to_string()))?;
        tracing::info!(provider_order_id = %created.id, "provider order created");
        Ok(ProviderOrder {
            id: created.id,
            status: created.status,
            payload,
        })
    }

    #[instrument(skip(self))]
    async fn capture_order(&self, provider_order_id: &str) -> Result<CaptureDetails, PaymentError> {
        let response: CaptureResponse = self
            .post_json(
                &format!("/v2/checkout/orders/{provider_order_id}/capture"),
                &json!({}),
            )
            .await?;
        response.into_details()
    }

    #[instrument(skip(self))]
    async fn refund_capture(&self, capture_id: &str) -> Result<(), PaymentError> {
        let _: Value = self
            .post_json(&format!("/v2/payments/captures/{capture_id}/refund"), &json!({}))
            .await?;
        Ok(())
    }
}
