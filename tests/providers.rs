use jewelry_storefront::{
    models::ShippingMethod,
    payment::{OrderRequest, PaymentError, paypal::{CaptureResponse, order_body}},
    pricing::{PricedLine, compute_totals},
    storage::{image_extension, key_for_url},
};
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

#[test]
fn order_body_carries_breakdown_and_items() {
    let product_id = Uuid::new_v4();
    let lines = vec![PricedLine {
        product_id,
        title: "Twisted Cuff".into(),
        unit_price: Decimal::new(2500, 2),
        quantity: 2,
    }];
    let request = OrderRequest {
        currency: "USD".into(),
        totals: compute_totals(&lines, ShippingMethod::Express),
        lines,
    };

    let body = order_body(&request);
    assert_eq!(body["intent"], "CAPTURE");

    let unit = &body["purchase_units"][0];
    assert_eq!(unit["amount"]["value"], "90.00");
    assert_eq!(unit["amount"]["currency_code"], "USD");
    assert_eq!(unit["amount"]["breakdown"]["item_total"]["value"], "50.00");
    assert_eq!(unit["amount"]["breakdown"]["shipping"]["value"], "40.00");

    let item = &unit["items"][0];
    assert_eq!(item["sku"], product_id.to_string());
    assert_eq!(item["unit_amount"]["value"], "25.00");
    assert_eq!(item["quantity"], "2");
}

#[test]
fn capture_response_yields_first_capture() -> anyhow::Result<()> {
    let response: CaptureResponse = serde_json::from_value(json!({
        "id": "5O190127TN364715T",
        "status": "COMPLETED",
        "payer": { "email_address": "buyer@example.com" },
        "purchase_units": [{
            "payments": {
                "captures": [{
                    "id": "3C679366HH908993F",
                    "status": "COMPLETED",
                    "amount": { "currency_code": "USD", "value": "50.00" }
                }]
            }
        }]
    }))?;

    let details = response.into_details()?;
    assert_eq!(details.provider_order_id, "5O190127TN364715T");
    assert_eq!(details.capture_id, "3C679366HH908993F");
    assert_eq!(details.amount, Decimal::new(5000, 2));
    assert_eq!(details.currency, "USD");
    assert_eq!(details.payer_email.as_deref(), Some("buyer@example.com"));
    Ok(())
}

#[test]
fn incomplete_capture_is_an_error() -> anyhow::Result<()> {
    let pending: CaptureResponse = serde_json::from_value(json!({
        "id": "ORDER", "status": "PAYER_ACTION_REQUIRED"
    }))?;
    assert!(matches!(pending.into_details(), Err(PaymentError::NotCompleted(s)) if s == "PAYER_ACTION_REQUIRED"));

    let empty: CaptureResponse = serde_json::from_value(json!({
        "id": "ORDER", "status": "COMPLETED", "purchase_units": []
    }))?;
    assert!(matches!(empty.into_details(), Err(PaymentError::Parse(_))));
    Ok(())
}

#[test]
fn image_keys_only_come_from_the_bucket_url() {
    let base = "https://shop-images.s3.us-east-1.amazonaws.com";
    assert_eq!(
        key_for_url(base, &format!("{base}/products/abc.jpg?v=2")).as_deref(),
        Some("products/abc.jpg")
    );
    assert_eq!(key_for_url(base, "https://elsewhere.example.com/products/abc.jpg"), None);
    assert_eq!(key_for_url(base, base), None);
}

#[test]
fn only_web_image_types_are_accepted() {
    assert_eq!(image_extension("image/jpeg"), Some("jpg"));
    assert_eq!(image_extension("image/png"), Some("png"));
    assert_eq!(image_extension("image/webp"), Some("webp"));
    assert_eq!(image_extension("image/gif"), Some("gif"));
    assert_eq!(image_extension("image/svg+xml"), None);
    assert_eq!(image_extension("application/pdf"), None);
}
