use jewelry_storefront::{
    dto::products::ProductRequest,
    models::{Availability, Category, OrderStatus},
    services::product_service::validate_product,
};
use rust_decimal::Decimal;

#[test]
fn availability_follows_quantity() {
    assert_eq!(Availability::from_quantity(4), Availability::Available);
    assert_eq!(Availability::from_quantity(0), Availability::SoldOut);
    assert_eq!(Availability::from_quantity(-1), Availability::Hidden);
}

#[test]
fn categories_accept_names_and_legacy_numbers() {
    assert_eq!(Category::from_slug("Rings"), Some(Category::Rings));
    assert_eq!(Category::from_slug("necklaces"), Some(Category::Necklaces));
    assert_eq!(Category::from_slug("2"), Some(Category::Earrings));
    assert_eq!(Category::from_slug("bracelets"), Some(Category::Bracelets));
    assert_eq!(Category::from_slug("brooches"), None);
    assert_eq!(
        serde_json::to_value(Category::Earrings).ok(),
        Some(serde_json::json!("earrings"))
    );
}

#[test]
fn order_status_transitions() {
    use OrderStatus::*;

    assert_eq!(Pending.transition_to(Processing), Ok(Processing));
    assert_eq!(Pending.transition_to(Cancelled), Ok(Cancelled));
    assert_eq!(Processing.transition_to(Completed), Ok(Completed));
    assert_eq!(Processing.transition_to(Cancelled), Ok(Cancelled));

    assert!(Pending.transition_to(Completed).is_err());
    assert!(Processing.transition_to(Processing).is_err());
    assert!(Completed.transition_to(Cancelled).is_err());
    assert!(Cancelled.transition_to(Processing).is_err());

    assert!(Completed.is_terminal());
    assert!(Cancelled.is_terminal());
    assert!(!Processing.is_terminal());
}

#[test]
fn order_status_parses_lowercase() -> anyhow::Result<()> {
    let status: OrderStatus = serde_json::from_str("\"processing\"")?;
    assert_eq!(status, OrderStatus::Processing);
    assert!(serde_json::from_str::<OrderStatus>("\"shipped\"").is_err());
    Ok(())
}

fn product_request() -> ProductRequest {
    ProductRequest {
        title: "Moonstone Pendant".into(),
        description: String::new(),
        price: Decimal::new(8900, 2),
        quantity: 3,
        materials: "silver".into(),
        category: Category::Necklaces,
        images: vec!["https://cdn.example.com/products/a.jpg".into()],
    }
}

#[test]
fn product_validation() {
    assert!(validate_product(&product_request()).is_ok());

    let hidden = ProductRequest {
        quantity: -1,
        ..product_request()
    };
    assert!(validate_product(&hidden).is_ok());

    let bad = ProductRequest {
        title: "  ".into(),
        price: Decimal::new(-1, 0),
        quantity: -2,
        images: vec!["x".into(); 11],
        ..product_request()
    };
    let errors = validate_product(&bad).unwrap_err();
    for field in ["title", "price", "quantity", "images"] {
        assert!(errors.contains_key(field), "missing error for {field}");
    }

    let fractional = ProductRequest {
        price: Decimal::new(12345, 3),
        ..product_request()
    };
    assert!(validate_product(&fractional).unwrap_err().contains_key("price"));
}
