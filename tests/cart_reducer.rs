use jewelry_storefront::cart::{
    CartAction, CartError, CartItem, CartProduct, CartState, parse_stored_lines,
};
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

fn product(price_cents: i64, stock: i32) -> CartProduct {
    CartProduct {
        id: Uuid::new_v4(),
        title: "Silver Band Ring".into(),
        price: Decimal::new(price_cents, 2),
        stock,
        image: None,
    }
}

#[test]
fn add_merges_lines_and_tracks_totals() -> anyhow::Result<()> {
    let ring = product(2500, 5);
    let mut cart = CartState::new();

    cart.apply(CartAction::AddItem { product: ring.clone(), quantity: 2 })?;
    cart.apply(CartAction::AddItem { product: ring.clone(), quantity: 1 })?;

    assert_eq!(cart.items().len(), 1);
    assert_eq!(cart.quantity_of(ring.id), 3);
    assert_eq!(cart.item_count(), 3);
    assert_eq!(cart.subtotal(), Decimal::new(7500, 2));
    Ok(())
}

#[test]
fn add_rejects_non_positive_quantity() {
    let mut cart = CartState::new();
    let err = cart
        .apply(CartAction::AddItem { product: product(1000, 3), quantity: 0 })
        .unwrap_err();
    assert_eq!(err, CartError::InvalidQuantity);
    assert!(cart.is_empty());
}

#[test]
fn add_counts_units_already_held_against_stock() -> anyhow::Result<()> {
    let ring = product(1000, 3);
    let mut cart = CartState::new();
    cart.apply(CartAction::AddItem { product: ring.clone(), quantity: 2 })?;

    let err = cart
        .apply(CartAction::AddItem { product: ring.clone(), quantity: 2 })
        .unwrap_err();
    assert_eq!(
        err,
        CartError::InsufficientStock {
            product_id: ring.id,
            requested: 2,
            available: 1,
        }
    );
    assert_eq!(cart.quantity_of(ring.id), 2);
    Ok(())
}

#[test]
fn update_below_one_removes_the_line() -> anyhow::Result<()> {
    let ring = product(1000, 3);
    let mut cart = CartState::new();
    cart.apply(CartAction::AddItem { product: ring.clone(), quantity: 2 })?;

    cart.apply(CartAction::UpdateQuantity { id: ring.id, quantity: 0 })?;
    assert!(cart.is_empty());
    Ok(())
}

#[test]
fn update_is_capped_by_stock() -> anyhow::Result<()> {
    let ring = product(1000, 3);
    let mut cart = CartState::new();
    cart.apply(CartAction::AddItem { product: ring.clone(), quantity: 1 })?;

    cart.apply(CartAction::UpdateQuantity { id: ring.id, quantity: 3 })?;
    assert_eq!(cart.quantity_of(ring.id), 3);

    let err = cart
        .apply(CartAction::UpdateQuantity { id: ring.id, quantity: 4 })
        .unwrap_err();
    assert!(matches!(err, CartError::InsufficientStock { requested: 4, available: 3, .. }));
    assert_eq!(cart.quantity_of(ring.id), 3);
    Ok(())
}

#[test]
fn update_of_missing_line_is_not_in_cart() {
    let mut cart = CartState::new();
    let id = Uuid::new_v4();
    let err = cart
        .apply(CartAction::UpdateQuantity { id, quantity: 2 })
        .unwrap_err();
    assert_eq!(err, CartError::NotInCart(id));
}

#[test]
fn set_items_replaces_and_clear_empties() -> anyhow::Result<()> {
    let ring = product(1000, 3);
    let chain = product(4000, 1);
    let mut cart = CartState::new();
    cart.apply(CartAction::AddItem { product: ring.clone(), quantity: 1 })?;

    cart.apply(CartAction::SetItems(vec![
        CartItem { product: chain.clone(), quantity: 1 },
        CartItem { product: ring.clone(), quantity: 0 },
    ]))?;
    assert_eq!(cart.items().len(), 1);
    assert_eq!(cart.quantity_of(chain.id), 1);

    cart.apply(CartAction::RemoveItem(Uuid::new_v4()))?;
    assert_eq!(cart.items().len(), 1);

    cart.apply(CartAction::ClearCart)?;
    assert!(cart.is_empty());
    assert_eq!(cart.subtotal(), Decimal::ZERO);
    Ok(())
}

#[test]
fn stored_lines_are_validated_and_merged() {
    let id = Uuid::new_v4();
    let lines = parse_stored_lines(json!([
        { "id": id, "quantity": 1 },
        { "id": id, "quantity": 2 },
    ]))
    .expect("valid lines");
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, 3);

    assert!(parse_stored_lines(json!({ "id": id })).is_none());
    assert!(parse_stored_lines(json!([{ "id": id, "quantity": 0 }])).is_none());
    assert!(parse_stored_lines(json!([{ "id": "not-a-uuid", "quantity": 1 }])).is_none());
    assert_eq!(parse_stored_lines(json!([])), Some(vec![]));
}
