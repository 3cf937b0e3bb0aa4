mod common;

use std::sync::Arc;

use common::{FakeGateway, FakeImages, create_user, database_url, new_session, setup_state};
use jewelry_storefront::{
    checkout::ShippingForm,
    dto::{
        cart::AddToCartRequest,
        orders::UpdateOrderStatusRequest,
        payment::LineRequest,
        products::ProductRequest,
    },
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{Column as OrderCol, Entity as Orders},
        products::Entity as Products,
    },
    error::AppError,
    middleware::auth::AuthUser,
    models::{Category, OrderStatus, ShippingMethod},
    services::{admin_service, cart_service, checkout_service, payment_service, product_service},
    state::AppState,
};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

async fn create_product(
    state: &AppState,
    admin: &AuthUser,
    price_cents: i64,
    quantity: i32,
) -> anyhow::Result<Uuid> {
    let resp = product_service::create_product(
        state,
        admin,
        ProductRequest {
            title: format!("Test Ring {}", Uuid::new_v4().simple()),
            description: "For tests".into(),
            price: Decimal::new(price_cents, 2),
            quantity,
            materials: "silver".into(),
            category: Category::Rings,
            images: vec!["https://images.test/products/ring.jpg".into()],
        },
    )
    .await?;
    Ok(resp.data.expect("product").id)
}

fn shipping_form(method: ShippingMethod) -> ShippingForm {
    ShippingForm {
        name: "Test Buyer".into(),
        email: "buyer@example.com".into(),
        phone: "+1 555 010 9999".into(),
        address: "1 Test Street".into(),
        apartment: None,
        city: "Springfield".into(),
        country: "US".into(),
        postal_code: "12345".into(),
        shipping_method: method,
    }
}

#[tokio::test]
async fn hidden_products_leave_the_shop_until_unhidden() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run storefront flow tests.");
        return Ok(());
    };
    let state = setup_state(&url, false, Arc::default(), Arc::default()).await?;
    let admin = create_user(&state, true).await?;
    let customer = create_user(&state, false).await?;
    let id = create_product(&state, &admin, 2500, 3).await?;

    let forbidden = product_service::hide_product(&state, &customer, id).await;
    assert!(matches!(forbidden, Err(AppError::Forbidden)));

    product_service::hide_product(&state, &admin, id).await?;
    let shop = product_service::list_available(&state).await?.data.expect("list");
    assert!(shop.items.iter().all(|p| p.id != id));
    assert!(matches!(
        product_service::get_product(&state, None, id).await,
        Err(AppError::NotFound)
    ));
    assert!(product_service::get_product(&state, Some(&admin), id).await.is_ok());

    let bad = product_service::unhide_product(&state, &admin, id, 0).await;
    assert!(matches!(bad, Err(AppError::Validation(_))));

    product_service::unhide_product(&state, &admin, id, 2).await?;
    let shop = product_service::list_available(&state).await?.data.expect("list");
    assert!(shop.items.iter().any(|p| p.id == id && p.quantity == 2));
    Ok(())
}

#[tokio::test]
async fn checkout_captures_once_and_clears_the_cart() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run storefront flow tests.");
        return Ok(());
    };
    let state = setup_state(&url, false, Arc::default(), Arc::default()).await?;
    let admin = create_user(&state, true).await?;
    let ring = create_product(&state, &admin, 2500, 5).await?;
    let chain = create_product(&state, &admin, 1000, 1).await?;

    let session = new_session();
    cart_service::add_to_cart(
        &state,
        session.clone(),
        AddToCartRequest { product_id: ring, quantity: 2 },
    )
    .await?;
    cart_service::add_to_cart(
        &state,
        session.clone(),
        AddToCartRequest { product_id: chain, quantity: 1 },
    )
    .await?;

    let too_many = cart_service::add_to_cart(
        &state,
        session.clone(),
        AddToCartRequest { product_id: chain, quantity: 1 },
    )
    .await;
    assert!(matches!(too_many, Err(AppError::BadRequest(_))));

    let review = checkout_service::submit_shipping(
        &state,
        session.clone(),
        shipping_form(ShippingMethod::Standard),
    )
    .await?
    .data
    .expect("summary");
    assert_eq!(review.totals.total, Decimal::new(6000, 2));
    assert_eq!(review.totals.shipping_label, "Free");

    let provider_order = checkout_service::start_payment(&state, session.clone())
        .await?
        .data
        .expect("provider order");

    let confirmation = checkout_service::complete(&state, session.clone(), None, &provider_order.id)
        .await?
        .data
        .expect("confirmation");
    assert_eq!(confirmation.order.order.status, OrderStatus::Processing);
    assert_eq!(confirmation.order.order.total_amount, Decimal::new(6000, 2));
    assert_eq!(confirmation.order.items.len(), 2);

    let cart = cart_service::view_cart(&state, session.clone()).await?.data.expect("cart");
    assert!(cart.items.is_empty());

    // A repeated capture returns the recorded order instead of a second one.
    let shipping = shipping_form(ShippingMethod::Standard)
        .validate()
        .map_err(|e| anyhow::anyhow!("{e:?}"))?;
    let again = payment_service::capture_payment(
        &state,
        &provider_order.id,
        &shipping,
        &[LineRequest { id: ring, quantity: 2 }],
        None,
    )
    .await?;
    assert_eq!(again.message, "Order already captured");

    let orders = Orders::find()
        .filter(OrderCol::PaypalOrderId.eq(provider_order.id.as_str()))
        .count(&state.orm)
        .await?;
    assert_eq!(orders, 1);
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(confirmation.order.order.id))
        .count(&state.orm)
        .await?;
    assert_eq!(items, 2);

    // Stock is managed by hand unless decrement on capture is enabled.
    let ring_row = Products::find_by_id(ring).one(&state.orm).await?.expect("ring");
    assert_eq!(ring_row.quantity, 5);

    let order_id = confirmation.order.order.id;
    admin_service::update_order_status(
        &state,
        &admin,
        order_id,
        UpdateOrderStatusRequest { status: OrderStatus::Completed },
    )
    .await?;
    let reopened = admin_service::update_order_status(
        &state,
        &admin,
        order_id,
        UpdateOrderStatusRequest { status: OrderStatus::Cancelled },
    )
    .await;
    assert!(matches!(reopened, Err(AppError::BadRequest(_))));
    Ok(())
}

#[tokio::test]
async fn sold_out_during_capture_is_refunded() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run storefront flow tests.");
        return Ok(());
    };
    let payments = Arc::new(FakeGateway::default());
    let state = setup_state(&url, true, payments.clone(), Arc::default()).await?;
    let admin = create_user(&state, true).await?;
    let ring = create_product(&state, &admin, 4500, 1).await?;

    let items = [LineRequest { id: ring, quantity: 1 }];
    let provider_order = payment_service::create_order(&state, &items, ShippingMethod::Express)
        .await?
        .data
        .expect("provider order");
    *payments.sell_out_on_capture.lock().unwrap() = Some((state.pool.clone(), ring));

    let shipping = shipping_form(ShippingMethod::Express)
        .validate()
        .map_err(|e| anyhow::anyhow!("{e:?}"))?;
    let result =
        payment_service::capture_payment(&state, &provider_order.id, &shipping, &items, None).await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    assert_eq!(
        payments.refunds.lock().unwrap().as_slice(),
        [format!("CAP-{}", provider_order.id)]
    );
    let orders = Orders::find()
        .filter(OrderCol::PaypalOrderId.eq(provider_order.id.as_str()))
        .count(&state.orm)
        .await?;
    assert_eq!(orders, 0);
    Ok(())
}

#[tokio::test]
async fn product_delete_rolls_back_when_images_fail() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run storefront flow tests.");
        return Ok(());
    };
    let failing = Arc::new(FakeImages {
        fail_deletes: true,
        ..Default::default()
    });
    let state = setup_state(&url, false, Arc::default(), failing).await?;
    let admin = create_user(&state, true).await?;
    let id = create_product(&state, &admin, 3200, 2).await?;

    let result = product_service::delete_product(&state, &admin, id).await;
    assert!(matches!(result, Err(AppError::Storage(_))));
    assert!(Products::find_by_id(id).one(&state.orm).await?.is_some());

    let images = Arc::new(FakeImages::default());
    let state = AppState {
        images: images.clone(),
        ..state
    };
    product_service::delete_product(&state, &admin, id).await?;
    assert!(Products::find_by_id(id).one(&state.orm).await?.is_none());
    assert_eq!(images.deleted.lock().unwrap().len(), 1);
    Ok(())
}

#[tokio::test]
async fn cart_changes_after_payment_start_are_not_recorded() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run storefront flow tests.");
        return Ok(());
    };
    let state = setup_state(&url, false, Arc::default(), Arc::default()).await?;
    let admin = create_user(&state, true).await?;
    let ring = create_product(&state, &admin, 2500, 5).await?;
    let chain = create_product(&state, &admin, 1000, 5).await?;

    let session = new_session();
    cart_service::add_to_cart(
        &state,
        session.clone(),
        AddToCartRequest { product_id: ring, quantity: 2 },
    )
    .await?;
    checkout_service::submit_shipping(
        &state,
        session.clone(),
        shipping_form(ShippingMethod::Standard),
    )
    .await?;
    let provider_order = checkout_service::start_payment(&state, session.clone())
        .await?
        .data
        .expect("provider order");

    cart_service::add_to_cart(
        &state,
        session.clone(),
        AddToCartRequest { product_id: chain, quantity: 3 },
    )
    .await?;

    let confirmation = checkout_service::complete(&state, session.clone(), None, &provider_order.id)
        .await?
        .data
        .expect("confirmation");
    let order = confirmation.order;
    assert_eq!(order.order.total_amount, Decimal::new(5000, 2));
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].product_id, Some(ring));
    assert_eq!(order.items[0].quantity, 2);
    let item_sum: Decimal = order
        .items
        .iter()
        .map(|item| item.price * Decimal::from(item.quantity))
        .sum();
    assert_eq!(item_sum + order.order.shipping_cost, order.order.total_amount);

    // The chain was added after payment started, so it waits in the cart.
    let cart = cart_service::view_cart(&state, session.clone()).await?.data.expect("cart");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].product.id, chain);
    assert_eq!(cart.items[0].quantity, 3);
    Ok(())
}

#[tokio::test]
async fn capture_with_items_other_than_the_paid_ones_is_refunded() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run storefront flow tests.");
        return Ok(());
    };
    let payments = Arc::new(FakeGateway::default());
    let state = setup_state(&url, false, payments.clone(), Arc::default()).await?;
    let admin = create_user(&state, true).await?;
    let ring = create_product(&state, &admin, 2500, 5).await?;
    let chain = create_product(&state, &admin, 1000, 5).await?;

    let provider_order = payment_service::create_order(
        &state,
        &[LineRequest { id: ring, quantity: 1 }],
        ShippingMethod::Standard,
    )
    .await?
    .data
    .expect("provider order");

    let shipping = shipping_form(ShippingMethod::Standard)
        .validate()
        .map_err(|e| anyhow::anyhow!("{e:?}"))?;
    let result = payment_service::capture_payment(
        &state,
        &provider_order.id,
        &shipping,
        &[
            LineRequest { id: ring, quantity: 1 },
            LineRequest { id: chain, quantity: 3 },
        ],
        None,
    )
    .await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    assert_eq!(
        payments.refunds.lock().unwrap().as_slice(),
        [format!("CAP-{}", provider_order.id)]
    );
    let orders = Orders::find()
        .filter(OrderCol::PaypalOrderId.eq(provider_order.id.as_str()))
        .count(&state.orm)
        .await?;
    assert_eq!(orders, 0);
    Ok(())
}

#[tokio::test]
async fn overflowing_quantities_are_rejected_before_pricing() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run storefront flow tests.");
        return Ok(());
    };
    let state = setup_state(&url, false, Arc::default(), Arc::default()).await?;
    let admin = create_user(&state, true).await?;
    let ring = create_product(&state, &admin, 2500, 5).await?;

    let result = payment_service::create_order(
        &state,
        &[
            LineRequest { id: ring, quantity: i32::MAX },
            LineRequest { id: ring, quantity: 2 },
        ],
        ShippingMethod::Standard,
    )
    .await;
    assert!(matches!(result, Err(AppError::Validation(errors)) if errors.contains_key("items")));
    Ok(())
}
