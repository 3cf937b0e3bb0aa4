use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use sea_orm::sea_query::Expr;
use uuid::Uuid;

use crate::{
    audit,
    checkout::ShippingInfo,
    dto::{
        orders::{OrderConfirmation, OrderWithItems},
        payment::LineRequest,
    },
    entity::{
        order_items::{ActiveModel as OrderItemActive, Entity as OrderItems, Model as OrderItemModel},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult, field_error},
    middleware::auth::AuthUser,
    models::{Order, OrderItem, OrderStatus, ShippingMethod},
    payment::{CaptureDetails, OrderRequest, ProviderOrder},
    pricing::{PricedLine, amounts_match, compute_totals, shipping_cost},
    response::{ApiResponse, Meta},
    services::{order_service, product_service::find_products},
    state::AppState,
};

/// Merges repeated products into one line each. Quantities must be positive
/// and their sum must fit the quantity column.
pub fn merge_lines(items: &[LineRequest]) -> AppResult<Vec<LineRequest>> {
    if items.is_empty() {
        return Err(field_error("items", "at least one item is required"));
    }

    let mut merged: Vec<LineRequest> = Vec::with_capacity(items.len());
    for item in items {
        if item.quantity <= 0 {
            return Err(field_error("items", "quantity must be greater than 0"));
        }
        match merged.iter_mut().find(|line| line.id == item.id) {
            Some(line) => {
                line.quantity = line
                    .quantity
                    .checked_add(item.quantity)
                    .ok_or_else(|| field_error("items", "quantity is too large"))?;
            }
            None => merged.push(*item),
        }
    }
    Ok(merged)
}

/// Prices `items` from the catalog. Repeated products are merged; unknown,
/// hidden and sold-out products and quantities above stock are rejected.
pub async fn price_lines<C: ConnectionTrait>(
    conn: &C,
    items: &[LineRequest],
) -> AppResult<Vec<PricedLine>> {
    let merged = merge_lines(items)?;

    let ids: Vec<Uuid> = merged.iter().map(|line| line.id).collect();
    let products = find_products(conn, &ids).await?;

    merged
        .iter()
        .map(|line| {
            let product = products
                .iter()
                .find(|p| p.id == line.id && p.quantity > 0)
                .ok_or_else(|| AppError::BadRequest(format!("product {} is not available", line.id)))?;
            if line.quantity > product.quantity {
                return Err(AppError::BadRequest(format!(
                    "only {} of {} available",
                    product.quantity, product.title
                )));
            }
            Ok(PricedLine {
                product_id: product.id,
                title: product.title.clone(),
                unit_price: product.price,
                quantity: line.quantity,
            })
        })
        .collect()
}

/// Opens a provider order for `items`. Totals are recomputed here from
/// catalog prices; nothing the client sends about money is used.
pub async fn create_order(
    state: &AppState,
    items: &[LineRequest],
    shipping_method: ShippingMethod,
) -> AppResult<ApiResponse<ProviderOrder>> {
    let lines = price_lines(&state.orm, items).await?;
    let totals = compute_totals(&lines, shipping_method);
    let request = OrderRequest {
        currency: state.config.paypal.currency.clone(),
        lines,
        totals,
    };

    let provider_order = state.payments.create_order(&request).await?;
    tracing::info!(
        provider_order_id = %provider_order.id,
        total = %request.totals.total,
        "payment order created"
    );

    Ok(ApiResponse::success(
        "Payment order created",
        provider_order,
        Some(Meta::empty()),
    ))
}

/// Captures `provider_order_id` and records the order.
///
/// Repeat captures of a recorded provider order return the stored order. If
/// the captured amount does not cover exactly `items`, or the order cannot be
/// written, the capture is refunded before the error is returned.
pub async fn capture_payment(
    state: &AppState,
    provider_order_id: &str,
    shipping: &ShippingInfo,
    items: &[LineRequest],
    user: Option<&AuthUser>,
) -> AppResult<ApiResponse<OrderConfirmation>> {
    if let Some(existing) = Orders::find()
        .filter(OrderCol::PaypalOrderId.eq(provider_order_id))
        .one(&state.orm)
        .await?
    {
        tracing::info!(%provider_order_id, order_id = %existing.id, "payment already captured");
        let order = order_service::with_items(&state.orm, existing).await?;
        return Ok(ApiResponse::success(
            "Order already captured",
            OrderConfirmation {
                order,
                details: None,
            },
            Some(Meta::empty()),
        ));
    }

    let lines = price_lines(&state.orm, items).await?;
    let details = state.payments.capture_order(provider_order_id).await?;

    let expected = compute_totals(&lines, shipping.shipping_method).total;
    if !amounts_match(expected, details.amount) {
        tracing::warn!(
            %provider_order_id,
            %expected,
            captured = %details.amount,
            "captured amount differs from the order lines"
        );
        compensate_capture(state, &details, "captured amount mismatch").await;
        return Err(AppError::BadRequest(
            "Captured amount does not match the order items".into(),
        ));
    }

    let user_id = user.map(|u| u.user_id);
    let order = match record_order(state, &details, shipping, &lines, user_id).await {
        Ok(order) => order,
        Err(err) => {
            compensate_capture(state, &details, "order write failed").await;
            return Err(err);
        }
    };

    audit::record(
        &state.pool,
        user_id,
        "order_capture",
        "orders",
        serde_json::json!({
            "order_id": order.order.id,
            "provider_order_id": provider_order_id,
            "amount": details.amount,
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Payment captured",
        OrderConfirmation {
            order,
            details: Some(details),
        },
        Some(Meta::empty()),
    ))
}

/// Writes the order, its line items and (when enabled) the stock decrement
/// in one transaction.
async fn record_order(
    state: &AppState,
    details: &CaptureDetails,
    shipping: &ShippingInfo,
    lines: &[PricedLine],
    user_id: Option<Uuid>,
) -> AppResult<OrderWithItems> {
    let txn = state.orm.begin().await?;
    let now = Utc::now();
    let order_id = Uuid::new_v4();

    let order = OrderActive {
        id: Set(order_id),
        user_id: Set(user_id),
        guest_email: Set(shipping.email.clone()),
        customer_name: Set(shipping.name.clone()),
        shipping_address: Set(shipping.address.clone()),
        shipping_method: Set(shipping.shipping_method),
        shipping_cost: Set(shipping_cost(shipping.shipping_method)),
        total_amount: Set(details.amount),
        paypal_order_id: Set(details.provider_order_id.clone()),
        paypal_capture_id: Set(Some(details.capture_id.clone())),
        status: Set(OrderStatus::Processing),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    let item_models: Vec<OrderItemModel> = lines
        .iter()
        .map(|line| OrderItemModel {
            id: Uuid::new_v4(),
            order_id,
            product_id: Some(line.product_id),
            title: line.title.clone(),
            quantity: line.quantity,
            price: line.unit_price,
            created_at: now.into(),
        })
        .collect();

    OrderItems::insert_many(item_models.iter().map(|item| OrderItemActive {
        id: Set(item.id),
        order_id: Set(item.order_id),
        product_id: Set(item.product_id),
        title: Set(item.title.clone()),
        quantity: Set(item.quantity),
        price: Set(item.price),
        created_at: Set(item.created_at),
    }))
    .exec(&txn)
    .await?;

    if state.config.decrement_inventory_on_capture {
        decrement_stock(&txn, lines).await?;
    }

    txn.commit().await?;

    Ok(OrderWithItems {
        order: Order::from(order),
        items: item_models.into_iter().map(OrderItem::from).collect(),
    })
}

/// Guarded decrement: a product whose stock no longer covers the line
/// aborts the whole transaction.
async fn decrement_stock(txn: &DatabaseTransaction, lines: &[PricedLine]) -> AppResult<()> {
    for line in lines {
        let result = Products::update_many()
            .col_expr(ProdCol::Quantity, Expr::col(ProdCol::Quantity).sub(line.quantity))
            .col_expr(ProdCol::UpdatedAt, Expr::current_timestamp().into())
            .filter(ProdCol::Id.eq(line.product_id))
            .filter(ProdCol::Quantity.gte(line.quantity))
            .exec(txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::BadRequest(format!(
                "{} sold out before the order could be recorded",
                line.title
            )));
        }
    }
    Ok(())
}

async fn compensate_capture(state: &AppState, details: &CaptureDetails, reason: &str) {
    match state.payments.refund_capture(&details.capture_id).await {
        Ok(()) => tracing::warn!(
            capture_id = %details.capture_id,
            provider_order_id = %details.provider_order_id,
            %reason,
            "capture refunded"
        ),
        Err(err) => tracing::error!(
            capture_id = %details.capture_id,
            provider_order_id = %details.provider_order_id,
            %reason,
            error = %err,
            "refund failed, manual refund required"
        ),
    }
}
