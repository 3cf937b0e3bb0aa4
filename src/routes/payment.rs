use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};

use crate::{
    dto::{
        orders::OrderConfirmation,
        payment::{CapturePaymentRequest, CreatePaymentOrderRequest},
    },
    error::{AppError, AppResult},
    middleware::auth::MaybeUser,
    payment::ProviderOrder,
    response::ApiResponse,
    services::payment_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create-order", post(create_order))
        .route("/capture-payment/{order_id}", post(capture_payment))
}

#[utoipa::path(
    post,
    path = "/payment/create-order",
    request_body = CreatePaymentOrderRequest,
    responses(
        (status = 200, description = "Provider order created from catalog prices", body = ApiResponse<ProviderOrder>),
        (status = 400, description = "Unknown product, unavailable product or not enough stock"),
        (status = 500, description = "Payment provider failure")
    ),
    tag = "Payment"
)]
pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreatePaymentOrderRequest>,
) -> AppResult<Json<ApiResponse<ProviderOrder>>> {
    let resp =
        payment_service::create_order(&state, &payload.items, payload.shipping_method).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/payment/capture-payment/{order_id}",
    params(
        ("order_id" = String, Path, description = "Provider order ID")
    ),
    request_body = CapturePaymentRequest,
    responses(
        (status = 200, description = "Payment captured, order recorded", body = ApiResponse<OrderConfirmation>),
        (status = 400, description = "Invalid shipping details or items, or captured amount differs from the items (refunded)"),
        (status = 500, description = "Capture failed or order could not be recorded")
    ),
    tag = "Payment"
)]
pub async fn capture_payment(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(order_id): Path<String>,
    Json(payload): Json<CapturePaymentRequest>,
) -> AppResult<Json<ApiResponse<OrderConfirmation>>> {
    let shipping = payload.shipping.validate().map_err(AppError::Validation)?;
    let resp = payment_service::capture_payment(
        &state,
        &order_id,
        &shipping,
        &payload.items,
        user.as_ref(),
    )
    .await?;
    Ok(Json(resp))
}
