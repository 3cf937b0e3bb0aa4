use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use tower_sessions::Session;

use crate::{
    checkout::ShippingForm,
    dto::{
        checkout::{ReviewSummary, ShippingStep},
        orders::OrderConfirmation,
    },
    error::AppResult,
    middleware::auth::MaybeUser,
    payment::ProviderOrder,
    response::ApiResponse,
    services::checkout_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/shipping", post(submit_shipping))
        .route("/review", get(review))
        .route("/edit", post(edit))
        .route("/payment", post(start_payment))
        .route("/complete/{order_id}", post(complete))
}

#[utoipa::path(
    post,
    path = "/checkout/shipping",
    request_body = ShippingForm,
    responses(
        (status = 200, description = "Shipping accepted, review summary", body = ApiResponse<ReviewSummary>),
        (status = 400, description = "Missing or invalid fields, or empty cart")
    ),
    tag = "Checkout"
)]
pub async fn submit_shipping(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<ShippingForm>,
) -> AppResult<Json<ApiResponse<ReviewSummary>>> {
    let resp = checkout_service::submit_shipping(&state, session, form).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/checkout/review",
    responses(
        (status = 200, description = "Shipping, items and totals", body = ApiResponse<ReviewSummary>),
        (status = 400, description = "Shipping step not completed")
    ),
    tag = "Checkout"
)]
pub async fn review(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Json<ApiResponse<ReviewSummary>>> {
    let resp = checkout_service::review(&state, session).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/checkout/edit",
    responses(
        (status = 200, description = "Back to the shipping step", body = ApiResponse<ShippingStep>)
    ),
    tag = "Checkout"
)]
pub async fn edit(session: Session) -> AppResult<Json<ApiResponse<ShippingStep>>> {
    let resp = checkout_service::edit(session).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/checkout/payment",
    responses(
        (status = 200, description = "Provider order awaiting approval", body = ApiResponse<ProviderOrder>),
        (status = 400, description = "Checkout not reviewed or cart invalid"),
        (status = 500, description = "Payment provider failure")
    ),
    tag = "Checkout"
)]
pub async fn start_payment(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Json<ApiResponse<ProviderOrder>>> {
    let resp = checkout_service::start_payment(&state, session).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/checkout/complete/{order_id}",
    params(
        ("order_id" = String, Path, description = "Provider order ID")
    ),
    responses(
        (status = 200, description = "Payment captured, order recorded", body = ApiResponse<OrderConfirmation>),
        (status = 400, description = "No payment pending for this order"),
        (status = 500, description = "Capture failed")
    ),
    tag = "Checkout"
)]
pub async fn complete(
    State(state): State<AppState>,
    session: Session,
    MaybeUser(user): MaybeUser,
    Path(order_id): Path<String>,
) -> AppResult<Json<ApiResponse<OrderConfirmation>>> {
    let resp = checkout_service::complete(&state, session, user.as_ref(), &order_id).await?;
    Ok(Json(resp))
}
