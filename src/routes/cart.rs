use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch, post},
};
use tower_sessions::Session;
use uuid::Uuid;

use crate::{
    dto::cart::{AddToCartRequest, CartView, UpdateCartItemRequest},
    error::AppResult,
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(view_cart).delete(clear_cart))
        .route("/items", post(add_to_cart))
        .route(
            "/items/{product_id}",
            patch(update_cart_item).delete(remove_from_cart),
        )
}

#[utoipa::path(
    get,
    path = "/cart",
    responses(
        (status = 200, description = "Session cart re-priced from the catalog", body = ApiResponse<CartView>)
    ),
    tag = "Cart"
)]
pub async fn view_cart(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::view_cart(&state, session).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/cart/items",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Add product to cart", body = ApiResponse<CartView>),
        (status = 400, description = "Invalid quantity or not enough stock"),
        (status = 404, description = "Product not found")
    ),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::add_to_cart(&state, session, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/cart/items/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Quantity set; below 1 removes the line", body = ApiResponse<CartView>),
        (status = 400, description = "Not enough stock"),
        (status = 404, description = "Product not in cart")
    ),
    tag = "Cart"
)]
pub async fn update_cart_item(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<UpdateCartItemRequest>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::update_quantity(&state, session, product_id, payload.quantity).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/cart/items/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Remove product from cart", body = ApiResponse<CartView>),
        (status = 404, description = "Product not in cart")
    ),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::remove_from_cart(&state, session, product_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/cart",
    responses(
        (status = 200, description = "Cart emptied", body = ApiResponse<CartView>)
    ),
    tag = "Cart"
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::clear_cart(&state, session).await?;
    Ok(Json(resp))
}
