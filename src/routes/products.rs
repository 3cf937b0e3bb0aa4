use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::products::{ProductList, ProductRequest, UnhideRequest},
    error::AppResult,
    middleware::auth::{AuthUser, MaybeUser},
    models::Product,
    response::ApiResponse,
    services::product_service,
    state::AppState,
};

/// Public shop listing, mounted under `/shop`.
pub fn shop_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_shop))
        .route("/{category}", get(list_category))
}

/// Single-product and admin catalog routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/product", post(create_product))
        .route(
            "/product/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/product/{id}/hide", post(hide_product))
        .route("/product/{id}/unhide", post(unhide_product))
        .route("/products/admin/all", get(list_all_products))
}

#[utoipa::path(
    get,
    path = "/shop",
    responses(
        (status = 200, description = "Available products, newest first", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn list_shop(State(state): State<AppState>) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::list_available(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/shop/{category}",
    params(
        ("category" = String, Path, description = "rings, necklaces, earrings or bracelets")
    ),
    responses(
        (status = 200, description = "Available products in a category", body = ApiResponse<ProductList>),
        (status = 400, description = "Unknown category")
    ),
    tag = "Products"
)]
pub async fn list_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::list_by_category(&state, &category).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/product/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Get product", body = ApiResponse<Product>),
        (status = 404, description = "Not Found or hidden")
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = product_service::get_product(&state, viewer.as_ref(), id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/product",
    request_body = ProductRequest,
    responses(
        (status = 201, description = "Create product", body = ApiResponse<Product>),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Forbidden")
    ),
    security(("session_cookie" = [])),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ProductRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Product>>)> {
    let resp = product_service::create_product(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/product/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = ProductRequest,
    responses(
        (status = 200, description = "Replace product", body = ApiResponse<Product>),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("session_cookie" = [])),
    tag = "Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = product_service::update_product(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/product/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product and its images deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
        (status = 500, description = "Image deletion failed, product kept")
    ),
    security(("session_cookie" = [])),
    tag = "Products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = product_service::delete_product(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/product/{id}/hide",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product hidden from the shop", body = ApiResponse<Product>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("session_cookie" = [])),
    tag = "Products"
)]
pub async fn hide_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = product_service::hide_product(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/product/{id}/unhide",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = UnhideRequest,
    responses(
        (status = 200, description = "Product available again", body = ApiResponse<Product>),
        (status = 400, description = "Quantity must be positive"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("session_cookie" = [])),
    tag = "Products"
)]
pub async fn unhide_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UnhideRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = product_service::unhide_product(&state, &user, id, payload.quantity).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/products/admin/all",
    responses(
        (status = 200, description = "Every product, hidden and sold out included", body = ApiResponse<ProductList>),
        (status = 403, description = "Forbidden")
    ),
    security(("session_cookie" = [])),
    tag = "Products"
)]
pub async fn list_all_products(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::list_all(&state, &user).await?;
    Ok(Json(resp))
}
