use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;

use crate::state::AppState;

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod doc;
pub mod health;
pub mod images;
pub mod orders;
pub mod params;
pub mod payment;
pub mod products;

/// JSON body limit for everything except image uploads.
pub const JSON_BODY_LIMIT: usize = 1024 * 1024;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    let json_routes = Router::new()
        .nest("/auth", auth::router())
        .nest("/shop", products::shop_router())
        .merge(products::router())
        .nest("/cart", cart::router())
        .nest("/checkout", checkout::router())
        .nest("/payment", payment::router())
        .nest("/orders", orders::router())
        .layer(RequestBodyLimitLayer::new(JSON_BODY_LIMIT));

    json_routes.nest(
        "/images",
        images::router().layer(RequestBodyLimitLayer::new(images::UPLOAD_BODY_LIMIT)),
    )
}
