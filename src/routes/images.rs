use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
};

use crate::{
    dto::images::{DeleteImagesRequest, DeletedImages, UploadedImages},
    error::AppResult,
    middleware::auth::AuthUser,
    models::MAX_PRODUCT_IMAGES,
    response::ApiResponse,
    services::image_service,
    state::AppState,
    storage::MAX_IMAGE_BYTES,
};

/// Ten full-size images plus multipart framing.
pub const UPLOAD_BODY_LIMIT: usize = MAX_PRODUCT_IMAGES * MAX_IMAGE_BYTES + 64 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/upload",
            post(upload_images).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/delete-multiple", post(delete_images))
}

#[utoipa::path(
    post,
    path = "/images/upload",
    request_body(content_type = "multipart/form-data", description = "Up to 10 `file` parts: jpeg, png, webp or gif, 5 MiB each"),
    responses(
        (status = 200, description = "Public URLs of the stored images", body = ApiResponse<UploadedImages>),
        (status = 400, description = "Unsupported type, too large or too many files"),
        (status = 403, description = "Forbidden")
    ),
    security(("session_cookie" = [])),
    tag = "Images"
)]
pub async fn upload_images(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<UploadedImages>>> {
    let resp = image_service::upload_images(&state, &user, multipart).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/images/delete-multiple",
    request_body = DeleteImagesRequest,
    responses(
        (status = 200, description = "Number of objects deleted", body = ApiResponse<DeletedImages>),
        (status = 403, description = "Forbidden")
    ),
    security(("session_cookie" = [])),
    tag = "Images"
)]
pub async fn delete_images(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<DeleteImagesRequest>,
) -> AppResult<Json<ApiResponse<DeletedImages>>> {
    let resp = image_service::delete_images(&state, &user, payload).await?;
    Ok(Json(resp))
}
