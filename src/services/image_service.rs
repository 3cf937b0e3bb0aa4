use axum::extract::Multipart;
use bytes::Bytes;

use crate::{
    audit,
    dto::images::{DeleteImagesRequest, DeletedImages, UploadedImages},
    error::{AppError, AppResult, field_error},
    middleware::auth::{AuthUser, ensure_admin},
    models::MAX_PRODUCT_IMAGES,
    response::{ApiResponse, Meta},
    state::AppState,
    storage::{MAX_IMAGE_BYTES, StorageError, image_extension},
};

/// Multipart field carrying image data.
pub const UPLOAD_FIELD: &str = "file";

struct PendingImage {
    content_type: String,
    data: Bytes,
}

/// Reads every `file` part and checks type and size before anything is stored.
async fn read_images(mut multipart: Multipart) -> AppResult<Vec<PendingImage>> {
    let mut images = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        if images.len() == MAX_PRODUCT_IMAGES {
            return Err(AppError::BadRequest(format!(
                "at most {MAX_PRODUCT_IMAGES} images per upload"
            )));
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        if image_extension(&content_type).is_none() {
            return Err(StorageError::UnsupportedType(content_type).into());
        }
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        if data.len() > MAX_IMAGE_BYTES {
            return Err(StorageError::TooLarge.into());
        }
        images.push(PendingImage { content_type, data });
    }

    if images.is_empty() {
        return Err(AppError::BadRequest(format!(
            "no '{UPLOAD_FIELD}' parts in the upload"
        )));
    }
    Ok(images)
}

/// Stores the uploaded images. A failed store removes the images already
/// written by the same request.
pub async fn upload_images(
    state: &AppState,
    user: &AuthUser,
    multipart: Multipart,
) -> AppResult<ApiResponse<UploadedImages>> {
    ensure_admin(user)?;
    let images = read_images(multipart).await?;

    let mut urls = Vec::with_capacity(images.len());
    for image in images {
        match state.images.upload(&image.content_type, image.data).await {
            Ok(url) => urls.push(url),
            Err(err) => {
                if !urls.is_empty() {
                    if let Err(cleanup) = state.images.delete_many(&urls).await {
                        tracing::warn!(error = %cleanup, count = urls.len(), "orphaned uploaded images");
                    }
                }
                return Err(err.into());
            }
        }
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "image_upload",
        "images",
        serde_json::json!({ "urls": urls }),
    )
    .await;

    let meta = Meta::count(urls.len());
    Ok(ApiResponse::success(
        "Images uploaded",
        UploadedImages { urls },
        Some(meta),
    ))
}

pub async fn delete_images(
    state: &AppState,
    user: &AuthUser,
    payload: DeleteImagesRequest,
) -> AppResult<ApiResponse<DeletedImages>> {
    ensure_admin(user)?;
    if payload.urls.is_empty() {
        return Err(field_error("urls", "at least one URL is required"));
    }

    let deleted = state.images.delete_many(&payload.urls).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "image_delete",
        "images",
        serde_json::json!({ "requested": payload.urls.len(), "deleted": deleted }),
    )
    .await;

    Ok(ApiResponse::success(
        "Images deleted",
        DeletedImages { deleted },
        Some(Meta::empty()),
    ))
}
