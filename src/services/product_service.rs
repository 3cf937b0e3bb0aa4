use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use uuid::Uuid;

use crate::{
    audit,
    dto::products::{ProductList, ProductRequest},
    entity::products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
    error::{AppError, AppResult, FieldErrors, field_error},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Category, HIDDEN_QUANTITY, MAX_PRODUCT_IMAGES, Product},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Checks a create/update body. Quantity may be the hidden sentinel.
pub fn validate_product(payload: &ProductRequest) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    if payload.title.trim().is_empty() {
        errors.insert("title".into(), "title is required".into());
    }
    if payload.price < Decimal::ZERO {
        errors.insert("price".into(), "price must not be negative".into());
    }
    if payload.price.normalize().scale() > 2 {
        errors.insert("price".into(), "price must have at most two decimals".into());
    }
    if payload.quantity < HIDDEN_QUANTITY {
        errors.insert("quantity".into(), "quantity must be -1 (hidden) or more".into());
    }
    if payload.images.len() > MAX_PRODUCT_IMAGES {
        errors.insert(
            "images".into(),
            format!("at most {MAX_PRODUCT_IMAGES} images are allowed"),
        );
    }
    if payload.images.iter().any(|url| url.trim().is_empty()) {
        errors.insert("images".into(), "image URLs must not be empty".into());
    }
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn product_list(models: Vec<ProductModel>, message: &str) -> ApiResponse<ProductList> {
    let items: Vec<Product> = models.into_iter().map(Product::from).collect();
    let meta = Meta::count(items.len());
    ApiResponse::success(message, ProductList { items }, Some(meta))
}

/// Products with stock, newest first. Hidden and sold-out products are excluded.
pub async fn list_available(state: &AppState) -> AppResult<ApiResponse<ProductList>> {
    let products = Products::find()
        .filter(Column::Quantity.gt(0))
        .order_by_desc(Column::CreatedAt)
        .all(&state.orm)
        .await?;
    Ok(product_list(products, "Products"))
}

pub async fn list_by_category(
    state: &AppState,
    slug: &str,
) -> AppResult<ApiResponse<ProductList>> {
    let category = Category::from_slug(slug)
        .ok_or_else(|| AppError::BadRequest(format!("unknown category '{slug}'")))?;
    let products = Products::find()
        .filter(Column::Quantity.gt(0))
        .filter(Column::Category.eq(category))
        .order_by_desc(Column::CreatedAt)
        .all(&state.orm)
        .await?;
    Ok(product_list(products, "Products"))
}

/// Every product, including hidden and sold-out ones.
pub async fn list_all(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<ProductList>> {
    ensure_admin(user)?;
    let products = Products::find()
        .order_by_desc(Column::CreatedAt)
        .all(&state.orm)
        .await?;
    Ok(product_list(products, "All products"))
}

pub async fn get_product(
    state: &AppState,
    viewer: Option<&AuthUser>,
    id: Uuid,
) -> AppResult<ApiResponse<Product>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let is_admin = viewer.is_some_and(|user| user.is_admin);
    if product.quantity == HIDDEN_QUANTITY && !is_admin {
        return Err(AppError::NotFound);
    }
    Ok(ApiResponse::success("Product", Product::from(product), None))
}

/// Catalog rows for `ids`, in no particular order.
pub async fn find_products<C: ConnectionTrait>(
    conn: &C,
    ids: &[Uuid],
) -> AppResult<Vec<ProductModel>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    Ok(Products::find()
        .filter(Column::Id.is_in(ids.to_vec()))
        .all(conn)
        .await?)
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: ProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    validate_product(&payload).map_err(AppError::Validation)?;

    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(payload.title.trim().to_string()),
        description: Set(payload.description),
        price: Set(payload.price),
        quantity: Set(payload.quantity),
        materials: Set(payload.materials),
        category: Set(payload.category),
        images: Set(payload.images),
        created_at: NotSet,
        updated_at: NotSet,
    };
    let product = active.insert(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product created",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

/// Full replace of every product field.
pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: ProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    validate_product(&payload).map_err(AppError::Validation)?;

    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: ActiveModel = existing.into();
    active.title = Set(payload.title.trim().to_string());
    active.description = Set(payload.description);
    active.price = Set(payload.price);
    active.quantity = Set(payload.quantity);
    active.materials = Set(payload.materials);
    active.category = Set(payload.category);
    active.images = Set(payload.images);
    active.updated_at = Set(Utc::now().into());
    let product = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

async fn set_quantity(state: &AppState, id: Uuid, quantity: i32) -> AppResult<ProductModel> {
    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let mut active: ActiveModel = existing.into();
    active.quantity = Set(quantity);
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(&state.orm).await?)
}

pub async fn hide_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let product = set_quantity(state, id, HIDDEN_QUANTITY).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_hide",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::success("Product hidden", Product::from(product), None))
}

/// Makes a hidden or sold-out product available again with `quantity` in stock.
pub async fn unhide_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    quantity: i32,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    if quantity <= 0 {
        return Err(field_error(
            "quantity",
            "quantity must be greater than 0",
        ));
    }
    let product = set_quantity(state, id, quantity).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_unhide",
        "products",
        serde_json::json!({ "product_id": id, "quantity": quantity }),
    )
    .await;

    Ok(ApiResponse::success("Product available", Product::from(product), None))
}

/// Deletes the row and its stored images as one unit: the row delete is only
/// committed once the images are gone.
pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;

    let product = Products::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    Products::delete_by_id(id).exec(&txn).await?;

    let deleted_images = if product.images.is_empty() {
        0
    } else {
        match state.images.delete_many(&product.images).await {
            Ok(count) => count,
            Err(err) => {
                tracing::warn!(product_id = %id, error = %err, "image delete failed, rolling back product delete");
                txn.rollback().await?;
                return Err(err.into());
            }
        }
    };

    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id, "images_deleted": deleted_images }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({ "id": id, "images_deleted": deleted_images }),
        Some(Meta::empty()),
    ))
}
