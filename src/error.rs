use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::{
    cart::CartError,
    checkout::CheckoutError,
    config::expose_error_details,
    models::TransitionError,
    payment::PaymentError,
    response::{ApiResponse, Meta},
    storage::StorageError,
};

/// Field name → human readable message, reported with 400 responses.
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Payment provider error")]
    Payment(#[from] PaymentError),

    #[error("Storage error")]
    Storage(#[from] StorageError),

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Session error")]
    Session(#[from] tower_sessions::session::Error),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<FieldErrors>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Storage(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            AppError::Payment(_)
            | AppError::Storage(_)
            | AppError::DbError(_)
            | AppError::OrmError(_)
            | AppError::Session(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The `error` text sent to the caller. Internal failures only carry
    /// their underlying cause outside production.
    fn public_detail(&self) -> String {
        let detail = match self {
            AppError::Payment(err) => Some(err.to_string()),
            AppError::Storage(err) if err.is_client_error() => return err.to_string(),
            AppError::Storage(err) => Some(err.to_string()),
            AppError::DbError(err) => Some(err.to_string()),
            AppError::OrmError(err) => Some(err.to_string()),
            AppError::Session(err) => Some(err.to_string()),
            AppError::Internal(err) => Some(format!("{err:#}")),
            _ => None,
        };
        match detail {
            Some(detail) if expose_error_details() => format!("{self}: {detail}"),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }

        let message = match &self {
            AppError::Storage(err) if err.is_client_error() => err.to_string(),
            _ => self.to_string(),
        };
        let error = self.public_detail();
        let fields = match self {
            AppError::Validation(fields) => Some(fields),
            _ => None,
        };

        let body = ApiResponse {
            message,
            data: Some(ErrorData { error, fields }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Single-field validation error.
pub fn field_error(field: &str, message: impl Into<String>) -> AppError {
    let mut fields = FieldErrors::new();
    fields.insert(field.to_string(), message.into());
    AppError::Validation(fields)
}

impl From<CartError> for AppError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::NotInCart(_) => AppError::NotFound,
            CartError::InvalidQuantity => field_error("quantity", err.to_string()),
            CartError::InsufficientStock { .. } => AppError::BadRequest(err.to_string()),
        }
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}
