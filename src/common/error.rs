// src/common/error.rs

use std::{collections::HashMap, sync::LazyLock};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::common::i18n::{I18nStore, DEFAULT_LOCALE};
use crate::middleware::i18n::Locale;

static FALLBACK_STORE: LazyLock<I18nStore> = LazyLock::new(I18nStore::new);

// One error type for every layer. Repositories translate storage errors
// into the business variants; anything left over is a 500.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("User not found")]
    UserNotFound,

    #[error("Username already exists: {0}")]
    UsernameAlreadyExists(String),

    #[error("Access denied")]
    AccessDenied,

    #[error("Tenant quota exceeded (max {max})")]
    QuotaExceeded { max: i32 },

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Product {0} not found")]
    ProductNotFound(Uuid),

    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i32,
        requested: i32,
    },

    #[error("Quantity must be greater than zero")]
    InvalidQuantity,

    #[error("Order has no line items")]
    EmptyOrder,

    #[error("Cost record has no detail lines")]
    EmptyCostRecord,

    #[error("Cost record for period {0} already exists")]
    DuplicatePeriod(String),

    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    #[error("User is not an eligible crew member")]
    NotEligibleCrew,

    #[error("Crew member already has access")]
    AlreadyGranted,

    #[error("SKU already exists: {0}")]
    SkuAlreadyExists(String),

    #[error("Category name already exists: {0}")]
    CategoryNameAlreadyExists(String),

    #[error("Product has committed order lines")]
    ProductHasOrders,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Bcrypt error: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    /// Stable machine-readable code, also the key into the i18n catalog.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation_error",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::InvalidToken => "invalid_token",
            AppError::UserNotFound => "user_not_found",
            AppError::UsernameAlreadyExists(_) => "username_already_exists",
            AppError::AccessDenied => "access_denied",
            AppError::QuotaExceeded { .. } => "quota_exceeded",
            AppError::NotFound(_) => "not_found",
            AppError::ProductNotFound(_) => "product_not_found",
            AppError::InsufficientStock { .. } => "insufficient_stock",
            AppError::InvalidQuantity => "invalid_quantity",
            AppError::EmptyOrder => "empty_order",
            AppError::EmptyCostRecord => "empty_cost_record",
            AppError::DuplicatePeriod(_) => "duplicate_period",
            AppError::InvalidPeriod(_) => "invalid_period",
            AppError::NotEligibleCrew => "not_eligible_crew",
            AppError::AlreadyGranted => "already_granted",
            AppError::SkuAlreadyExists(_) => "sku_already_exists",
            AppError::CategoryNameAlreadyExists(_) => "category_name_already_exists",
            AppError::ProductHasOrders => "product_has_orders",
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidQuantity
            | AppError::InvalidPeriod(_) => StatusCode::BAD_REQUEST,

            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,

            AppError::AccessDenied => StatusCode::FORBIDDEN,

            AppError::UserNotFound | AppError::NotFound(_) | AppError::ProductNotFound(_) => {
                StatusCode::NOT_FOUND
            }

            AppError::UsernameAlreadyExists(_)
            | AppError::DuplicatePeriod(_)
            | AppError::AlreadyGranted
            | AppError::SkuAlreadyExists(_)
            | AppError::CategoryNameAlreadyExists(_)
            | AppError::ProductHasOrders => StatusCode::CONFLICT,

            AppError::QuotaExceeded { .. }
            | AppError::InsufficientStock { .. }
            | AppError::EmptyOrder
            | AppError::EmptyCostRecord
            | AppError::NotEligibleCrew => StatusCode::UNPROCESSABLE_ENTITY,

            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message_args(&self) -> Vec<(&'static str, String)> {
        match self {
            AppError::UsernameAlreadyExists(username) => vec![("username", username.clone())],
            AppError::QuotaExceeded { max } => vec![("max", max.to_string())],
            AppError::NotFound(entity) => vec![("entity", entity.to_string())],
            AppError::ProductNotFound(id) => vec![("product_id", id.to_string())],
            AppError::InsufficientStock {
                product,
                available,
                requested,
            } => vec![
                ("product", product.clone()),
                ("available", available.to_string()),
                ("requested", requested.to_string()),
            ],
            AppError::DuplicatePeriod(period) | AppError::InvalidPeriod(period) => {
                vec![("period", period.clone())]
            }
            AppError::SkuAlreadyExists(sku) => vec![("sku", sku.clone())],
            AppError::CategoryNameAlreadyExists(name) => vec![("name", name.clone())],
            _ => Vec::new(),
        }
    }

    /// Converts into the response body for the caller's locale.
    /// Internal failures are logged here and never leak their details.
    pub fn to_api_error(self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status();
        let code = self.code();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Internal server error: {}", self);
        }

        let message = store.translate(&locale.0, code, &self.message_args());

        let details = match &self {
            AppError::ValidationError(errors) => {
                let mut fields = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    fields.insert(field.to_string(), messages);
                }
                Some(json!(fields))
            }
            _ => None,
        };

        ApiError {
            status,
            code,
            error: message,
            details,
        }
    }
}

/// What the HTTP layer actually sends back.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "code": self.code, "details": details }),
            None => json!({ "error": self.error, "code": self.code }),
        };
        (self.status, Json(body)).into_response()
    }
}

// Used where no locale is available yet (middleware rejections).
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale(DEFAULT_LOCALE.to_string()), &FALLBACK_STORE)
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn en() -> Locale {
        Locale("en".to_string())
    }

    #[test]
    fn business_errors_map_to_client_statuses() {
        assert_eq!(AppError::AccessDenied.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::QuotaExceeded { max: 1 }.status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::DuplicatePeriod("2024-01".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(AppError::NotFound("tenant").status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::EmptyOrder.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(AppError::ProductHasOrders.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn storage_errors_do_not_leak() {
        let store = I18nStore::new();
        let api = AppError::DatabaseError(sqlx::Error::RowNotFound).to_api_error(&en(), &store);
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.error, "An unexpected error occurred.");
        assert!(!api.error.contains("RowNotFound"));
    }

    #[test]
    fn insufficient_stock_message_is_localized() {
        let store = I18nStore::new();
        let err = AppError::InsufficientStock {
            product: "Kopi Susu".into(),
            available: 2,
            requested: 5,
        };
        let api = err.to_api_error(&Locale("id".into()), &store);
        assert_eq!(api.code, "insufficient_stock");
        assert_eq!(
            api.error,
            "Stok Kopi Susu tidak mencukupi. Stok tersedia: 2, diminta: 5."
        );
    }
}
