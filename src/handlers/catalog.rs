// src/handlers/catalog.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, tenancy::TenantContext},
    models::catalog::{Category, Product, ProductAttrs, StockAdjustmentMode, StockMovement},
};

// ---
// Payloads
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPayload {
    #[validate(length(min = 1, max = 100, message = "Category name is required."))]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    pub category_id: Uuid,
    #[validate(length(min = 1, max = 50, message = "SKU is required."))]
    pub sku: String,
    #[validate(length(min = 1, max = 200, message = "Product name is required."))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 0, message = "Price cannot be negative."))]
    pub price: i64,
    #[validate(range(min = 0, message = "Initial stock cannot be negative."))]
    #[serde(default)]
    pub qty: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductPayload {
    pub category_id: Uuid,
    #[validate(length(min = 1, max = 50, message = "SKU is required."))]
    pub sku: String,
    #[validate(length(min = 1, max = 200, message = "Product name is required."))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 0, message = "Price cannot be negative."))]
    pub price: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl From<UpdateProductPayload> for ProductAttrs {
    fn from(p: UpdateProductPayload) -> Self {
        ProductAttrs {
            category_id: p.category_id,
            sku: p.sku,
            name: p.name,
            description: p.description,
            price: p.price,
            is_active: p.is_active,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustmentPayload {
    pub mode: StockAdjustmentMode,
    #[validate(range(min = 0, message = "Amount cannot be negative."))]
    pub amount: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductListQuery {
    /// Only active products with stock left
    #[serde(default)]
    pub orderable: bool,
}

// ---
// Categories
// ---

// POST /api/catalog/categories
#[utoipa::path(
    post,
    path = "/api/catalog/categories",
    tag = "Catalog",
    request_body = CategoryPayload,
    params(("X-Tenant-ID" = Uuid, Header, description = "Tenant")),
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 409, description = "Name already used in this tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_category(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    tenant: TenantContext,
    Json(payload): Json<CategoryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let category = app_state
        .catalog_service
        .create_category(
            &app_state.db_pool,
            &actor,
            tenant.0,
            &payload.name,
            &payload.description,
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(category)))
}

// GET /api/catalog/categories
#[utoipa::path(
    get,
    path = "/api/catalog/categories",
    tag = "Catalog",
    params(("X-Tenant-ID" = Uuid, Header, description = "Tenant")),
    responses((status = 200, description = "Categories of the tenant", body = Vec<Category>)),
    security(("api_jwt" = []))
)]
pub async fn list_categories(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    tenant: TenantContext,
) -> Result<Json<Vec<Category>>, ApiError> {
    let categories = app_state
        .catalog_service
        .list_categories(&app_state.db_pool, &actor, tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(categories))
}

// PUT /api/catalog/categories/{id}
#[utoipa::path(
    put,
    path = "/api/catalog/categories/{id}",
    tag = "Catalog",
    request_body = CategoryPayload,
    params(
        ("id" = Uuid, Path, description = "Category id"),
        ("X-Tenant-ID" = Uuid, Header, description = "Tenant")
    ),
    responses(
        (status = 200, description = "Category updated", body = Category),
        (status = 404, description = "No such category")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_category(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    tenant: TenantContext,
    Path(category_id): Path<Uuid>,
    Json(payload): Json<CategoryPayload>,
) -> Result<Json<Category>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let category = app_state
        .catalog_service
        .update_category(
            &app_state.db_pool,
            &actor,
            tenant.0,
            category_id,
            &payload.name,
            &payload.description,
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(category))
}

// DELETE /api/catalog/categories/{id}
#[utoipa::path(
    delete,
    path = "/api/catalog/categories/{id}",
    tag = "Catalog",
    params(
        ("id" = Uuid, Path, description = "Category id"),
        ("X-Tenant-ID" = Uuid, Header, description = "Tenant")
    ),
    responses(
        (status = 204, description = "Category and its products deleted"),
        (status = 404, description = "No such category"),
        (status = 409, description = "A product in the category has orders")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_category(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    tenant: TenantContext,
    Path(category_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .catalog_service
        .delete_category(&app_state.db_pool, &actor, tenant.0, category_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// ---
// Products
// ---

// POST /api/catalog/products
#[utoipa::path(
    post,
    path = "/api/catalog/products",
    tag = "Catalog",
    request_body = CreateProductPayload,
    params(("X-Tenant-ID" = Uuid, Header, description = "Tenant")),
    responses(
        (status = 201, description = "Product created", body = Product),
        (status = 404, description = "Category not in this tenant"),
        (status = 409, description = "SKU already used in this tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    tenant: TenantContext,
    Json(payload): Json<CreateProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let initial_qty = payload.qty;
    let attrs = ProductAttrs {
        category_id: payload.category_id,
        sku: payload.sku,
        name: payload.name,
        description: payload.description,
        price: payload.price,
        is_active: payload.is_active,
    };

    let product = app_state
        .catalog_service
        .create_product(&app_state.db_pool, &actor, tenant.0, &attrs, initial_qty)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(product)))
}

// GET /api/catalog/products
#[utoipa::path(
    get,
    path = "/api/catalog/products",
    tag = "Catalog",
    params(
        ProductListQuery,
        ("X-Tenant-ID" = Uuid, Header, description = "Tenant")
    ),
    responses((status = 200, description = "Products of the tenant", body = Vec<Product>)),
    security(("api_jwt" = []))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    tenant: TenantContext,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = app_state
        .catalog_service
        .list_products(&app_state.db_pool, &actor, tenant.0, query.orderable)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(products))
}

// GET /api/catalog/products/{id}
#[utoipa::path(
    get,
    path = "/api/catalog/products/{id}",
    tag = "Catalog",
    params(
        ("id" = Uuid, Path, description = "Product id"),
        ("X-Tenant-ID" = Uuid, Header, description = "Tenant")
    ),
    responses(
        (status = 200, description = "Product", body = Product),
        (status = 404, description = "No such product")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_product(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    tenant: TenantContext,
    Path(product_id): Path<Uuid>,
) -> Result<Json<Product>, ApiError> {
    let product = app_state
        .catalog_service
        .get_product(&app_state.db_pool, &actor, tenant.0, product_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(product))
}

// PUT /api/catalog/products/{id}
#[utoipa::path(
    put,
    path = "/api/catalog/products/{id}",
    tag = "Catalog",
    request_body = UpdateProductPayload,
    params(
        ("id" = Uuid, Path, description = "Product id"),
        ("X-Tenant-ID" = Uuid, Header, description = "Tenant")
    ),
    responses(
        (status = 200, description = "Product updated", body = Product),
        (status = 404, description = "No such product or category"),
        (status = 409, description = "SKU already used in this tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    tenant: TenantContext,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<UpdateProductPayload>,
) -> Result<Json<Product>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let product = app_state
        .catalog_service
        .update_product(&app_state.db_pool, &actor, tenant.0, product_id, &payload.into())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(product))
}

// DELETE /api/catalog/products/{id}
#[utoipa::path(
    delete,
    path = "/api/catalog/products/{id}",
    tag = "Catalog",
    params(
        ("id" = Uuid, Path, description = "Product id"),
        ("X-Tenant-ID" = Uuid, Header, description = "Tenant")
    ),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "No such product"),
        (status = 409, description = "Product has orders")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_product(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    tenant: TenantContext,
    Path(product_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .catalog_service
        .delete_product(&app_state.db_pool, &actor, tenant.0, product_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// ---
// Stock
// ---

// POST /api/catalog/products/{id}/stock
#[utoipa::path(
    post,
    path = "/api/catalog/products/{id}/stock",
    tag = "Catalog",
    request_body = StockAdjustmentPayload,
    params(
        ("id" = Uuid, Path, description = "Product id"),
        ("X-Tenant-ID" = Uuid, Header, description = "Tenant")
    ),
    responses(
        (status = 200, description = "Stock adjusted", body = Product),
        (status = 404, description = "No such product"),
        (status = 422, description = "Reduction larger than the stock")
    ),
    security(("api_jwt" = []))
)]
pub async fn adjust_stock(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    tenant: TenantContext,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<StockAdjustmentPayload>,
) -> Result<Json<Product>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let product = app_state
        .catalog_service
        .adjust_stock(
            &app_state.db_pool,
            &actor,
            tenant.0,
            product_id,
            payload.mode,
            payload.amount,
            payload.notes.as_deref(),
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(product))
}

// GET /api/catalog/products/{id}/stock
#[utoipa::path(
    get,
    path = "/api/catalog/products/{id}/stock",
    tag = "Catalog",
    params(
        ("id" = Uuid, Path, description = "Product id"),
        ("X-Tenant-ID" = Uuid, Header, description = "Tenant")
    ),
    responses((status = 200, description = "Stock movements, newest first", body = Vec<StockMovement>)),
    security(("api_jwt" = []))
)]
pub async fn stock_history(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    tenant: TenantContext,
    Path(product_id): Path<Uuid>,
) -> Result<Json<Vec<StockMovement>>, ApiError> {
    let movements = app_state
        .catalog_service
        .stock_history(&app_state.db_pool, &actor, tenant.0, product_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(movements))
}
