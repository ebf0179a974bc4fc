// src/handlers/tenancy.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::tenancy::{Tenant, TenantAccess, TenantAccessEntry, TenantAttrs},
};

// ---
// Payloads
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTenantPayload {
    #[validate(length(min = 1, max = 200, message = "Tenant name is required."))]
    pub name: String,
    #[validate(length(min = 1, message = "Address is required."))]
    pub address: String,
    #[validate(length(min = 1, max = 15, message = "Phone must have 1 to 15 characters."))]
    pub phone: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTenantPayload {
    #[validate(length(min = 1, max = 200, message = "Tenant name is required."))]
    pub name: String,
    #[validate(length(min = 1, message = "Address is required."))]
    pub address: String,
    #[validate(length(min = 1, max = 15, message = "Phone must have 1 to 15 characters."))]
    pub phone: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrantAccessPayload {
    pub crew_id: Uuid,
}

// ---
// Handlers
// ---

// POST /api/tenants
#[utoipa::path(
    post,
    path = "/api/tenants",
    tag = "Tenants",
    request_body = CreateTenantPayload,
    responses(
        (status = 201, description = "Tenant created", body = Tenant),
        (status = 403, description = "Caller cannot own tenants"),
        (status = 422, description = "Tenant quota reached")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_tenant(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(payload): Json<CreateTenantPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let attrs = TenantAttrs {
        name: payload.name,
        address: payload.address,
        phone: payload.phone,
        is_active: true,
    };

    let tenant = app_state
        .tenant_service
        .create_tenant(&app_state.db_pool, &actor, &attrs)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(tenant)))
}

// GET /api/tenants
#[utoipa::path(
    get,
    path = "/api/tenants",
    tag = "Tenants",
    responses((status = 200, description = "Tenants the caller can work on", body = Vec<Tenant>)),
    security(("api_jwt" = []))
)]
pub async fn list_my_tenants(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> Result<Json<Vec<Tenant>>, ApiError> {
    let tenants = app_state
        .tenant_service
        .list_accessible_tenants(&actor)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(tenants))
}

// PUT /api/tenants/{id}
#[utoipa::path(
    put,
    path = "/api/tenants/{id}",
    tag = "Tenants",
    params(("id" = Uuid, Path, description = "Tenant id")),
    request_body = UpdateTenantPayload,
    responses(
        (status = 200, description = "Tenant updated", body = Tenant),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "No such tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_tenant(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(tenant_id): Path<Uuid>,
    Json(payload): Json<UpdateTenantPayload>,
) -> Result<Json<Tenant>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let attrs = TenantAttrs {
        name: payload.name,
        address: payload.address,
        phone: payload.phone,
        is_active: payload.is_active,
    };

    let tenant = app_state
        .tenant_service
        .update_tenant(&app_state.db_pool, &actor, tenant_id, &attrs)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(tenant))
}

// DELETE /api/tenants/{id}
#[utoipa::path(
    delete,
    path = "/api/tenants/{id}",
    tag = "Tenants",
    params(("id" = Uuid, Path, description = "Tenant id")),
    responses(
        (status = 204, description = "Tenant and everything in it deleted"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "No such tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_tenant(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(tenant_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .tenant_service
        .delete_tenant(&app_state.db_pool, &actor, tenant_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// POST /api/tenants/{id}/access
#[utoipa::path(
    post,
    path = "/api/tenants/{id}/access",
    tag = "Tenants",
    params(("id" = Uuid, Path, description = "Tenant id")),
    request_body = GrantAccessPayload,
    responses(
        (status = 201, description = "Access granted", body = TenantAccess),
        (status = 409, description = "Already granted"),
        (status = 422, description = "User is not the owner's crew")
    ),
    security(("api_jwt" = []))
)]
pub async fn grant_access(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(tenant_id): Path<Uuid>,
    Json(payload): Json<GrantAccessPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let access = app_state
        .tenant_service
        .grant_access(&app_state.db_pool, &actor, tenant_id, payload.crew_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(access)))
}

// GET /api/tenants/{id}/access
#[utoipa::path(
    get,
    path = "/api/tenants/{id}/access",
    tag = "Tenants",
    params(("id" = Uuid, Path, description = "Tenant id")),
    responses((status = 200, description = "Crew with access", body = Vec<TenantAccessEntry>)),
    security(("api_jwt" = []))
)]
pub async fn list_accesses(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(tenant_id): Path<Uuid>,
) -> Result<Json<Vec<TenantAccessEntry>>, ApiError> {
    let entries = app_state
        .tenant_service
        .list_accesses(&app_state.db_pool, &actor, tenant_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(entries))
}

// DELETE /api/tenants/{id}/access/{access_id}
#[utoipa::path(
    delete,
    path = "/api/tenants/{id}/access/{access_id}",
    tag = "Tenants",
    params(
        ("id" = Uuid, Path, description = "Tenant id"),
        ("access_id" = Uuid, Path, description = "Grant id")
    ),
    responses(
        (status = 204, description = "Access revoked"),
        (status = 404, description = "No such grant on this tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn revoke_access(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path((tenant_id, access_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    app_state
        .tenant_service
        .revoke_access(&app_state.db_pool, &actor, tenant_id, access_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
