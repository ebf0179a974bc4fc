// src/handlers/auth.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::auth::{
        AuthResponse, CreateCrewPayload, CreateTenantOwnerPayload, LoginUserPayload, Role, User,
    },
};

// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginUserPayload,
    responses(
        (status = 200, description = "Token issued", body = AuthResponse),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Wrong username or password")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<LoginUserPayload>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let token = app_state
        .auth_service
        .login_user(&payload.username, &payload.password)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(AuthResponse { token }))
}

// GET /api/users/me
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Not authenticated")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_me(AuthenticatedUser(user): AuthenticatedUser) -> Json<User> {
    Json(user)
}

// POST /api/users/clients
#[utoipa::path(
    post,
    path = "/api/users/clients",
    tag = "Users",
    request_body = CreateTenantOwnerPayload,
    responses(
        (status = 201, description = "Client created", body = User),
        (status = 403, description = "Only platform owners create clients"),
        (status = 409, description = "Username taken")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_client(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(payload): Json<CreateTenantOwnerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let user = app_state
        .auth_service
        .create_tenant_owner(&app_state.db_pool, &actor, payload.into())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(user)))
}

// POST /api/users/crew
#[utoipa::path(
    post,
    path = "/api/users/crew",
    tag = "Users",
    request_body = CreateCrewPayload,
    responses(
        (status = 201, description = "Crew member created", body = User),
        (status = 403, description = "Only tenant owners create crew"),
        (status = 409, description = "Username taken")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_crew(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(payload): Json<CreateCrewPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let user = app_state
        .auth_service
        .create_crew(&app_state.db_pool, &actor, payload.into())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(user)))
}

// GET /api/users/clients
#[utoipa::path(
    get,
    path = "/api/users/clients",
    tag = "Users",
    responses(
        (status = 200, description = "Clients created by the caller", body = Vec<User>),
        (status = 403, description = "Caller is not a platform owner")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_clients(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> Result<Json<Vec<User>>, ApiError> {
    let users = app_state
        .auth_service
        .list_created_users(&actor, Role::TenantOwner)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(users))
}

// GET /api/users/crew
#[utoipa::path(
    get,
    path = "/api/users/crew",
    tag = "Users",
    responses(
        (status = 200, description = "Crew created by the caller", body = Vec<User>),
        (status = 403, description = "Caller is not a tenant owner")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_crew(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> Result<Json<Vec<User>>, ApiError> {
    let users = app_state
        .auth_service
        .list_created_users(&actor, Role::CrewWorker)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(users))
}

// DELETE /api/users/{id}
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User to delete")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Caller did not create this user"),
        (status = 404, description = "No such user")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_user(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .auth_service
        .delete_user(&app_state.db_pool, &actor, user_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
