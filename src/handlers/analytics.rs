// src/handlers/analytics.rs

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, tenancy::TenantContext},
    models::{analytics::TenantAnalytics, costing::Period},
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AnalyticsQuery {
    /// Month as YYYY-MM; restricts the margin list to that month
    pub period: Option<String>,
}

// GET /api/analytics
#[utoipa::path(
    get,
    path = "/api/analytics",
    tag = "Analytics",
    params(
        AnalyticsQuery,
        ("X-Tenant-ID" = Uuid, Header, description = "Tenant")
    ),
    responses(
        (status = 200, description = "Revenue, best sellers, customers and margins", body = TenantAnalytics),
        (status = 400, description = "Malformed period"),
        (status = 403, description = "No access to the tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_tenant_analytics(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    tenant: TenantContext,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<TenantAnalytics>, ApiError> {
    // an empty ?period= means no filter
    let period = query
        .period
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::parse::<Period>)
        .transpose()
        .map_err(|e: AppError| e.to_api_error(&locale, &app_state.i18n_store))?;

    let report = app_state
        .analytics_service
        .tenant_analytics(&app_state.db_pool, &actor, tenant.0, period)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(report))
}
