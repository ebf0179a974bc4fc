// src/handlers/costing.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, tenancy::TenantContext},
    models::costing::{
        CostLineRequest, CostRecord, CostRecordDetail, CostRecordReceipt, Ingredient,
        IngredientAttrs, Period,
    },
};

// Checked after rounding to the stored NUMERIC(10,2) scale.
fn validate_cost_qty(val: &Decimal) -> Result<(), ValidationError> {
    let stored = val.round_dp(2);
    if stored <= Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("Quantity must be greater than zero.".into());
        return Err(err);
    }
    if stored >= Decimal::from(100_000_000) {
        let mut err = ValidationError::new("range");
        err.add_param("max".into(), &99_999_999.99);
        err.message = Some("Quantity must be less than 100000000.".into());
        return Err(err);
    }
    Ok(())
}

// ---
// Payloads
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngredientPayload {
    #[validate(length(min = 1, max = 100, message = "Ingredient name is required."))]
    pub name: String,
    #[validate(range(min = 0, message = "Price cannot be negative."))]
    pub unit_price: i64,
    #[validate(length(min = 1, max = 20, message = "Unit is required."))]
    pub unit: String,
    #[serde(default)]
    pub notes: String,
}

impl From<IngredientPayload> for IngredientAttrs {
    fn from(p: IngredientPayload) -> Self {
        IngredientAttrs {
            name: p.name,
            unit_price: p.unit_price,
            unit: p.unit,
            notes: p.notes,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CostLinePayload {
    pub ingredient_id: Uuid,
    #[validate(custom(function = "validate_cost_qty"))]
    #[schema(value_type = f64, example = 2.5)]
    pub qty: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCostRecordPayload {
    /// Month as YYYY-MM
    #[schema(example = "2024-01")]
    pub period: String,
    #[serde(default)]
    pub notes: String,
    #[validate(nested)]
    #[serde(default)]
    pub details: Vec<CostLinePayload>,
}

impl CreateCostRecordPayload {
    fn lines(&self) -> Vec<CostLineRequest> {
        self.details
            .iter()
            // stored as NUMERIC(10,2)
            .map(|line| CostLineRequest {
                ingredient_id: line.ingredient_id,
                qty: line.qty.round_dp(2),
            })
            .collect()
    }
}

// ---
// Ingredients
// ---

// POST /api/costing/ingredients
#[utoipa::path(
    post,
    path = "/api/costing/ingredients",
    tag = "Costing",
    request_body = IngredientPayload,
    responses(
        (status = 201, description = "Ingredient created", body = Ingredient),
        (status = 403, description = "Only tenant owners keep ingredients")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_ingredient(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(payload): Json<IngredientPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let ingredient = app_state
        .costing_service
        .create_ingredient(&actor, &payload.into())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(ingredient)))
}

// GET /api/costing/ingredients
#[utoipa::path(
    get,
    path = "/api/costing/ingredients",
    tag = "Costing",
    responses((status = 200, description = "Active ingredients of the caller", body = Vec<Ingredient>)),
    security(("api_jwt" = []))
)]
pub async fn list_ingredients(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> Result<Json<Vec<Ingredient>>, ApiError> {
    let ingredients = app_state
        .costing_service
        .list_ingredients(&actor)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ingredients))
}

// PUT /api/costing/ingredients/{id}
#[utoipa::path(
    put,
    path = "/api/costing/ingredients/{id}",
    tag = "Costing",
    request_body = IngredientPayload,
    params(("id" = Uuid, Path, description = "Ingredient id")),
    responses(
        (status = 200, description = "Ingredient updated", body = Ingredient),
        (status = 404, description = "No such ingredient")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_ingredient(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(ingredient_id): Path<Uuid>,
    Json(payload): Json<IngredientPayload>,
) -> Result<Json<Ingredient>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let ingredient = app_state
        .costing_service
        .update_ingredient(&actor, ingredient_id, &payload.into())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ingredient))
}

// DELETE /api/costing/ingredients/{id}
#[utoipa::path(
    delete,
    path = "/api/costing/ingredients/{id}",
    tag = "Costing",
    params(("id" = Uuid, Path, description = "Ingredient id")),
    responses(
        (status = 204, description = "Ingredient deactivated"),
        (status = 404, description = "No such ingredient")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_ingredient(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(ingredient_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .costing_service
        .delete_ingredient(&actor, ingredient_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// ---
// Cost records
// ---

// POST /api/costing/records
#[utoipa::path(
    post,
    path = "/api/costing/records",
    tag = "Costing",
    request_body = CreateCostRecordPayload,
    params(("X-Tenant-ID" = Uuid, Header, description = "Tenant")),
    responses(
        (status = 201, description = "Cost record committed", body = CostRecordReceipt),
        (status = 400, description = "Invalid period, quantity or no lines"),
        (status = 404, description = "Ingredient not available"),
        (status = 409, description = "Period already recorded for this tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_cost_record(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    tenant: TenantContext,
    Json(payload): Json<CreateCostRecordPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let period: Period = payload
        .period
        .parse()
        .map_err(|e: AppError| e.to_api_error(&locale, &app_state.i18n_store))?;

    let receipt = app_state
        .costing_service
        .commit_cost_record(
            &app_state.db_pool,
            &actor,
            tenant.0,
            period,
            &payload.notes,
            &payload.lines(),
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(receipt)))
}

// GET /api/costing/records
#[utoipa::path(
    get,
    path = "/api/costing/records",
    tag = "Costing",
    params(("X-Tenant-ID" = Uuid, Header, description = "Tenant")),
    responses((status = 200, description = "Cost records, latest period first", body = Vec<CostRecord>)),
    security(("api_jwt" = []))
)]
pub async fn list_cost_records(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    tenant: TenantContext,
) -> Result<Json<Vec<CostRecord>>, ApiError> {
    let records = app_state
        .costing_service
        .list_records(&app_state.db_pool, &actor, tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(records))
}

// GET /api/costing/records/{id}
#[utoipa::path(
    get,
    path = "/api/costing/records/{id}",
    tag = "Costing",
    params(
        ("id" = Uuid, Path, description = "Cost record id"),
        ("X-Tenant-ID" = Uuid, Header, description = "Tenant")
    ),
    responses(
        (status = 200, description = "Cost record with its lines", body = CostRecordDetail),
        (status = 404, description = "No such cost record")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_cost_record(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    tenant: TenantContext,
    Path(record_id): Path<Uuid>,
) -> Result<Json<CostRecordDetail>, ApiError> {
    let detail = app_state
        .costing_service
        .record_detail(&app_state.db_pool, &actor, tenant.0, record_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(detail))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn quantities_must_be_positive() {
        assert!(validate_cost_qty(&Decimal::from_str("0.5").unwrap()).is_ok());
        assert!(validate_cost_qty(&Decimal::ZERO).is_err());
        assert!(validate_cost_qty(&Decimal::from_str("-1").unwrap()).is_err());
        assert!(validate_cost_qty(&Decimal::from_str("0.004").unwrap()).is_err());
    }

    #[test]
    fn quantities_must_fit_the_stored_scale() {
        assert!(validate_cost_qty(&Decimal::from_str("99999999.99").unwrap()).is_ok());
        assert!(validate_cost_qty(&Decimal::from_str("99999999.999").unwrap()).is_err());
        assert!(validate_cost_qty(&Decimal::from(1_000_000_000)).is_err());
    }

    #[test]
    fn nested_lines_are_validated() {
        let payload: CreateCostRecordPayload = serde_json::from_value(serde_json::json!({
            "period": "2024-01",
            "details": [{ "ingredientId": Uuid::new_v4(), "qty": 0 }]
        }))
        .unwrap();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn oversized_lines_are_rejected_before_storage() {
        let payload: CreateCostRecordPayload = serde_json::from_value(serde_json::json!({
            "period": "2024-01",
            "details": [{ "ingredientId": Uuid::new_v4(), "qty": 1_000_000_000 }]
        }))
        .unwrap();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn ingredient_fields_fit_their_columns() {
        let ingredient = |name: String, unit: String| IngredientPayload {
            name,
            unit_price: 1500,
            unit,
            notes: String::new(),
        };
        assert!(ingredient("a".repeat(100), "u".repeat(20)).validate().is_ok());

        let errors = ingredient("a".repeat(101), "u".repeat(21))
            .validate()
            .unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("unit"));
    }
}
