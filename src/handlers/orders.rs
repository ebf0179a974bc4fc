// src/handlers/orders.rs

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
    middleware::{auth::AuthenticatedUser, i18n::Locale, tenancy::TenantContext},
    models::orders::{CustomerInfo, Order, OrderDetail, OrderLineRequest, OrderReceipt},
};

// ---
// Payloads
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderLinePayload {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be at least 1."))]
    pub qty: i32,
}

// An empty `items` list passes validation and is refused by the ledger.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderPayload {
    #[validate(length(max = 200))]
    pub customer_name: Option<String>,
    #[validate(length(max = 15))]
    pub customer_phone: Option<String>,
    #[validate(length(max = 500))]
    pub customer_address: Option<String>,
    #[validate(nested)]
    #[serde(default)]
    pub items: Vec<OrderLinePayload>,
}

impl CreateOrderPayload {
    fn customer(&self) -> CustomerInfo {
        CustomerInfo {
            name: self.customer_name.clone(),
            phone: self.customer_phone.clone(),
            address: self.customer_address.clone(),
        }
    }

    fn lines(&self) -> Vec<OrderLineRequest> {
        self.items
            .iter()
            .map(|line| OrderLineRequest {
                product_id: line.product_id,
                qty: line.qty,
            })
            .collect()
    }
}

// ---
// Handlers
// ---

// POST /api/orders
#[utoipa::path(
    post,
    path = "/api/orders",
    tag = "Orders",
    request_body = CreateOrderPayload,
    params(("X-Tenant-ID" = Uuid, Header, description = "Tenant")),
    responses(
        (status = 201, description = "Order committed and stock taken", body = OrderReceipt),
        (status = 400, description = "Invalid payload or no lines"),
        (status = 404, description = "Product not in this tenant"),
        (status = 422, description = "Not enough stock")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_order(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    tenant: TenantContext,
    Json(payload): Json<CreateOrderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let receipt = app_state
        .order_service
        .commit_order(
            &app_state.db_pool,
            &actor,
            tenant.0,
            &payload.customer(),
            &payload.lines(),
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(receipt)))
}

// GET /api/orders
#[utoipa::path(
    get,
    path = "/api/orders",
    tag = "Orders",
    params(("X-Tenant-ID" = Uuid, Header, description = "Tenant")),
    responses((status = 200, description = "Orders of the tenant, newest first", body = Vec<Order>)),
    security(("api_jwt" = []))
)]
pub async fn list_orders(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    tenant: TenantContext,
) -> Result<Json<Vec<Order>>, ApiError> {
    let orders = app_state
        .order_service
        .list_orders(&app_state.db_pool, &actor, tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(orders))
}

// GET /api/orders/{id}
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    tag = "Orders",
    params(
        ("id" = Uuid, Path, description = "Order id"),
        ("X-Tenant-ID" = Uuid, Header, description = "Tenant")
    ),
    responses(
        (status = 200, description = "Order with its lines", body = OrderDetail),
        (status = 404, description = "No such order")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_order(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    tenant: TenantContext,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderDetail>, ApiError> {
    let detail = app_state
        .order_service
        .order_detail(&app_state.db_pool, &actor, tenant.0, order_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(detail))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_quantity_lines_fail_validation() {
        let payload: CreateOrderPayload = serde_json::from_value(serde_json::json!({
            "customerName": "Budi",
            "items": [
                { "productId": Uuid::new_v4(), "qty": 2 },
                { "productId": Uuid::new_v4(), "qty": 0 }
            ]
        }))
        .unwrap();

        assert!(payload.validate().is_err());
    }

    #[test]
    fn customer_fields_fit_their_columns() {
        let payload = |phone: &str, address: String| -> CreateOrderPayload {
            serde_json::from_value(serde_json::json!({
                "customerPhone": phone,
                "customerAddress": address,
                "items": [{ "productId": Uuid::new_v4(), "qty": 1 }]
            }))
            .unwrap()
        };

        assert!(payload("081234567890123", "a".repeat(500)).validate().is_ok());

        let errors = payload("0812345678901234", "a".repeat(501))
            .validate()
            .unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("customer_phone"));
        assert!(fields.contains_key("customer_address"));
    }

    #[test]
    fn lines_keep_request_order() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let payload: CreateOrderPayload = serde_json::from_value(serde_json::json!({
            "items": [
                { "productId": b, "qty": 1 },
                { "productId": a, "qty": 3 }
            ]
        }))
        .unwrap();

        assert!(payload.validate().is_ok());
        let lines = payload.lines();
        assert_eq!(lines[0], OrderLineRequest { product_id: b, qty: 1 });
        assert_eq!(lines[1], OrderLineRequest { product_id: a, qty: 3 });
        assert!(payload.customer().name.is_none());
    }
}
