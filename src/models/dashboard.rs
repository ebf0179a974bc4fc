// src/models/dashboard.rs

use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::models::{catalog::Product, orders::Order};

/// Stock at or below this is flagged on the dashboard.
pub const LOW_STOCK_THRESHOLD: i32 = 5;

// Aggregates over every tenant the actor can see.
#[derive(Debug, Default, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardCounts {
    pub total_tenants: i64,
    pub total_products: i64,
    pub total_orders: i64,
    pub total_revenue: i64,
}

#[derive(Debug, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    #[serde(flatten)]
    pub counts: DashboardCounts,
    // Only filled for platform owners: how many clients they created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_clients: Option<i64>,
    pub recent_orders: Vec<Order>,
    pub low_stock_products: Vec<Product>,
}
