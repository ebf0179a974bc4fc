// src/db/analytics_repo.rs

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        analytics::{CustomerBreakdown, DailyRevenue, TopProduct},
        catalog::Product,
        dashboard::DashboardCounts,
        orders::Order,
    },
};

// Read-only aggregates. Every query takes the list of tenant ids it may
// look at; the service decides which tenants those are.
#[derive(Clone)]
pub struct AnalyticsRepository {
    pool: PgPool,
}

impl AnalyticsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // 1. Revenue and order count per UTC day
    pub async fn daily_revenue(
        &self,
        tenant_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<DailyRevenue>, AppError> {
        let rows = sqlx::query_as::<_, DailyRevenue>(
            r#"
            SELECT (created_at AT TIME ZONE 'UTC')::date AS day,
                   COALESCE(SUM(total_amount), 0)::BIGINT AS revenue,
                   COUNT(*) AS order_count
            FROM orders
            WHERE tenant_id = $1 AND created_at >= $2
            GROUP BY day
            ORDER BY day
            "#,
        )
        .bind(tenant_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // 2. Best sellers, valued at the snapshot prices
    pub async fn top_products(
        &self,
        tenant_id: Uuid,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<TopProduct>, AppError> {
        let rows = sqlx::query_as::<_, TopProduct>(
            r#"
            SELECT p.name AS product_name,
                   SUM(i.qty)::BIGINT AS total_qty,
                   SUM(i.qty::BIGINT * i.unit_price)::BIGINT AS total_revenue
            FROM order_items i
            JOIN orders o ON o.id = i.order_id
            JOIN products p ON p.id = i.product_id
            WHERE o.tenant_id = $1 AND o.created_at >= $2
            GROUP BY p.id, p.name
            ORDER BY total_revenue DESC, total_qty DESC
            LIMIT $3
            "#,
        )
        .bind(tenant_id)
        .bind(since)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // 3. Best customers. Anonymous orders are not a customer.
    pub async fn customer_breakdown(
        &self,
        tenant_id: Uuid,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<CustomerBreakdown>, AppError> {
        let rows = sqlx::query_as::<_, CustomerBreakdown>(
            r#"
            SELECT customer_name,
                   customer_phone,
                   COUNT(*) AS order_count,
                   COALESCE(SUM(total_amount), 0)::BIGINT AS total_spent
            FROM orders
            WHERE tenant_id = $1
              AND created_at >= $2
              AND customer_name IS NOT NULL
              AND customer_name <> ''
            GROUP BY customer_name, customer_phone
            ORDER BY total_spent DESC
            LIMIT $3
            "#,
        )
        .bind(tenant_id)
        .bind(since)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Sum of order totals with `created_at` in `[start, end)`.
    pub async fn revenue_between(
        &self,
        tenant_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        let revenue: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(total_amount), 0)::BIGINT
            FROM orders
            WHERE tenant_id = $1 AND created_at >= $2 AND created_at < $3
            "#,
        )
        .bind(tenant_id)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;
        Ok(revenue)
    }

    // --- Dashboard ---

    pub async fn counts(&self, tenant_ids: &[Uuid]) -> Result<DashboardCounts, AppError> {
        let counts = sqlx::query_as::<_, DashboardCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM tenants WHERE id = ANY($1)) AS total_tenants,
                (SELECT COUNT(*) FROM products WHERE tenant_id = ANY($1)) AS total_products,
                (SELECT COUNT(*) FROM orders WHERE tenant_id = ANY($1)) AS total_orders,
                (SELECT COALESCE(SUM(total_amount), 0)::BIGINT FROM orders WHERE tenant_id = ANY($1)) AS total_revenue
            "#,
        )
        .bind(tenant_ids)
        .fetch_one(&self.pool)
        .await?;
        Ok(counts)
    }

    pub async fn recent_orders(&self, tenant_ids: &[Uuid], limit: i64) -> Result<Vec<Order>, AppError> {
        let orders = sqlx::query_as::<_, Order>(
            "SELECT * FROM orders WHERE tenant_id = ANY($1) ORDER BY created_at DESC LIMIT $2",
        )
        .bind(tenant_ids)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    pub async fn low_stock_products(
        &self,
        tenant_ids: &[Uuid],
        threshold: i32,
        limit: i64,
    ) -> Result<Vec<Product>, AppError> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE tenant_id = ANY($1) AND is_active AND qty <= $2
            ORDER BY qty, name
            LIMIT $3
            "#,
        )
        .bind(tenant_ids)
        .bind(threshold)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }
}
