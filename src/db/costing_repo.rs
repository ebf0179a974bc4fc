// src/db/costing_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::is_unique_violation, error::AppError},
    models::costing::{CostDetail, CostDetailView, CostRecord, Ingredient, IngredientAttrs},
};

#[derive(Clone)]
pub struct CostingRepository {
    pool: PgPool,
}

impl CostingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Ingredients (bahan), owned by a tenant owner
    // ---

    pub async fn create_ingredient(
        &self,
        owner_id: Uuid,
        attrs: &IngredientAttrs,
    ) -> Result<Ingredient, AppError> {
        let ingredient = sqlx::query_as::<_, Ingredient>(
            r#"
            INSERT INTO ingredients (owner_id, name, unit_price, unit, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(owner_id)
        .bind(&attrs.name)
        .bind(attrs.unit_price)
        .bind(&attrs.unit)
        .bind(&attrs.notes)
        .fetch_one(&self.pool)
        .await?;
        Ok(ingredient)
    }

    /// Active ingredients of an owner, by name.
    pub async fn list_ingredients(&self, owner_id: Uuid) -> Result<Vec<Ingredient>, AppError> {
        let ingredients = sqlx::query_as::<_, Ingredient>(
            "SELECT * FROM ingredients WHERE owner_id = $1 AND is_active ORDER BY name",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ingredients)
    }

    pub async fn update_ingredient(
        &self,
        owner_id: Uuid,
        ingredient_id: Uuid,
        attrs: &IngredientAttrs,
    ) -> Result<Ingredient, AppError> {
        sqlx::query_as::<_, Ingredient>(
            r#"
            UPDATE ingredients
            SET name = $3, unit_price = $4, unit = $5, notes = $6, updated_at = NOW()
            WHERE id = $1 AND owner_id = $2 AND is_active
            RETURNING *
            "#,
        )
        .bind(ingredient_id)
        .bind(owner_id)
        .bind(&attrs.name)
        .bind(attrs.unit_price)
        .bind(&attrs.unit)
        .bind(&attrs.notes)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("ingredient"))
    }

    // Soft delete: past cost details keep pointing at the row.
    pub async fn deactivate_ingredient(
        &self,
        owner_id: Uuid,
        ingredient_id: Uuid,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE ingredients SET is_active = FALSE, updated_at = NOW()
            WHERE id = $1 AND owner_id = $2 AND is_active
            "#,
        )
        .bind(ingredient_id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("ingredient"));
        }
        Ok(())
    }

    /// Active ingredients of `owner_id` among `ids`. Unknown, foreign or
    /// inactive ids are left out.
    pub async fn find_active_ingredients<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        ids: &[Uuid],
    ) -> Result<Vec<Ingredient>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ingredients = sqlx::query_as::<_, Ingredient>(
            "SELECT * FROM ingredients WHERE owner_id = $1 AND id = ANY($2) AND is_active",
        )
        .bind(owner_id)
        .bind(ids)
        .fetch_all(executor)
        .await?;
        Ok(ingredients)
    }

    // ---
    // Cost records (HPP)
    // ---

    /// Inserts the record header with a zero total. A second record for the
    /// same tenant and period loses on the unique index.
    pub async fn create_record<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        period: &str,
        notes: &str,
        created_by: Uuid,
    ) -> Result<CostRecord, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, CostRecord>(
            r#"
            INSERT INTO cost_records (tenant_id, period, total_amount, notes, created_by)
            VALUES ($1, $2, 0, $3, $4)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(period)
        .bind(notes)
        .bind(created_by)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "cost_records_tenant_period_key") {
                AppError::DuplicatePeriod(period.to_string())
            } else {
                e.into()
            }
        })
    }

    pub async fn add_detail<'e, E>(
        &self,
        executor: E,
        cost_record_id: Uuid,
        ingredient_id: Uuid,
        qty: Decimal,
        unit_price: i64,
        subtotal: i64,
    ) -> Result<CostDetail, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let detail = sqlx::query_as::<_, CostDetail>(
            r#"
            INSERT INTO cost_details (cost_record_id, ingredient_id, qty, unit_price, subtotal)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(cost_record_id)
        .bind(ingredient_id)
        .bind(qty)
        .bind(unit_price)
        .bind(subtotal)
        .fetch_one(executor)
        .await?;
        Ok(detail)
    }

    pub async fn set_total<'e, E>(
        &self,
        executor: E,
        cost_record_id: Uuid,
        total_amount: i64,
    ) -> Result<CostRecord, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let record = sqlx::query_as::<_, CostRecord>(
            r#"
            UPDATE cost_records SET total_amount = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(cost_record_id)
        .bind(total_amount)
        .fetch_one(executor)
        .await?;
        Ok(record)
    }

    pub async fn list_records(&self, tenant_id: Uuid) -> Result<Vec<CostRecord>, AppError> {
        let records = sqlx::query_as::<_, CostRecord>(
            "SELECT * FROM cost_records WHERE tenant_id = $1 ORDER BY period DESC",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    /// Most recent `limit` records of a tenant, newest period first.
    pub async fn recent_records(&self, tenant_id: Uuid, limit: i64) -> Result<Vec<CostRecord>, AppError> {
        let records = sqlx::query_as::<_, CostRecord>(
            "SELECT * FROM cost_records WHERE tenant_id = $1 ORDER BY period DESC LIMIT $2",
        )
        .bind(tenant_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    pub async fn find_record(&self, tenant_id: Uuid, record_id: Uuid) -> Result<Option<CostRecord>, AppError> {
        let record = sqlx::query_as::<_, CostRecord>(
            "SELECT * FROM cost_records WHERE id = $1 AND tenant_id = $2",
        )
        .bind(record_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    pub async fn find_record_by_period(
        &self,
        tenant_id: Uuid,
        period: &str,
    ) -> Result<Option<CostRecord>, AppError> {
        let record = sqlx::query_as::<_, CostRecord>(
            "SELECT * FROM cost_records WHERE tenant_id = $1 AND period = $2",
        )
        .bind(tenant_id)
        .bind(period)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    pub async fn list_details(&self, cost_record_id: Uuid) -> Result<Vec<CostDetailView>, AppError> {
        let details = sqlx::query_as::<_, CostDetailView>(
            r#"
            SELECT d.id, d.cost_record_id, d.ingredient_id, d.qty, d.unit_price, d.subtotal,
                   i.name AS ingredient_name, i.unit AS ingredient_unit
            FROM cost_details d
            JOIN ingredients i ON i.id = d.ingredient_id
            WHERE d.cost_record_id = $1
            ORDER BY i.name
            "#,
        )
        .bind(cost_record_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(details)
    }
}
