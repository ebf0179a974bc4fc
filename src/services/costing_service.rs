// src/services/costing_service.rs

use std::collections::HashMap;

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::CostingRepository,
    models::{
        auth::{Capability, User},
        costing::{
            CostLineRequest, CostRecord, CostRecordDetail, CostRecordReceipt, Ingredient,
            IngredientAttrs, Period,
        },
    },
    services::{
        access::{require_capability, AccessGuard},
        ledger::{cost_subtotal, LedgerTally},
    },
};

#[derive(Clone)]
pub struct CostingService {
    costing_repo: CostingRepository,
    access: AccessGuard,
}

impl CostingService {
    pub fn new(costing_repo: CostingRepository, access: AccessGuard) -> Self {
        Self { costing_repo, access }
    }

    // --- Ingredients ---
    // Ingredients belong to the tenant owner, not to a tenant.

    pub async fn create_ingredient(&self, actor: &User, attrs: &IngredientAttrs) -> Result<Ingredient, AppError> {
        require_capability(actor, Capability::ManageCosting)?;
        self.costing_repo.create_ingredient(actor.id, attrs).await
    }

    pub async fn list_ingredients(&self, actor: &User) -> Result<Vec<Ingredient>, AppError> {
        require_capability(actor, Capability::ManageCosting)?;
        self.costing_repo.list_ingredients(actor.id).await
    }

    pub async fn update_ingredient(
        &self,
        actor: &User,
        ingredient_id: Uuid,
        attrs: &IngredientAttrs,
    ) -> Result<Ingredient, AppError> {
        require_capability(actor, Capability::ManageCosting)?;
        self.costing_repo
            .update_ingredient(actor.id, ingredient_id, attrs)
            .await
    }

    pub async fn delete_ingredient(&self, actor: &User, ingredient_id: Uuid) -> Result<(), AppError> {
        require_capability(actor, Capability::ManageCosting)?;
        self.costing_repo
            .deactivate_ingredient(actor.id, ingredient_id)
            .await
    }

    // --- Cost records (HPP) ---

    /// Records the cost of goods of one tenant for one month. Each line
    /// snapshots the ingredient price; the total is the sum of the
    /// truncated line subtotals and is written once at the end.
    pub async fn commit_cost_record<'e, E>(
        &self,
        executor: E,
        actor: &User,
        tenant_id: Uuid,
        period: Period,
        notes: &str,
        lines: &[CostLineRequest],
    ) -> Result<CostRecordReceipt, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        require_capability(actor, Capability::ManageCosting)?;

        let mut tx = executor.begin().await?;

        let tenant = self
            .access
            .require_tenant(&mut *tx, actor, tenant_id, Capability::ManageCosting)
            .await?;

        // 1. Price list of the owner's active ingredients used here
        let mut ids: Vec<Uuid> = lines.iter().map(|l| l.ingredient_id).collect();
        ids.sort_unstable();
        ids.dedup();
        let ingredients: HashMap<Uuid, Ingredient> = self
            .costing_repo
            .find_active_ingredients(&mut *tx, tenant.owner_id, &ids)
            .await?
            .into_iter()
            .map(|i| (i.id, i))
            .collect();

        // 2. Header; a second record for the period fails here
        let period_key = period.to_string();
        let record = self
            .costing_repo
            .create_record(&mut *tx, tenant_id, &period_key, notes, actor.id)
            .await
            .inspect_err(|e| {
                if matches!(e, AppError::DuplicatePeriod(_)) {
                    tracing::warn!(%tenant_id, period = %period_key, "duplicate cost record");
                }
            })?;

        // 3. Detail lines
        let mut tally = LedgerTally::default();
        let mut details = Vec::with_capacity(lines.len());
        for line in lines {
            let ingredient = ingredients
                .get(&line.ingredient_id)
                .ok_or(AppError::NotFound("ingredient"))?;
            let subtotal = cost_subtotal(line.qty, ingredient.unit_price)?;

            let detail = self
                .costing_repo
                .add_detail(&mut *tx, record.id, ingredient.id, line.qty, ingredient.unit_price, subtotal)
                .await?;
            tally.add(subtotal)?;
            details.push(detail);
        }

        // 4. Total, once
        let total = tally.finish(AppError::EmptyCostRecord)?;
        let record = self.costing_repo.set_total(&mut *tx, record.id, total).await?;

        tx.commit().await?;

        tracing::info!(
            cost_record_id = %record.id,
            %tenant_id,
            period = %record.period,
            total = record.total_amount,
            "cost record committed"
        );
        Ok(CostRecordReceipt { record, details })
    }

    pub async fn list_records<'e, E>(
        &self,
        executor: E,
        actor: &User,
        tenant_id: Uuid,
    ) -> Result<Vec<CostRecord>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.access
            .require_tenant(executor, actor, tenant_id, Capability::ManageCosting)
            .await?;
        self.costing_repo.list_records(tenant_id).await
    }

    pub async fn record_detail<'e, E>(
        &self,
        executor: E,
        actor: &User,
        tenant_id: Uuid,
        record_id: Uuid,
    ) -> Result<CostRecordDetail, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.access
            .require_tenant(executor, actor, tenant_id, Capability::ManageCosting)
            .await?;
        let header = self
            .costing_repo
            .find_record(tenant_id, record_id)
            .await?
            .ok_or(AppError::NotFound("cost record"))?;
        let details = self.costing_repo.list_details(record_id).await?;
        Ok(CostRecordDetail { header, details })
    }
}
