// src/db/tenancy_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::is_unique_violation, error::AppError},
    models::tenancy::{Tenant, TenantAccess, TenantAccessEntry, TenantAttrs, TenantWithGrant},
};

const TENANT_COLUMNS: &str =
    "t.id, t.owner_id, t.name, t.address, t.phone, t.is_active, t.created_at, t.updated_at";

#[derive(Clone)]
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads a tenant together with whether `actor_id` holds a crew grant
    /// on it. Ownership is read from `owner_id` by the caller.
    pub async fn find_with_grant<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        actor_id: Uuid,
    ) -> Result<Option<TenantWithGrant>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT {TENANT_COLUMNS},
                   EXISTS (
                       SELECT 1 FROM tenant_accesses a
                       WHERE a.tenant_id = t.id AND a.crew_id = $2
                   ) AS has_grant
            FROM tenants t
            WHERE t.id = $1
            "#
        );
        let row = sqlx::query_as::<_, TenantWithGrant>(&sql)
            .bind(tenant_id)
            .bind(actor_id)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    pub async fn count_by_owner<'e, E>(&self, executor: E, owner_id: Uuid) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tenants WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_one(executor)
            .await?;
        Ok(count)
    }

    pub async fn create_tenant<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        attrs: &TenantAttrs,
    ) -> Result<Tenant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            INSERT INTO tenants (owner_id, name, address, phone, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(owner_id)
        .bind(&attrs.name)
        .bind(&attrs.address)
        .bind(&attrs.phone)
        .bind(attrs.is_active)
        .fetch_one(executor)
        .await?;
        Ok(tenant)
    }

    pub async fn update_tenant<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        attrs: &TenantAttrs,
    ) -> Result<Tenant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Tenant>(
            r#"
            UPDATE tenants
            SET name = $2, address = $3, phone = $4, is_active = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(&attrs.name)
        .bind(&attrs.address)
        .bind(&attrs.phone)
        .bind(attrs.is_active)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound("tenant"))
    }

    // Products, orders, cost records and grants go with it (ON DELETE CASCADE).
    pub async fn delete_tenant<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM tenants WHERE id = $1")
            .bind(tenant_id)
            .execute(executor)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("tenant"));
        }
        Ok(())
    }

    pub async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<Tenant>, AppError> {
        let tenants = sqlx::query_as::<_, Tenant>(
            "SELECT * FROM tenants WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tenants)
    }

    pub async fn list_for_crew(&self, crew_id: Uuid) -> Result<Vec<Tenant>, AppError> {
        let sql = format!(
            r#"
            SELECT {TENANT_COLUMNS}
            FROM tenants t
            JOIN tenant_accesses a ON a.tenant_id = t.id
            WHERE a.crew_id = $1
            ORDER BY t.name
            "#
        );
        let tenants = sqlx::query_as::<_, Tenant>(&sql)
            .bind(crew_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(tenants)
    }

    // --- Crew access grants ---

    pub async fn create_access<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        crew_id: Uuid,
        granted_by: Uuid,
    ) -> Result<TenantAccess, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, TenantAccess>(
            r#"
            INSERT INTO tenant_accesses (tenant_id, crew_id, granted_by)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(crew_id)
        .bind(granted_by)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "tenant_accesses_tenant_crew_key") {
                AppError::AlreadyGranted
            } else {
                e.into()
            }
        })
    }

    pub async fn delete_access<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        access_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM tenant_accesses WHERE id = $1 AND tenant_id = $2")
            .bind(access_id)
            .bind(tenant_id)
            .execute(executor)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("tenant access"));
        }
        Ok(())
    }

    pub async fn list_accesses(&self, tenant_id: Uuid) -> Result<Vec<TenantAccessEntry>, AppError> {
        let entries = sqlx::query_as::<_, TenantAccessEntry>(
            r#"
            SELECT a.id, a.tenant_id, a.crew_id, a.granted_by, a.granted_at,
                   u.username AS crew_username
            FROM tenant_accesses a
            JOIN users u ON u.id = a.crew_id
            WHERE a.tenant_id = $1
            ORDER BY a.granted_at DESC
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }
}
