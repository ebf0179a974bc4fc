// src/services/tenancy_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{TenantRepository, UserRepository},
    models::{
        auth::{Capability, Role, User},
        tenancy::{Tenant, TenantAccess, TenantAccessEntry, TenantAttrs},
    },
    services::access::{require_capability, AccessGuard},
};

/// A crew member may be granted access only to tenants of the owner who
/// created it.
pub fn eligible_crew(crew: &User, tenant: &Tenant) -> bool {
    crew.role == Role::CrewWorker && crew.created_by == Some(tenant.owner_id)
}

#[derive(Clone)]
pub struct TenantService {
    tenant_repo: TenantRepository,
    user_repo: UserRepository,
    access: AccessGuard,
}

impl TenantService {
    pub fn new(tenant_repo: TenantRepository, user_repo: UserRepository, access: AccessGuard) -> Self {
        Self {
            tenant_repo,
            user_repo,
            access,
        }
    }

    /// Creates a tenant for `actor`, within its quota. The owner row is
    /// locked for the whole transaction so concurrent creations by the
    /// same owner count one after the other.
    pub async fn create_tenant<'e, E>(
        &self,
        executor: E,
        actor: &User,
        attrs: &TenantAttrs,
    ) -> Result<Tenant, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        require_capability(actor, Capability::ManageTenants)?;

        let mut tx = executor.begin().await?;

        // 1. Lock the owner, re-reading the quota under the lock
        let owner = self.user_repo.lock_for_update(&mut *tx, actor.id).await?;

        // 2. Count and compare
        let count = self.tenant_repo.count_by_owner(&mut *tx, owner.id).await?;
        if count >= i64::from(owner.max_tenants) {
            tracing::warn!(owner_id = %owner.id, count, max = owner.max_tenants, "tenant quota exceeded");
            return Err(AppError::QuotaExceeded {
                max: owner.max_tenants,
            });
        }

        // 3. Insert
        let tenant = self.tenant_repo.create_tenant(&mut *tx, owner.id, attrs).await?;

        tx.commit().await?;

        tracing::info!(tenant_id = %tenant.id, owner_id = %owner.id, "tenant created");
        Ok(tenant)
    }

    // Editing never re-checks the quota.
    pub async fn update_tenant<'e, E>(
        &self,
        executor: E,
        actor: &User,
        tenant_id: Uuid,
        attrs: &TenantAttrs,
    ) -> Result<Tenant, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        self.access
            .require_tenant(&mut *tx, actor, tenant_id, Capability::ManageTenants)
            .await?;
        let tenant = self.tenant_repo.update_tenant(&mut *tx, tenant_id, attrs).await?;
        tx.commit().await?;
        Ok(tenant)
    }

    pub async fn delete_tenant<'e, E>(
        &self,
        executor: E,
        actor: &User,
        tenant_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        self.access
            .require_tenant(&mut *tx, actor, tenant_id, Capability::ManageTenants)
            .await?;
        self.tenant_repo.delete_tenant(&mut *tx, tenant_id).await?;
        tx.commit().await?;

        tracing::info!(%tenant_id, actor_id = %actor.id, "tenant deleted");
        Ok(())
    }

    /// Owned tenants for a tenant owner, granted ones for crew, none for
    /// the platform owner.
    pub async fn list_accessible_tenants(&self, actor: &User) -> Result<Vec<Tenant>, AppError> {
        match actor.role {
            Role::TenantOwner => self.tenant_repo.list_for_owner(actor.id).await,
            Role::CrewWorker => self.tenant_repo.list_for_crew(actor.id).await,
            Role::Owner => Ok(Vec::new()),
        }
    }

    pub async fn grant_access<'e, E>(
        &self,
        executor: E,
        actor: &User,
        tenant_id: Uuid,
        crew_id: Uuid,
    ) -> Result<TenantAccess, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let tenant = self
            .access
            .require_tenant(&mut *tx, actor, tenant_id, Capability::ManageTenants)
            .await?;

        let crew = self
            .user_repo
            .find_by_id(&mut *tx, crew_id)
            .await?
            .ok_or(AppError::NotEligibleCrew)?;
        if !eligible_crew(&crew, &tenant) {
            return Err(AppError::NotEligibleCrew);
        }

        let access = self
            .tenant_repo
            .create_access(&mut *tx, tenant.id, crew.id, actor.id)
            .await?;
        tx.commit().await?;

        tracing::info!(%tenant_id, %crew_id, "tenant access granted");
        Ok(access)
    }

    pub async fn revoke_access<'e, E>(
        &self,
        executor: E,
        actor: &User,
        tenant_id: Uuid,
        access_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        self.access
            .require_tenant(&mut *tx, actor, tenant_id, Capability::ManageTenants)
            .await?;
        self.tenant_repo.delete_access(&mut *tx, tenant_id, access_id).await?;
        tx.commit().await?;

        tracing::info!(%tenant_id, %access_id, "tenant access revoked");
        Ok(())
    }

    pub async fn list_accesses<'e, E>(
        &self,
        executor: E,
        actor: &User,
        tenant_id: Uuid,
    ) -> Result<Vec<TenantAccessEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.access
            .require_tenant(executor, actor, tenant_id, Capability::ManageTenants)
            .await?;
        self.tenant_repo.list_accesses(tenant_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(role: Role, created_by: Option<Uuid>) -> User {
        User {
            id: Uuid::new_v4(),
            username: "crew".into(),
            email: None,
            password_hash: String::new(),
            role,
            phone: String::new(),
            address: String::new(),
            max_tenants: 1,
            created_by,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn tenant(owner_id: Uuid) -> Tenant {
        Tenant {
            id: Uuid::new_v4(),
            owner_id,
            name: "Warung".into(),
            address: String::new(),
            phone: String::new(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn own_crew_is_eligible() {
        let owner_id = Uuid::new_v4();
        assert!(eligible_crew(&user(Role::CrewWorker, Some(owner_id)), &tenant(owner_id)));
    }

    #[test]
    fn foreign_crew_and_non_crew_are_not() {
        let owner_id = Uuid::new_v4();
        let t = tenant(owner_id);
        assert!(!eligible_crew(&user(Role::CrewWorker, Some(Uuid::new_v4())), &t));
        assert!(!eligible_crew(&user(Role::CrewWorker, None), &t));
        assert!(!eligible_crew(&user(Role::TenantOwner, Some(owner_id)), &t));
    }
}
