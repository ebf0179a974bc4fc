// src/services/access.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::TenantRepository,
    models::{
        auth::{Capability, Role, User},
        tenancy::{Tenant, TenantWithGrant},
    },
};

/// Can `actor` act on this tenant? The owner always can; a crew worker
/// can when it holds a grant. Nobody else can.
pub fn permits(actor: &User, tenant: &TenantWithGrant) -> bool {
    match actor.role {
        Role::TenantOwner => tenant.tenant.owner_id == actor.id,
        Role::CrewWorker => tenant.has_grant,
        Role::Owner => false,
    }
}

pub fn require_capability(actor: &User, capability: Capability) -> Result<(), AppError> {
    if actor.role.can(capability) {
        Ok(())
    } else {
        tracing::warn!(user_id = %actor.id, ?capability, "capability denied");
        Err(AppError::AccessDenied)
    }
}

// Checks that run at the start of every tenant-scoped operation.
#[derive(Clone)]
pub struct AccessGuard {
    tenant_repo: TenantRepository,
}

impl AccessGuard {
    pub fn new(tenant_repo: TenantRepository) -> Self {
        Self { tenant_repo }
    }

    /// Capability check, then the tenant predicate against fresh data.
    /// Pass the operation's transaction as `executor` when there is one.
    pub async fn require_tenant<'e, E>(
        &self,
        executor: E,
        actor: &User,
        tenant_id: Uuid,
        capability: Capability,
    ) -> Result<Tenant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        require_capability(actor, capability)?;

        let row = self
            .tenant_repo
            .find_with_grant(executor, tenant_id, actor.id)
            .await?
            .ok_or(AppError::NotFound("tenant"))?;

        if !permits(actor, &row) {
            tracing::warn!(user_id = %actor.id, %tenant_id, "tenant access denied");
            return Err(AppError::AccessDenied);
        }
        Ok(row.tenant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            username: "u".into(),
            email: None,
            password_hash: String::new(),
            role,
            phone: String::new(),
            address: String::new(),
            max_tenants: 1,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn tenant(owner_id: Uuid, has_grant: bool) -> TenantWithGrant {
        TenantWithGrant {
            tenant: Tenant {
                id: Uuid::new_v4(),
                owner_id,
                name: "Kedai".into(),
                address: String::new(),
                phone: String::new(),
                is_active: true,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            has_grant,
        }
    }

    #[test]
    fn owner_of_the_tenant_is_permitted() {
        let owner = user(Role::TenantOwner);
        assert!(permits(&owner, &tenant(owner.id, false)));
        assert!(!permits(&owner, &tenant(Uuid::new_v4(), false)));
    }

    #[test]
    fn crew_needs_a_grant() {
        let crew = user(Role::CrewWorker);
        assert!(permits(&crew, &tenant(Uuid::new_v4(), true)));
        assert!(!permits(&crew, &tenant(Uuid::new_v4(), false)));
    }

    #[test]
    fn a_grant_does_not_make_a_tenant_owner_a_member() {
        let other_owner = user(Role::TenantOwner);
        assert!(!permits(&other_owner, &tenant(Uuid::new_v4(), true)));
    }

    #[test]
    fn platform_owner_never_acts_on_tenants() {
        let admin = user(Role::Owner);
        assert!(!permits(&admin, &tenant(admin.id, true)));
    }

    #[test]
    fn capability_gate() {
        assert!(require_capability(&user(Role::CrewWorker), Capability::RecordOrders).is_ok());
        assert!(matches!(
            require_capability(&user(Role::CrewWorker), Capability::ManageCosting),
            Err(AppError::AccessDenied)
        ));
    }
}
