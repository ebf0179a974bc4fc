// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// ---
// Roles
// ---
// Closed set of actor kinds. Every operation asks the role for a
// capability once instead of comparing role strings inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Platform administrator; creates tenant owners.
    Owner,
    /// Business owner ("client"); owns tenants, creates crew.
    TenantOwner,
    /// Worker with access to the tenants it was granted.
    CrewWorker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Capability {
    ManageTenantOwners,
    ManageCrew,
    ManageTenants,
    ManageCatalog,
    RecordOrders,
    ManageCosting,
    ViewAnalytics,
    ViewDashboard,
}

const OWNER_CAPABILITIES: &[Capability] = &[Capability::ManageTenantOwners, Capability::ViewDashboard];

const TENANT_OWNER_CAPABILITIES: &[Capability] = &[
    Capability::ManageCrew,
    Capability::ManageTenants,
    Capability::ManageCatalog,
    Capability::RecordOrders,
    Capability::ManageCosting,
    Capability::ViewAnalytics,
    Capability::ViewDashboard,
];

const CREW_CAPABILITIES: &[Capability] = &[
    Capability::ManageCatalog,
    Capability::RecordOrders,
    Capability::ViewDashboard,
];

impl Role {
    pub fn capabilities(self) -> &'static [Capability] {
        match self {
            Role::Owner => OWNER_CAPABILITIES,
            Role::TenantOwner => TENANT_OWNER_CAPABILITIES,
            Role::CrewWorker => CREW_CAPABILITIES,
        }
    }

    pub fn can(self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// The role this role is allowed to create and delete, if any.
    pub fn delegates_to(self) -> Option<Role> {
        match self {
            Role::Owner => Some(Role::TenantOwner),
            Role::TenantOwner => Some(Role::CrewWorker),
            Role::CrewWorker => None,
        }
    }
}

// A user row. `created_by` is the delegation chain (who created whom).
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,

    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub password_hash: String,

    pub role: Role,
    pub phone: String,
    pub address: String,
    pub max_tenants: i32,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Login form
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(length(min = 1, message = "Username is required."))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
}

// New tenant owner ("client"), created by an Owner
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTenantOwnerPayload {
    #[validate(length(min = 3, max = 150, message = "Username must have 3 to 150 characters."))]
    pub username: String,
    #[validate(length(min = 8, message = "Password must have at least 8 characters."))]
    pub password: String,
    #[validate(email(message = "Invalid e-mail."))]
    pub email: Option<String>,
    #[validate(length(max = 15, message = "Phone must have at most 15 characters."))]
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[validate(range(min = 1, message = "A client must be allowed at least one tenant."))]
    #[schema(example = 1)]
    pub max_tenants: i32,
}

// New crew worker, created by a tenant owner
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCrewPayload {
    #[validate(length(min = 3, max = 150, message = "Username must have 3 to 150 characters."))]
    pub username: String,
    #[validate(length(min = 8, message = "Password must have at least 8 characters."))]
    pub password: String,
    #[validate(email(message = "Invalid e-mail."))]
    pub email: Option<String>,
    #[validate(length(max = 15, message = "Phone must have at most 15 characters."))]
    #[serde(default)]
    pub phone: String,
}

/// Fields shared by both kinds of delegated accounts.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub phone: String,
    pub address: String,
    pub max_tenants: i32,
}

impl From<CreateTenantOwnerPayload> for NewAccount {
    fn from(p: CreateTenantOwnerPayload) -> Self {
        Self {
            username: p.username,
            password: p.password,
            email: p.email,
            phone: p.phone,
            address: p.address,
            max_tenants: p.max_tenants,
        }
    }
}

impl From<CreateCrewPayload> for NewAccount {
    fn from(p: CreateCrewPayload) -> Self {
        Self {
            username: p.username,
            password: p.password,
            email: p.email,
            phone: p.phone,
            address: String::new(),
            max_tenants: 1,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
}

// JWT claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // user id
    pub exp: usize, // expiration
    pub iat: usize, // issued at
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_only_manages_clients() {
        assert!(Role::Owner.can(Capability::ManageTenantOwners));
        assert!(!Role::Owner.can(Capability::RecordOrders));
        assert!(!Role::Owner.can(Capability::ManageTenants));
    }

    #[test]
    fn crew_works_catalog_and_orders_only() {
        assert!(Role::CrewWorker.can(Capability::ManageCatalog));
        assert!(Role::CrewWorker.can(Capability::RecordOrders));
        assert!(!Role::CrewWorker.can(Capability::ManageCosting));
        assert!(!Role::CrewWorker.can(Capability::ViewAnalytics));
        assert!(!Role::CrewWorker.can(Capability::ManageTenants));
    }

    #[test]
    fn tenant_owner_runs_the_shop() {
        for cap in [
            Capability::ManageCrew,
            Capability::ManageTenants,
            Capability::ManageCatalog,
            Capability::RecordOrders,
            Capability::ManageCosting,
            Capability::ViewAnalytics,
        ] {
            assert!(Role::TenantOwner.can(cap), "{cap:?}");
        }
        assert!(!Role::TenantOwner.can(Capability::ManageTenantOwners));
    }

    #[test]
    fn delegation_chain() {
        assert_eq!(Role::Owner.delegates_to(), Some(Role::TenantOwner));
        assert_eq!(Role::TenantOwner.delegates_to(), Some(Role::CrewWorker));
        assert_eq!(Role::CrewWorker.delegates_to(), None);
    }

    #[test]
    fn role_serializes_in_screaming_case() {
        let json = serde_json::to_string(&Role::TenantOwner).unwrap();
        assert_eq!(json, "\"TENANT_OWNER\"");
    }
}
