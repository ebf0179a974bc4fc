// src/models/tenancy.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// ---
// 1. Tenant (the shop)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: Uuid,
    pub owner_id: Uuid,
    #[schema(example = "Kedai Kopi Truno")]
    pub name: String,
    pub address: String,
    #[schema(example = "081234567890")]
    pub phone: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---
// 2. TenantAccess (crew grant)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TenantAccess {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub crew_id: Uuid,
    pub granted_by: Uuid,
    pub granted_at: DateTime<Utc>,
}

// Grant joined with the crew's username, for the tenant detail screen.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TenantAccessEntry {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub access: TenantAccess,
    pub crew_username: String,
}

// Tenant plus whether a given actor holds a grant on it.
// Loaded in one query to answer the access predicate.
#[derive(Debug, Clone, FromRow)]
pub struct TenantWithGrant {
    #[sqlx(flatten)]
    pub tenant: Tenant,
    pub has_grant: bool,
}

/// Editable tenant attributes (name/address/phone plus the active flag on edit).
#[derive(Debug, Clone)]
pub struct TenantAttrs {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub is_active: bool,
}
