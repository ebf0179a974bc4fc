// src/models/catalog.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- 1. Categories ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub tenant_id: Uuid,
    #[schema(example = "Minuman")]
    pub name: String,
    pub description: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- 2. Products ---
// `price` is the present-state catalog price; orders snapshot it at commit.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub category_id: Uuid,
    #[schema(example = "KOPI-001")]
    pub sku: String,
    #[schema(example = "Kopi Susu")]
    pub name: String,
    pub description: String,
    #[schema(example = 10)]
    pub qty: i32,
    #[schema(example = 18000)]
    pub price: i64,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product attributes a user may edit. Stock is not one of them.
#[derive(Debug, Clone)]
pub struct ProductAttrs {
    pub category_id: Uuid,
    pub sku: String,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub is_active: bool,
}

// --- 3. Stock adjustment ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StockAdjustmentMode {
    Add,
    Reduce,
    Set,
}

impl StockAdjustmentMode {
    /// New quantity after applying `amount` to `current`, or `None` when
    /// the result would be negative or overflow.
    pub fn apply(self, current: i32, amount: i32) -> Option<i32> {
        if amount < 0 {
            return None;
        }
        match self {
            StockAdjustmentMode::Add => current.checked_add(amount),
            StockAdjustmentMode::Reduce => current.checked_sub(amount).filter(|qty| *qty >= 0),
            StockAdjustmentMode::Set => Some(amount),
        }
    }

    pub fn reason(self) -> StockMovementReason {
        match self {
            StockAdjustmentMode::Add => StockMovementReason::AdjustmentAdd,
            StockAdjustmentMode::Reduce => StockMovementReason::AdjustmentReduce,
            StockAdjustmentMode::Set => StockMovementReason::AdjustmentSet,
        }
    }
}

// --- 4. Stock movements (audit trail) ---
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "stock_movement_reason", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockMovementReason {
    InitialStock,
    Sale,
    AdjustmentAdd,
    AdjustmentReduce,
    AdjustmentSet,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub product_id: Uuid,
    pub quantity_changed: i32,
    pub resulting_qty: i32,
    pub reason: StockMovementReason,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_set() {
        assert_eq!(StockAdjustmentMode::Add.apply(6, 4), Some(10));
        assert_eq!(StockAdjustmentMode::Set.apply(6, 0), Some(0));
        assert_eq!(StockAdjustmentMode::Set.apply(0, 25), Some(25));
    }

    #[test]
    fn reduce_never_goes_negative() {
        assert_eq!(StockAdjustmentMode::Reduce.apply(10, 10), Some(0));
        assert_eq!(StockAdjustmentMode::Reduce.apply(3, 4), None);
    }

    #[test]
    fn negative_amounts_and_overflow_are_rejected() {
        assert_eq!(StockAdjustmentMode::Add.apply(1, -1), None);
        assert_eq!(StockAdjustmentMode::Set.apply(1, -5), None);
        assert_eq!(StockAdjustmentMode::Add.apply(i32::MAX, 1), None);
    }

    #[test]
    fn mode_parses_lowercase() {
        let mode: StockAdjustmentMode = serde_json::from_str("\"reduce\"").unwrap();
        assert_eq!(mode, StockAdjustmentMode::Reduce);
        assert_eq!(mode.reason(), StockMovementReason::AdjustmentReduce);
    }
}
