// src/models/costing.rs

use std::{fmt, str::FromStr};

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::error::AppError;

// --- Ingredients (bahan) ---
// Owned by a tenant owner and shared across that owner's tenants.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub id: Uuid,
    pub owner_id: Uuid,
    #[schema(example = "Gula Pasir")]
    pub name: String,
    #[schema(example = 1500)]
    pub unit_price: i64,
    #[schema(example = "kg")]
    pub unit: String,
    pub notes: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct IngredientAttrs {
    pub name: String,
    pub unit_price: i64,
    pub unit: String,
    pub notes: String,
}

// --- HPP record per tenant per month ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CostRecord {
    pub id: Uuid,
    pub tenant_id: Uuid,
    #[schema(example = "2024-01")]
    pub period: String,
    #[schema(example = 3750)]
    pub total_amount: i64,
    pub notes: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CostDetail {
    pub id: Uuid,
    pub cost_record_id: Uuid,
    pub ingredient_id: Uuid,
    #[schema(value_type = f64, example = 2.5)]
    pub qty: Decimal,
    #[schema(example = 1500)]
    pub unit_price: i64,
    #[schema(example = 3750)]
    pub subtotal: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CostDetailView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub detail: CostDetail,
    pub ingredient_name: String,
    pub ingredient_unit: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CostRecordDetail {
    #[serde(flatten)]
    pub header: CostRecord,
    pub details: Vec<CostDetailView>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CostRecordReceipt {
    #[serde(flatten)]
    pub record: CostRecord,
    pub details: Vec<CostDetail>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostLineRequest {
    pub ingredient_id: Uuid,
    pub qty: Decimal,
}

// ---
// Period: a calendar month written as YYYY-MM
// ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    first_day: NaiveDate,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first_day| Self { first_day })
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    pub fn next(&self) -> Period {
        let (year, month) = match self.first_day.month() {
            12 => (self.first_day.year() + 1, 1),
            m => (self.first_day.year(), m + 1),
        };
        Period {
            first_day: NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(self.first_day),
        }
    }

    pub fn last_day(&self) -> NaiveDate {
        self.next().first_day.pred_opt().unwrap_or(self.first_day)
    }

    /// Half-open UTC range `[first day 00:00, next month 00:00)`.
    pub fn utc_bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = Utc.from_utc_datetime(&self.first_day.and_time(chrono::NaiveTime::MIN));
        let end = Utc.from_utc_datetime(&self.next().first_day.and_time(chrono::NaiveTime::MIN));
        (start, end)
    }
}

impl FromStr for Period {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::InvalidPeriod(s.to_string());
        let bytes = s.as_bytes();
        if bytes.len() != 7 || bytes[4] != b'-' {
            return Err(invalid());
        }
        let (year, month) = (&s[..4], &s[5..]);
        if !year.bytes().chain(month.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        if year == 0 {
            return Err(invalid());
        }
        Period::new(year, month).ok_or_else(invalid)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.first_day.year(), self.first_day.month())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_prints() {
        let p: Period = "2024-01".parse().unwrap();
        assert_eq!(p.to_string(), "2024-01");
        assert_eq!(p.first_day(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(p.last_day(), NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
    }

    #[test]
    fn february_and_december_ranges() {
        let feb: Period = "2024-02".parse().unwrap();
        assert_eq!(feb.last_day(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        let feb: Period = "2023-02".parse().unwrap();
        assert_eq!(feb.last_day(), NaiveDate::from_ymd_opt(2023, 2, 28).unwrap());

        let dec: Period = "2023-12".parse().unwrap();
        assert_eq!(dec.last_day(), NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
        assert_eq!(dec.next().to_string(), "2024-01");
    }

    #[test]
    fn utc_bounds_are_half_open_month() {
        let p: Period = "2024-03".parse().unwrap();
        let (start, end) = p.utc_bounds();
        assert_eq!(start.to_rfc3339(), "2024-03-01T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2024-04-01T00:00:00+00:00");
    }

    #[test]
    fn rejects_malformed_periods() {
        for bad in ["2024-13", "2024-00", "2024-1", "24-01", "2024/01", "abcd-ef", "", "2024-01-01", "+024-01"] {
            assert!(
                matches!(bad.parse::<Period>(), Err(AppError::InvalidPeriod(_))),
                "{bad} should be rejected"
            );
        }
    }
}
