// src/models/analytics.rs

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

// 1. Revenue per day
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyRevenue {
    #[schema(value_type = String, format = Date, example = "2024-01-15")]
    pub day: NaiveDate,
    pub revenue: i64,
    pub order_count: i64,
}

// 2. Best sellers by revenue
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    pub product_name: String,
    pub total_qty: i64,
    pub total_revenue: i64,
}

// 3. Best customers by spend
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerBreakdown {
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub order_count: i64,
    pub total_spent: i64,
}

// 4. Margin of one HPP period
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PeriodMargin {
    #[schema(example = "2024-01")]
    pub period: String,
    pub revenue: i64,
    pub cost: i64,
    pub margin: i64,
    #[schema(value_type = f64, example = 25.5)]
    pub margin_percentage: Decimal,
}

impl PeriodMargin {
    /// `margin = revenue - cost`; the percentage is relative to revenue and
    /// is zero when there was no revenue at all.
    pub fn derive(period: String, revenue: i64, cost: i64) -> Self {
        let margin = revenue.saturating_sub(cost);
        let margin_percentage = if revenue > 0 {
            (Decimal::from(margin) / Decimal::from(revenue) * Decimal::ONE_HUNDRED)
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        } else {
            Decimal::ZERO
        };

        Self {
            period,
            revenue,
            cost,
            margin,
            margin_percentage,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TenantAnalytics {
    pub tenant_id: uuid::Uuid,
    #[schema(value_type = String, format = Date)]
    pub range_start: NaiveDate,
    #[schema(value_type = String, format = Date)]
    pub range_end: NaiveDate,
    pub daily_revenue: Vec<DailyRevenue>,
    pub top_products: Vec<TopProduct>,
    pub customer_breakdown: Vec<CustomerBreakdown>,
    pub margin_by_period: Vec<PeriodMargin>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn zero_revenue_has_zero_percentage() {
        let m = PeriodMargin::derive("2024-01".into(), 0, 3750);
        assert_eq!(m.margin, -3750);
        assert_eq!(m.margin_percentage, Decimal::ZERO);
    }

    #[test]
    fn margin_relative_to_revenue() {
        let m = PeriodMargin::derive("2024-01".into(), 10_000, 7_500);
        assert_eq!(m.margin, 2_500);
        assert_eq!(m.margin_percentage, Decimal::from(25));
    }

    #[test]
    fn negative_margin_and_rounding() {
        let m = PeriodMargin::derive("2024-02".into(), 3, 4);
        assert_eq!(m.margin, -1);
        assert_eq!(m.margin_percentage, Decimal::from_str("-33.33").unwrap());

        let m = PeriodMargin::derive("2024-02".into(), 3, 1);
        assert_eq!(m.margin_percentage, Decimal::from_str("66.67").unwrap());
    }
}
