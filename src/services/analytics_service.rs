// src/services/analytics_service.rs

use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{AnalyticsRepository, CostingRepository, TenantRepository, UserRepository},
    models::{
        analytics::{PeriodMargin, TenantAnalytics},
        auth::{Capability, Role, User},
        costing::{CostRecord, Period},
        dashboard::{DashboardSummary, LOW_STOCK_THRESHOLD},
    },
    services::access::{require_capability, AccessGuard},
};

/// Days of order history shown in the analytics report.
pub const REPORT_WINDOW_DAYS: u64 = 30;
const TOP_PRODUCTS: i64 = 10;
const TOP_CUSTOMERS: i64 = 10;
const RECENT_PERIODS: i64 = 6;
const DASHBOARD_LIST_LIMIT: i64 = 5;

/// First day of the report window ending `today`, and the UTC instant it starts.
pub fn report_window(today: NaiveDate) -> (NaiveDate, DateTime<Utc>) {
    let start = today
        .checked_sub_days(Days::new(REPORT_WINDOW_DAYS))
        .unwrap_or(today);
    (start, Utc.from_utc_datetime(&start.and_time(NaiveTime::MIN)))
}

#[derive(Clone)]
pub struct AnalyticsService {
    analytics_repo: AnalyticsRepository,
    costing_repo: CostingRepository,
    tenant_repo: TenantRepository,
    user_repo: UserRepository,
    access: AccessGuard,
}

impl AnalyticsService {
    pub fn new(
        analytics_repo: AnalyticsRepository,
        costing_repo: CostingRepository,
        tenant_repo: TenantRepository,
        user_repo: UserRepository,
        access: AccessGuard,
    ) -> Self {
        Self {
            analytics_repo,
            costing_repo,
            tenant_repo,
            user_repo,
            access,
        }
    }

    /// Revenue, best sellers, best customers and HPP margins of one tenant.
    /// With a period, the margin list holds that period only (or nothing
    /// when it has no cost record); otherwise the latest six periods.
    pub async fn tenant_analytics<'e, E>(
        &self,
        executor: E,
        actor: &User,
        tenant_id: Uuid,
        period: Option<Period>,
    ) -> Result<TenantAnalytics, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.access
            .require_tenant(executor, actor, tenant_id, Capability::ViewAnalytics)
            .await?;

        let today = Utc::now().date_naive();
        let (range_start, since) = report_window(today);

        let daily_revenue = self.analytics_repo.daily_revenue(tenant_id, since).await?;
        let top_products = self
            .analytics_repo
            .top_products(tenant_id, since, TOP_PRODUCTS)
            .await?;
        let customer_breakdown = self
            .analytics_repo
            .customer_breakdown(tenant_id, since, TOP_CUSTOMERS)
            .await?;

        let records = match period {
            Some(period) => self
                .costing_repo
                .find_record_by_period(tenant_id, &period.to_string())
                .await?
                .into_iter()
                .collect(),
            None => self.costing_repo.recent_records(tenant_id, RECENT_PERIODS).await?,
        };

        let mut margin_by_period = Vec::with_capacity(records.len());
        for record in &records {
            margin_by_period.push(self.period_margin(tenant_id, record).await?);
        }

        Ok(TenantAnalytics {
            tenant_id,
            range_start,
            range_end: today,
            daily_revenue,
            top_products,
            customer_breakdown,
            margin_by_period,
        })
    }

    /// Revenue of the record's month against its cost total. A month
    /// without orders has zero revenue.
    async fn period_margin(&self, tenant_id: Uuid, record: &CostRecord) -> Result<PeriodMargin, AppError> {
        let period: Period = record.period.parse()?;
        let (start, end) = period.utc_bounds();
        let revenue = self
            .analytics_repo
            .revenue_between(tenant_id, start, end)
            .await?;
        Ok(PeriodMargin::derive(record.period.clone(), revenue, record.total_amount))
    }

    /// Home screen numbers over every tenant the actor can see. Platform
    /// owners see none and get the number of clients they created instead.
    pub async fn dashboard_summary(&self, actor: &User) -> Result<DashboardSummary, AppError> {
        require_capability(actor, Capability::ViewDashboard)?;

        let tenants = match actor.role {
            Role::TenantOwner => self.tenant_repo.list_for_owner(actor.id).await?,
            Role::CrewWorker => self.tenant_repo.list_for_crew(actor.id).await?,
            Role::Owner => Vec::new(),
        };
        let tenant_ids: Vec<Uuid> = tenants.iter().map(|t| t.id).collect();

        let counts = self.analytics_repo.counts(&tenant_ids).await?;
        let recent_orders = self
            .analytics_repo
            .recent_orders(&tenant_ids, DASHBOARD_LIST_LIMIT)
            .await?;
        let low_stock_products = self
            .analytics_repo
            .low_stock_products(&tenant_ids, LOW_STOCK_THRESHOLD, DASHBOARD_LIST_LIMIT)
            .await?;

        let total_clients = match actor.role {
            Role::Owner => Some(
                self.user_repo
                    .count_created_by(actor.id, Role::TenantOwner)
                    .await?,
            ),
            _ => None,
        };

        Ok(DashboardSummary {
            counts,
            total_clients,
            recent_orders,
            low_stock_products,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_window_covers_thirty_days_back() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let (start, since) = report_window(today);
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 2, 14).unwrap());
        assert_eq!(since.to_rfc3339(), "2024-02-14T00:00:00+00:00");
    }
}
