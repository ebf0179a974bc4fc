// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,
        handlers::auth::create_client,
        handlers::auth::list_clients,
        handlers::auth::create_crew,
        handlers::auth::list_crew,
        handlers::auth::delete_user,

        // --- Tenants ---
        handlers::tenancy::create_tenant,
        handlers::tenancy::list_my_tenants,
        handlers::tenancy::update_tenant,
        handlers::tenancy::delete_tenant,
        handlers::tenancy::grant_access,
        handlers::tenancy::list_accesses,
        handlers::tenancy::revoke_access,

        // --- Catalog ---
        handlers::catalog::create_category,
        handlers::catalog::list_categories,
        handlers::catalog::update_category,
        handlers::catalog::delete_category,
        handlers::catalog::create_product,
        handlers::catalog::list_products,
        handlers::catalog::get_product,
        handlers::catalog::update_product,
        handlers::catalog::delete_product,
        handlers::catalog::adjust_stock,
        handlers::catalog::stock_history,

        // --- Orders ---
        handlers::orders::create_order,
        handlers::orders::list_orders,
        handlers::orders::get_order,

        // --- Costing ---
        handlers::costing::create_ingredient,
        handlers::costing::list_ingredients,
        handlers::costing::update_ingredient,
        handlers::costing::delete_ingredient,
        handlers::costing::create_cost_record,
        handlers::costing::list_cost_records,
        handlers::costing::get_cost_record,

        // --- Analytics & Dashboard ---
        handlers::analytics::get_tenant_analytics,
        handlers::dashboard::get_summary,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Role,
            models::auth::User,
            models::auth::LoginUserPayload,
            models::auth::CreateTenantOwnerPayload,
            models::auth::CreateCrewPayload,
            models::auth::AuthResponse,

            // --- Tenancy ---
            models::tenancy::Tenant,
            models::tenancy::TenantAccess,
            models::tenancy::TenantAccessEntry,
            handlers::tenancy::CreateTenantPayload,
            handlers::tenancy::UpdateTenantPayload,
            handlers::tenancy::GrantAccessPayload,

            // --- Catalog ---
            models::catalog::Category,
            models::catalog::Product,
            models::catalog::StockAdjustmentMode,
            models::catalog::StockMovementReason,
            models::catalog::StockMovement,
            handlers::catalog::CategoryPayload,
            handlers::catalog::CreateProductPayload,
            handlers::catalog::UpdateProductPayload,
            handlers::catalog::StockAdjustmentPayload,

            // --- Orders ---
            models::orders::Order,
            models::orders::OrderItem,
            models::orders::OrderItemView,
            models::orders::OrderDetail,
            models::orders::OrderReceipt,
            handlers::orders::CreateOrderPayload,
            handlers::orders::OrderLinePayload,

            // --- Costing ---
            models::costing::Ingredient,
            models::costing::CostRecord,
            models::costing::CostDetail,
            models::costing::CostDetailView,
            models::costing::CostRecordDetail,
            models::costing::CostRecordReceipt,
            handlers::costing::IngredientPayload,
            handlers::costing::CreateCostRecordPayload,
            handlers::costing::CostLinePayload,

            // --- Analytics ---
            models::analytics::DailyRevenue,
            models::analytics::TopProduct,
            models::analytics::CustomerBreakdown,
            models::analytics::PeriodMargin,
            models::analytics::TenantAnalytics,
            models::dashboard::DashboardCounts,
            models::dashboard::DashboardSummary,
        )
    ),
    tags(
        (name = "Auth", description = "Login"),
        (name = "Users", description = "Accounts and who created them"),
        (name = "Tenants", description = "Tenants, quota and crew access"),
        (name = "Catalog", description = "Categories, products and stock"),
        (name = "Orders", description = "Order ledger"),
        (name = "Costing", description = "Ingredients and monthly HPP records"),
        (name = "Analytics", description = "Revenue and margin reports"),
        (name = "Dashboard", description = "Totals across reachable tenants")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_the_ledger_routes() {
        let doc = ApiDoc::openapi();
        for path in ["/api/orders", "/api/costing/records", "/api/analytics", "/api/dashboard/summary"] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing");
        }
        let schemes = &doc.components.as_ref().unwrap().security_schemes;
        assert!(schemes.contains_key("api_jwt"));
    }
}
