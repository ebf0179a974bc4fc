// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

pub fn build_router(app_state: AppState) -> Router {
    // Public
    let auth_routes = Router::new().route("/login", post(handlers::auth::login));

    // Everything below needs a bearer token
    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .route(
            "/clients",
            post(handlers::auth::create_client).get(handlers::auth::list_clients),
        )
        .route(
            "/crew",
            post(handlers::auth::create_crew).get(handlers::auth::list_crew),
        )
        .route("/{id}", delete(handlers::auth::delete_user));

    let tenancy_routes = Router::new()
        .route(
            "/",
            post(handlers::tenancy::create_tenant).get(handlers::tenancy::list_my_tenants),
        )
        .route(
            "/{id}",
            put(handlers::tenancy::update_tenant).delete(handlers::tenancy::delete_tenant),
        )
        .route(
            "/{id}/access",
            post(handlers::tenancy::grant_access).get(handlers::tenancy::list_accesses),
        )
        .route(
            "/{id}/access/{access_id}",
            delete(handlers::tenancy::revoke_access),
        );

    let catalog_routes = Router::new()
        .route(
            "/categories",
            post(handlers::catalog::create_category).get(handlers::catalog::list_categories),
        )
        .route(
            "/categories/{id}",
            put(handlers::catalog::update_category).delete(handlers::catalog::delete_category),
        )
        .route(
            "/products",
            post(handlers::catalog::create_product).get(handlers::catalog::list_products),
        )
        .route(
            "/products/{id}",
            get(handlers::catalog::get_product)
                .put(handlers::catalog::update_product)
                .delete(handlers::catalog::delete_product),
        )
        .route(
            "/products/{id}/stock",
            post(handlers::catalog::adjust_stock).get(handlers::catalog::stock_history),
        );

    let order_routes = Router::new()
        .route(
            "/",
            post(handlers::orders::create_order).get(handlers::orders::list_orders),
        )
        .route("/{id}", get(handlers::orders::get_order));

    let costing_routes = Router::new()
        .route(
            "/ingredients",
            post(handlers::costing::create_ingredient).get(handlers::costing::list_ingredients),
        )
        .route(
            "/ingredients/{id}",
            put(handlers::costing::update_ingredient).delete(handlers::costing::delete_ingredient),
        )
        .route(
            "/records",
            post(handlers::costing::create_cost_record).get(handlers::costing::list_cost_records),
        )
        .route("/records/{id}", get(handlers::costing::get_cost_record));

    let protected = Router::new()
        .nest("/api/users", user_routes)
        .nest("/api/tenants", tenancy_routes)
        .nest("/api/catalog", catalog_routes)
        .nest("/api/orders", order_routes)
        .nest("/api/costing", costing_routes)
        .route("/api/analytics", get(handlers::analytics::get_tenant_analytics))
        .route("/api/dashboard/summary", get(handlers::dashboard::get_summary))
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .merge(protected)
        .with_state(app_state)
}
