// Ledger behavior against a real Postgres. Run with
// `DATABASE_URL=postgres://... cargo test -- --ignored`.

use std::{str::FromStr, time::Duration};

use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use sqlx::{postgres::PgPoolOptions, PgPool};
use truno_backend::{
    common::error::AppError,
    config::{AdminSeed, AppConfig, AppState},
    models::{
        auth::{NewAccount, User},
        catalog::{Product, ProductAttrs, StockAdjustmentMode, StockMovementReason},
        costing::{CostLineRequest, IngredientAttrs, Period},
        orders::{CustomerInfo, OrderLineRequest},
        tenancy::{Tenant, TenantAttrs},
    },
};
use uuid::Uuid;

struct Fixture {
    state: AppState,
    client: User,
    tenant: Tenant,
    category_id: Uuid,
}

async fn connect() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL");
    let pool = PgPoolOptions::new()
        .max_connections(8)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&url)
        .await
        .expect("connect postgres");
    sqlx::migrate!().run(&pool).await.expect("migrations");
    pool
}

fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", &Uuid::new_v4().simple().to_string()[..12])
}

fn account(username: String, max_tenants: i32) -> NewAccount {
    NewAccount {
        username,
        password: "rahasia-123".to_string(),
        email: None,
        phone: String::new(),
        address: String::new(),
        max_tenants,
    }
}

fn tenant_attrs(name: &str) -> TenantAttrs {
    TenantAttrs {
        name: name.to_string(),
        address: "Jl. Merdeka 1".to_string(),
        phone: "0812000000".to_string(),
        is_active: true,
    }
}

async fn fixture() -> Fixture {
    let pool = connect().await;
    let config = AppConfig {
        database_url: String::new(),
        jwt_secret: "ledger-test-secret".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        db_max_connections: 8,
        db_acquire_timeout: Duration::from_secs(5),
        jwt_ttl_hours: 1,
        admin: None,
    };
    let state = AppState::with_pool(pool, config);

    let seed = AdminSeed {
        username: unique("owner"),
        password: "rahasia-123".to_string(),
    };
    let owner = state
        .auth_service
        .ensure_owner_account(&state.db_pool, &seed)
        .await
        .unwrap()
        .expect("fresh owner");

    let client = state
        .auth_service
        .create_tenant_owner(&state.db_pool, &owner, account(unique("client"), 1))
        .await
        .unwrap();

    let tenant = state
        .tenant_service
        .create_tenant(&state.db_pool, &client, &tenant_attrs("Kedai Kopi"))
        .await
        .unwrap();

    let category = state
        .catalog_service
        .create_category(&state.db_pool, &client, tenant.id, "Minuman", "")
        .await
        .unwrap();

    Fixture {
        state,
        client,
        tenant,
        category_id: category.id,
    }
}

impl Fixture {
    async fn product(&self, sku: &str, price: i64, qty: i32) -> Product {
        let attrs = ProductAttrs {
            category_id: self.category_id,
            sku: sku.to_string(),
            name: format!("Produk {sku}"),
            description: String::new(),
            price,
            is_active: true,
        };
        self.state
            .catalog_service
            .create_product(&self.state.db_pool, &self.client, self.tenant.id, &attrs, qty)
            .await
            .unwrap()
    }

    async fn qty_of(&self, product_id: Uuid) -> i32 {
        self.state
            .catalog_service
            .get_product(&self.state.db_pool, &self.client, self.tenant.id, product_id)
            .await
            .unwrap()
            .qty
    }

    async fn order(&self, actor: &User, lines: &[(Uuid, i32)]) -> Result<i64, AppError> {
        let lines: Vec<OrderLineRequest> = lines
            .iter()
            .map(|(product_id, qty)| OrderLineRequest {
                product_id: *product_id,
                qty: *qty,
            })
            .collect();
        let customer = CustomerInfo {
            name: Some("Budi".to_string()),
            phone: Some("0813".to_string()),
            address: None,
        };
        self.state
            .order_service
            .commit_order(&self.state.db_pool, actor, self.tenant.id, &customer, &lines)
            .await
            .map(|receipt| receipt.order.total_amount)
    }
}

fn current_period() -> Period {
    let today = Utc::now().date_naive();
    Period::new(today.year(), today.month()).unwrap()
}

#[tokio::test]
#[ignore = "requires DATABASE_URL and a local Postgres"]
async fn order_takes_stock_and_freezes_the_price() {
    let fx = fixture().await;
    let kopi = fx.product("KOPI-001", 1000, 10).await;

    let total = fx.order(&fx.client, &[(kopi.id, 4)]).await.unwrap();
    assert_eq!(total, 4000);
    assert_eq!(fx.qty_of(kopi.id).await, 6);

    // a later price change does not touch the recorded line
    let repriced = ProductAttrs {
        category_id: fx.category_id,
        sku: kopi.sku.clone(),
        name: kopi.name.clone(),
        description: String::new(),
        price: 2500,
        is_active: true,
    };
    fx.state
        .catalog_service
        .update_product(&fx.state.db_pool, &fx.client, fx.tenant.id, kopi.id, &repriced)
        .await
        .unwrap();

    let orders = fx
        .state
        .order_service
        .list_orders(&fx.state.db_pool, &fx.client, fx.tenant.id)
        .await
        .unwrap();
    assert_eq!(orders.len(), 1);
    let detail = fx
        .state
        .order_service
        .order_detail(&fx.state.db_pool, &fx.client, fx.tenant.id, orders[0].id)
        .await
        .unwrap();
    assert_eq!(detail.total_qty, 4);
    assert_eq!(detail.items[0].item.unit_price, 1000);
    assert_eq!(detail.items[0].item.subtotal, 4000);

    let history = fx
        .state
        .catalog_service
        .stock_history(&fx.state.db_pool, &fx.client, fx.tenant.id, kopi.id)
        .await
        .unwrap();
    let reasons: Vec<_> = history.iter().map(|m| m.reason).collect();
    assert!(reasons.contains(&StockMovementReason::InitialStock));
    assert!(reasons.contains(&StockMovementReason::Sale));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL and a local Postgres"]
async fn a_short_line_rolls_back_the_whole_order() {
    let fx = fixture().await;
    let a = fx.product("A-1", 500, 10).await;
    let b = fx.product("B-1", 700, 1).await;

    let err = fx.order(&fx.client, &[(a.id, 2), (b.id, 5)]).await.unwrap_err();
    assert!(
        matches!(err, AppError::InsufficientStock { available: 1, requested: 5, .. }),
        "{err:?}"
    );

    assert_eq!(fx.qty_of(a.id).await, 10);
    assert_eq!(fx.qty_of(b.id).await, 1);
    let orders = fx
        .state
        .order_service
        .list_orders(&fx.state.db_pool, &fx.client, fx.tenant.id)
        .await
        .unwrap();
    assert!(orders.is_empty());

    let err = fx.order(&fx.client, &[]).await.unwrap_err();
    assert!(matches!(err, AppError::EmptyOrder), "{err:?}");
    let err = fx.order(&fx.client, &[(Uuid::new_v4(), 1)]).await.unwrap_err();
    assert!(matches!(err, AppError::ProductNotFound(_)), "{err:?}");
}

#[tokio::test]
#[ignore = "requires DATABASE_URL and a local Postgres"]
async fn concurrent_orders_never_oversell() {
    let fx = fixture().await;
    let last_five = fx.product("LIMITED", 1000, 5).await;

    let lines = [(last_five.id, 3)];
    let (first, second) = tokio::join!(
        fx.order(&fx.client, &lines),
        fx.order(&fx.client, &lines),
    );

    let committed = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(committed, 1, "{first:?} / {second:?}");
    let refused = [first, second].into_iter().find_map(Result::err).unwrap();
    assert!(matches!(refused, AppError::InsufficientStock { .. }));
    assert_eq!(fx.qty_of(last_five.id).await, 2);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL and a local Postgres"]
async fn sold_products_cannot_be_deleted() {
    let fx = fixture().await;
    let a = fx.product("DEL-A", 1000, 5).await;
    let b = fx.product("DEL-B", 500, 5).await;
    let unsold = fx.product("DEL-C", 200, 5).await;

    let total = fx.order(&fx.client, &[(a.id, 2), (b.id, 2)]).await.unwrap();
    assert_eq!(total, 3000);

    let catalog = &fx.state.catalog_service;
    let err = catalog
        .delete_product(&fx.state.db_pool, &fx.client, fx.tenant.id, a.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ProductHasOrders), "{err:?}");

    let err = catalog
        .delete_category(&fx.state.db_pool, &fx.client, fx.tenant.id, fx.category_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ProductHasOrders), "{err:?}");

    catalog
        .delete_product(&fx.state.db_pool, &fx.client, fx.tenant.id, unsold.id)
        .await
        .unwrap();

    let orders = fx
        .state
        .order_service
        .list_orders(&fx.state.db_pool, &fx.client, fx.tenant.id)
        .await
        .unwrap();
    let detail = fx
        .state
        .order_service
        .order_detail(&fx.state.db_pool, &fx.client, fx.tenant.id, orders[0].id)
        .await
        .unwrap();
    let lines_total: i64 = detail.items.iter().map(|line| line.item.subtotal).sum();
    assert_eq!(detail.items.len(), 2);
    assert_eq!(lines_total, detail.header.total_amount);
    assert_eq!(lines_total, 3000);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL and a local Postgres"]
async fn tenant_quota_is_enforced() {
    let fx = fixture().await;
    let err = fx
        .state
        .tenant_service
        .create_tenant(&fx.state.db_pool, &fx.client, &tenant_attrs("Cabang 2"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::QuotaExceeded { max: 1 }), "{err:?}");
}

#[tokio::test]
#[ignore = "requires DATABASE_URL and a local Postgres"]
async fn crew_works_only_where_granted() {
    let fx = fixture().await;
    let teh = fx.product("TEH-001", 800, 3).await;
    let crew = fx
        .state
        .auth_service
        .create_crew(&fx.state.db_pool, &fx.client, account(unique("crew"), 1))
        .await
        .unwrap();

    let err = fx.order(&crew, &[(teh.id, 1)]).await.unwrap_err();
    assert!(matches!(err, AppError::AccessDenied), "{err:?}");

    let access = fx
        .state
        .tenant_service
        .grant_access(&fx.state.db_pool, &fx.client, fx.tenant.id, crew.id)
        .await
        .unwrap();
    let err = fx
        .state
        .tenant_service
        .grant_access(&fx.state.db_pool, &fx.client, fx.tenant.id, crew.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AlreadyGranted), "{err:?}");

    assert_eq!(fx.order(&crew, &[(teh.id, 1)]).await.unwrap(), 800);

    // crew keeps the catalog but has no say over costing
    fx.state
        .catalog_service
        .create_category(&fx.state.db_pool, &crew, fx.tenant.id, "Snack", "")
        .await
        .unwrap();
    let err = fx.state.costing_service.list_ingredients(&crew).await.unwrap_err();
    assert!(matches!(err, AppError::AccessDenied), "{err:?}");

    fx.state
        .tenant_service
        .revoke_access(&fx.state.db_pool, &fx.client, fx.tenant.id, access.id)
        .await
        .unwrap();
    let err = fx.order(&crew, &[(teh.id, 1)]).await.unwrap_err();
    assert!(matches!(err, AppError::AccessDenied), "{err:?}");
}

#[tokio::test]
#[ignore = "requires DATABASE_URL and a local Postgres"]
async fn stock_adjustments_are_audited() {
    let fx = fixture().await;
    let gula = fx.product("GULA", 100, 4).await;
    let service = &fx.state.catalog_service;
    let pool = &fx.state.db_pool;

    let p = service
        .adjust_stock(pool, &fx.client, fx.tenant.id, gula.id, StockAdjustmentMode::Add, 6, Some("restock"))
        .await
        .unwrap();
    assert_eq!(p.qty, 10);

    let err = service
        .adjust_stock(pool, &fx.client, fx.tenant.id, gula.id, StockAdjustmentMode::Reduce, 11, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientStock { available: 10, .. }), "{err:?}");

    let p = service
        .adjust_stock(pool, &fx.client, fx.tenant.id, gula.id, StockAdjustmentMode::Set, 2, None)
        .await
        .unwrap();
    assert_eq!(p.qty, 2);

    let history = service
        .stock_history(pool, &fx.client, fx.tenant.id, gula.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].reason, StockMovementReason::AdjustmentSet);
    assert_eq!(history[0].quantity_changed, -8);
    assert_eq!(history[0].resulting_qty, 2);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL and a local Postgres"]
async fn cost_record_feeds_the_period_margin() {
    let fx = fixture().await;
    let kopi = fx.product("KOPI-HPP", 1000, 10).await;
    fx.order(&fx.client, &[(kopi.id, 4)]).await.unwrap();

    let beans = fx
        .state
        .costing_service
        .create_ingredient(
            &fx.client,
            &IngredientAttrs {
                name: "Biji Kopi".to_string(),
                unit_price: 1500,
                unit: "kg".to_string(),
                notes: String::new(),
            },
        )
        .await
        .unwrap();

    let period = current_period();
    let lines = [CostLineRequest {
        ingredient_id: beans.id,
        qty: Decimal::from_str("2.5").unwrap(),
    }];
    let receipt = fx
        .state
        .costing_service
        .commit_cost_record(&fx.state.db_pool, &fx.client, fx.tenant.id, period, "", &lines)
        .await
        .unwrap();
    assert_eq!(receipt.record.total_amount, 3750);
    assert_eq!(receipt.details[0].subtotal, 3750);

    let err = fx
        .state
        .costing_service
        .commit_cost_record(&fx.state.db_pool, &fx.client, fx.tenant.id, period, "", &lines)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::DuplicatePeriod(_)), "{err:?}");

    let report = fx
        .state
        .analytics_service
        .tenant_analytics(&fx.state.db_pool, &fx.client, fx.tenant.id, Some(period))
        .await
        .unwrap();
    let margin = &report.margin_by_period[0];
    assert_eq!(margin.revenue, 4000);
    assert_eq!(margin.cost, 3750);
    assert_eq!(margin.margin, 250);
    assert_eq!(margin.margin_percentage, Decimal::from_str("6.25").unwrap());
    assert_eq!(report.top_products[0].total_qty, 4);
    assert_eq!(report.customer_breakdown[0].customer_name, "Budi");
}
