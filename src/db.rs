pub mod analytics_repo;
pub use analytics_repo::AnalyticsRepository;
pub mod catalog_repo;
pub use catalog_repo::CatalogRepository;
pub mod costing_repo;
pub use costing_repo::CostingRepository;
pub mod orders_repo;
pub use orders_repo::OrderRepository;
pub mod tenancy_repo;
pub use tenancy_repo::TenantRepository;
pub mod user_repo;
pub use user_repo::UserRepository;
