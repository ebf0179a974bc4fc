pub mod access;
pub mod analytics_service;
pub mod auth;
pub mod catalog_service;
pub mod costing_service;
pub mod ledger;
pub mod order_service;
pub mod tenancy_service;
