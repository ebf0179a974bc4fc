pub mod analytics;
pub mod auth;
pub mod catalog;
pub mod costing;
pub mod dashboard;
pub mod orders;
pub mod tenancy;
