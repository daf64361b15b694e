//! HTTP API handlers for the callbridge gateway

pub mod health;
pub mod webhooks;

pub use health::health_routes;
pub use webhooks::webhook_routes;
