//! callbridge-gw library interface
//!
//! Exposes the router and application state for integration testing.

pub mod api;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use callbridge_common::config::AppConfig;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::services::EventDispatcher;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub dispatcher: Arc<EventDispatcher>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last background-processing error, for diagnostics: fire-and-forget
    /// dispatch failures are observable only here and in the logs
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, dispatcher: Arc<EventDispatcher>) -> Self {
        Self {
            config,
            dispatcher,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::webhook_routes())
        .merge(api::health_routes())
        .with_state(state)
}
