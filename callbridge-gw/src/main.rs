//! callbridge-gw - Call Correlation Gateway
//!
//! Receives telephony webhook events (`call-ended`, `call-insights`),
//! correlates them with stored order records by phone number and writes
//! deduplicated activity logs against the matched orders.

use anyhow::Result;
use callbridge_common::config::AppConfig;
use callbridge_common::retry::{RetryPolicy, TokioSleeper};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use callbridge_gw::services::{CdrFetcher, CrmClient, EventDispatcher, TelephonyClient};
use callbridge_gw::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // .env is optional; real deployments use environment or TOML
    dotenvy::dotenv().ok();

    info!("Starting callbridge-gw (Call Correlation Gateway)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::var("CALLBRIDGE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("callbridge.toml"));
    let config = AppConfig::load(&config_path)?;
    config.validate()?;

    let telephony = TelephonyClient::new(&config.telephony)?;
    let store = Arc::new(CrmClient::new(config.store.clone())?);

    let retry_policy = RetryPolicy::new(
        config.engine.fetch_max_attempts,
        Duration::from_millis(config.engine.fetch_first_delay_ms),
        Duration::from_millis(config.engine.fetch_retry_delay_ms),
    );
    let fetcher = CdrFetcher::new(Arc::new(telephony), retry_policy, Arc::new(TokioSleeper));
    let dispatcher = Arc::new(EventDispatcher::new(fetcher, store, config.engine.fan_out));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(Arc::new(config), dispatcher);
    let app = callbridge_gw::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
