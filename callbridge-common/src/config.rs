//! Configuration loading for callbridge
//!
//! Resolution priority per key:
//! 1. Environment variable (`CALLBRIDGE_*`, highest priority)
//! 2. TOML config file (path from `CALLBRIDGE_CONFIG`, default `callbridge.toml`)
//! 3. Compiled default
//!
//! The loaded [`AppConfig`] is passed explicitly into each component at
//! construction; nothing reads process-wide state after startup.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5810,
        }
    }
}

/// Upstream telephony API settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelephonyConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl Default for TelephonyConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.rinkel.com".to_string(),
            api_key: String::new(),
            timeout_secs: 10,
        }
    }
}

impl TelephonyConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Downstream record store settings
///
/// Object and field names are configurable because the store schema is
/// customer-specific (the phone field lives on a custom order object).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub base_url: String,
    pub api_token: String,
    /// API name of the order object searched for phone matches
    pub order_object: String,
    /// API name of the phone field on the order object
    pub order_phone_field: String,
    /// Optional status filter on candidate orders; empty = search all
    pub order_status_filter: String,
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_token: String::new(),
            order_object: "Weborder__c".to_string(),
            order_phone_field: "Eindklant_Telefoonnummer__c".to_string(),
            order_status_filter: String::new(),
            timeout_secs: 10,
        }
    }
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Policy for when one phone number matches multiple stored orders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FanOutPolicy {
    /// Create one activity per matched order (default)
    PerMatch,
    /// Create a single activity against the first matched order
    FirstMatch,
}

/// Correlation engine tuning
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub fan_out: FanOutPolicy,
    /// Maximum CDR fetch attempts
    pub fetch_max_attempts: u32,
    /// Delay before the first fetch attempt (the webhook can race the
    /// upstream record's own write)
    pub fetch_first_delay_ms: u64,
    /// Delay before each subsequent attempt
    pub fetch_retry_delay_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fan_out: FanOutPolicy::PerMatch,
            fetch_max_attempts: 3,
            fetch_first_delay_ms: 3000,
            fetch_retry_delay_ms: 5000,
        }
    }
}

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub telephony: TelephonyConfig,
    pub store: StoreConfig,
    pub engine: EngineConfig,
}

impl AppConfig {
    /// Load configuration from the TOML file at `path` (if it exists),
    /// then apply environment-variable overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let parsed: AppConfig = toml::from_str(&content)
                .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
            info!("Configuration loaded from {}", path.display());
            parsed
        } else {
            warn!(
                "Config file not found at {}, using defaults + environment",
                path.display()
            );
            AppConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply `CALLBRIDGE_*` environment-variable overrides
    fn apply_env_overrides(&mut self) {
        env_override("CALLBRIDGE_HOST", &mut self.server.host);
        if let Ok(port) = std::env::var("CALLBRIDGE_PORT") {
            match port.parse() {
                Ok(p) => self.server.port = p,
                Err(_) => warn!("Ignoring non-numeric CALLBRIDGE_PORT: {}", port),
            }
        }
        env_override("CALLBRIDGE_TELEPHONY_BASE_URL", &mut self.telephony.base_url);
        env_override("CALLBRIDGE_TELEPHONY_API_KEY", &mut self.telephony.api_key);
        env_override("CALLBRIDGE_STORE_BASE_URL", &mut self.store.base_url);
        env_override("CALLBRIDGE_STORE_API_TOKEN", &mut self.store.api_token);
        env_override("CALLBRIDGE_ORDER_OBJECT", &mut self.store.order_object);
        env_override("CALLBRIDGE_ORDER_PHONE_FIELD", &mut self.store.order_phone_field);
        env_override(
            "CALLBRIDGE_ORDER_STATUS_FILTER",
            &mut self.store.order_status_filter,
        );
    }

    /// Validate that the credentials required to talk to both collaborators
    /// are present. Called once at startup.
    pub fn validate(&self) -> Result<()> {
        if self.telephony.api_key.trim().is_empty() {
            return Err(Error::Config(
                "Telephony API key not configured. Set CALLBRIDGE_TELEPHONY_API_KEY \
                 or telephony.api_key in the TOML config."
                    .to_string(),
            ));
        }
        if self.store.base_url.trim().is_empty() {
            return Err(Error::Config(
                "Record store base URL not configured. Set CALLBRIDGE_STORE_BASE_URL \
                 or store.base_url in the TOML config."
                    .to_string(),
            ));
        }
        if self.store.api_token.trim().is_empty() {
            return Err(Error::Config(
                "Record store API token not configured. Set CALLBRIDGE_STORE_API_TOKEN \
                 or store.api_token in the TOML config."
                    .to_string(),
            ));
        }
        Ok(())
    }
}

fn env_override(var: &str, target: &mut String) {
    if let Ok(value) = std::env::var(var) {
        if !value.trim().is_empty() {
            *target = value;
        }
    }
}
