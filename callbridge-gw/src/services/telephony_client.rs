//! Upstream telephony API client
//!
//! Read-only fetch of a call detail record by external call id. The record
//! may lag behind the webhook notification; retrying around that is the
//! fetcher's job, this client performs exactly one request per call.

use async_trait::async_trait;
use callbridge_common::config::TelephonyConfig;
use callbridge_common::{Error, Result};
use serde::Deserialize;

use crate::models::CallDetailRecord;

/// Seam for the CDR fetch so the engine is testable without the network
#[async_trait]
pub trait CallDetailApi: Send + Sync {
    /// Fetch the CDR for a call id. `Ok(None)` means the record does not
    /// exist (yet); transport and auth failures are errors.
    async fn fetch_cdr(&self, call_id: &str) -> Result<Option<CallDetailRecord>>;
}

/// Response envelope around a single CDR
#[derive(Debug, Deserialize)]
struct CdrEnvelope {
    #[serde(default)]
    data: Option<CallDetailRecord>,
}

/// HTTP client for the telephony provider's CDR endpoint
pub struct TelephonyClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl TelephonyClient {
    pub fn new(config: &TelephonyConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Upstream(format!("HTTP client build failed: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl CallDetailApi for TelephonyClient {
    async fn fetch_cdr(&self, call_id: &str) -> Result<Option<CallDetailRecord>> {
        let url = format!(
            "{}/v1/call-detail-records/by-call-id/{}",
            self.base_url, call_id
        );

        tracing::debug!(call_id = %call_id, url = %url, "Fetching CDR");

        let response = self
            .http_client
            .get(&url)
            .header("x-rinkel-api-key", &self.api_key)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("CDR fetch failed: {}", e)))?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            tracing::debug!(call_id = %call_id, "CDR not found");
            return Ok(None);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Upstream("Invalid telephony API key (401)".to_string()));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!(
                "CDR fetch returned {}: {}",
                status, body
            )));
        }

        let envelope: CdrEnvelope = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("CDR parse failed: {}", e)))?;

        Ok(envelope.data)
    }
}
