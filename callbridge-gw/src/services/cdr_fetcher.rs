//! Eventually-consistent CDR fetch
//!
//! The webhook notification can race the upstream record's own write, so a
//! freshly fetched CDR may still be half-populated. The fetcher runs a
//! bounded retry schedule and only returns a record once it passes the
//! completeness check (caller number populated, or explicitly anonymous).
//! Exhausting the budget yields `None`; the caller degrades gracefully.

use std::sync::Arc;

use callbridge_common::retry::{RetryPolicy, Sleeper};

use crate::models::CallDetailRecord;
use crate::services::telephony_client::CallDetailApi;

/// Fetches CDRs with bounded retries against an upstream that may lag
pub struct CdrFetcher {
    api: Arc<dyn CallDetailApi>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl CdrFetcher {
    pub fn new(api: Arc<dyn CallDetailApi>, policy: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            api,
            policy,
            sleeper,
        }
    }

    /// Fetch the CDR for `call_id`, retrying while the record is absent or
    /// incomplete. Never returns an error: an unusable upstream is a
    /// degraded path, not a failure.
    pub async fn fetch(&self, call_id: &str) -> Option<CallDetailRecord> {
        for attempt in 1..=self.policy.max_attempts {
            self.sleeper.sleep(self.policy.delay_before(attempt)).await;

            match self.api.fetch_cdr(call_id).await {
                Ok(Some(cdr)) if cdr.has_usable_caller() => {
                    tracing::debug!(call_id = %call_id, attempt, "CDR fetched and complete");
                    return Some(cdr);
                }
                Ok(Some(_)) => {
                    tracing::info!(
                        call_id = %call_id,
                        attempt,
                        "CDR present but incomplete, upstream still writing"
                    );
                }
                Ok(None) => {
                    tracing::info!(call_id = %call_id, attempt, "CDR not available yet");
                }
                Err(e) => {
                    tracing::warn!(call_id = %call_id, attempt, error = %e, "CDR fetch failed");
                }
            }
        }

        tracing::warn!(
            call_id = %call_id,
            attempts = self.policy.max_attempts,
            "CDR never became available within retry budget"
        );
        None
    }
}
