//! Correlation-key lookup for existing activities
//!
//! Finds activity records previously created for an external call id so
//! `call-insights` deliveries can update in place instead of duplicating.
//! Pure lookup; never mutates.

use std::sync::Arc;

use callbridge_common::Result;

use crate::models::ActivityRecord;
use crate::services::crm_client::RecordStore;

pub struct ActivityIndex {
    store: Arc<dyn RecordStore>,
}

impl ActivityIndex {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Activities whose correlation key equals `call_id`. Zero matches is a
    /// normal outcome (first event for this call, or out-of-order delivery);
    /// more than one is possible when a call correlated to multiple orders.
    pub async fn find_by_call_id(&self, call_id: &str) -> Result<Vec<ActivityRecord>> {
        let activities = self.store.find_activities_by_call_id(call_id).await?;
        tracing::debug!(
            call_id = %call_id,
            found = activities.len(),
            "Correlation key lookup"
        );
        Ok(activities)
    }
}
