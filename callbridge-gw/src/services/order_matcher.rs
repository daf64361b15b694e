//! Order candidate matching
//!
//! Two-phase design: the store cannot run the normalization function
//! server-side, so we first ask it for a superset via a permissive
//! "contains last digits" filter, then re-normalize every candidate's stored
//! phone field in-process and keep only exact equals. A raw substring filter
//! alone both over- and under-matches because stored formatting is
//! inconsistent; correctness is only established after normalizing both
//! sides.

use std::sync::Arc;

use callbridge_common::Result;

use crate::models::OrderRecord;
use crate::services::crm_client::RecordStore;
use crate::services::phone::NormalizedPhone;

/// Matches normalized phone numbers to stored orders
pub struct OrderMatcher {
    store: Arc<dyn RecordStore>,
}

impl OrderMatcher {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// All orders whose stored phone field normalizes to exactly `phone`.
    ///
    /// Returns every exact match; the dispatcher decides what to do with
    /// multiple hits. A query under the minimum usable length never touches
    /// the store and yields the empty set.
    pub async fn find_matches(&self, phone: &NormalizedPhone) -> Result<Vec<OrderRecord>> {
        if !phone.is_matchable() {
            tracing::warn!(phone = %phone, "Number too short to match, skipping store query");
            return Ok(Vec::new());
        }

        let suffix = phone.search_suffix();
        let candidates = self.store.find_order_candidates(suffix).await?;
        let candidate_count = candidates.len();

        let matches: Vec<OrderRecord> = candidates
            .into_iter()
            .filter(|order| NormalizedPhone::normalize(&order.phone) == *phone)
            .collect();

        if matches.is_empty() {
            tracing::info!(
                phone = %phone,
                suffix = %suffix,
                candidates = candidate_count,
                "No order matched after exact confirmation"
            );
        } else {
            for order in &matches {
                tracing::info!(
                    phone = %phone,
                    order = %order.name,
                    stored = %order.phone,
                    "Order matched"
                );
            }
        }

        Ok(matches)
    }
}
