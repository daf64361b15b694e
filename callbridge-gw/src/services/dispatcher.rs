//! Event dispatch orchestration
//!
//! Sequences fetch → match → build → upsert per event kind. The store itself
//! is the durable state: `call-ended` creates activities, `call-insights`
//! looks existing ones up by correlation key and appends, falling back to
//! create-on-demand when the events arrived out of order. Skip is a final
//! state, not an error; only store write failures propagate.

use std::sync::Arc;

use callbridge_common::config::FanOutPolicy;
use callbridge_common::Result;

use crate::models::{CallDetailRecord, ExternalCallEvent, OrderRecord};
use crate::services::activity_builder;
use crate::services::activity_index::ActivityIndex;
use crate::services::cdr_fetcher::CdrFetcher;
use crate::services::crm_client::RecordStore;
use crate::services::order_matcher::OrderMatcher;
use crate::services::phone::NormalizedPhone;

/// Why an event ended in the skip terminal state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    EmptyCallId,
    AnonymousCaller,
    UnmatchablePhone,
    NoInsights,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::EmptyCallId => "empty_call_id",
            SkipReason::AnonymousCaller => "anonymous",
            SkipReason::UnmatchablePhone => "unmatchable_phone",
            SkipReason::NoInsights => "no_insights",
        }
    }
}

/// Terminal outcome of one dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Activities created (one per matched order, or a single unlinked one)
    Created { activity_ids: Vec<String> },
    /// Existing activities updated with the insights block
    Updated { activity_ids: Vec<String> },
    /// Insights redelivered for activities that already carry them
    AlreadyLogged,
    /// `call-insights` with no existing activity and no CDR to create from
    NotFound,
    Skipped(SkipReason),
}

/// Orchestrates the correlation engine for both event kinds
pub struct EventDispatcher {
    fetcher: CdrFetcher,
    matcher: OrderMatcher,
    index: ActivityIndex,
    store: Arc<dyn RecordStore>,
    fan_out: FanOutPolicy,
}

impl EventDispatcher {
    pub fn new(
        fetcher: CdrFetcher,
        store: Arc<dyn RecordStore>,
        fan_out: FanOutPolicy,
    ) -> Self {
        Self {
            fetcher,
            matcher: OrderMatcher::new(store.clone()),
            index: ActivityIndex::new(store.clone()),
            store,
            fan_out,
        }
    }

    /// Handle a `call-ended` notification.
    ///
    /// Fetches the CDR (degrading to the webhook-supplied fields when the
    /// upstream never delivers), matches stored orders on the caller number
    /// and creates one activity per the fan-out policy. Zero matches still
    /// produce exactly one unlinked activity so every call is logged.
    pub async fn handle_call_ended(&self, event: &ExternalCallEvent) -> Result<DispatchOutcome> {
        if !event.has_call_id() {
            return Ok(DispatchOutcome::Skipped(SkipReason::EmptyCallId));
        }

        let cdr = match self.fetcher.fetch(&event.id).await {
            Some(cdr) => cdr,
            None => {
                tracing::warn!(
                    call_id = %event.id,
                    "CDR unavailable, degrading to webhook-supplied fields"
                );
                event.to_fallback_cdr()
            }
        };

        let orders = match self.resolve_orders(&event.id, &cdr).await? {
            Ok(orders) => orders,
            Err(reason) => return Ok(DispatchOutcome::Skipped(reason)),
        };

        self.create_activities(&event.id, &cdr, &orders, false).await
    }

    /// Handle a `call-insights` notification.
    ///
    /// Appends the insights block to every activity found under the
    /// correlation key that is not already flagged; with no existing
    /// activity, falls back to the same create path as `call-ended` with the
    /// insights leading the description.
    pub async fn handle_call_insights(&self, event: &ExternalCallEvent) -> Result<DispatchOutcome> {
        if !event.has_call_id() {
            return Ok(DispatchOutcome::Skipped(SkipReason::EmptyCallId));
        }

        let existing = self.index.find_by_call_id(&event.id).await?;
        let cdr = self.fetcher.fetch(&event.id).await;

        if existing.is_empty() {
            // Insights arrived before (or instead of) call-ended
            let Some(cdr) = cdr else {
                tracing::info!(call_id = %event.id, "No activity and no CDR for insights event");
                return Ok(DispatchOutcome::NotFound);
            };

            let orders = match self.resolve_orders(&event.id, &cdr).await? {
                Ok(orders) => orders,
                Err(reason) => return Ok(DispatchOutcome::Skipped(reason)),
            };

            return self.create_activities(&event.id, &cdr, &orders, true).await;
        }

        let block = cdr
            .as_ref()
            .and_then(|cdr| cdr.insights.as_ref())
            .and_then(activity_builder::insights_block);
        let Some(block) = block else {
            tracing::info!(call_id = %event.id, "Insights not available on CDR, nothing to append");
            return Ok(DispatchOutcome::Skipped(SkipReason::NoInsights));
        };

        let mut updated = Vec::new();
        for activity in existing {
            if activity.insights_logged {
                tracing::debug!(
                    call_id = %event.id,
                    activity_id = %activity.id,
                    "Insights already logged, skipping append"
                );
                continue;
            }

            // Flag may predate the record; the description marker is the
            // second line of defense against duplicate blocks.
            let Some(new_description) =
                activity_builder::append_insights(&activity.description, &block)
            else {
                continue;
            };

            self.store
                .update_activity(&activity.id, &new_description, true)
                .await?;
            tracing::info!(
                call_id = %event.id,
                activity_id = %activity.id,
                "Insights appended to activity"
            );
            updated.push(activity.id);
        }

        if updated.is_empty() {
            Ok(DispatchOutcome::AlreadyLogged)
        } else {
            Ok(DispatchOutcome::Updated {
                activity_ids: updated,
            })
        }
    }

    /// Resolve the caller number to matched orders, or a skip reason when
    /// the call cannot be correlated at all.
    async fn resolve_orders(
        &self,
        call_id: &str,
        cdr: &CallDetailRecord,
    ) -> Result<std::result::Result<Vec<OrderRecord>, SkipReason>> {
        if cdr.is_anonymous() {
            tracing::info!(call_id = %call_id, "Anonymous caller, skipping");
            return Ok(Err(SkipReason::AnonymousCaller));
        }

        let Some(raw_caller) = cdr.caller_e164() else {
            tracing::info!(call_id = %call_id, "No caller number, skipping");
            return Ok(Err(SkipReason::AnonymousCaller));
        };

        let phone = NormalizedPhone::normalize(raw_caller);
        if !phone.is_matchable() {
            tracing::info!(call_id = %call_id, phone = %phone, "Unmatchable number, skipping");
            return Ok(Err(SkipReason::UnmatchablePhone));
        }

        Ok(Ok(self.matcher.find_matches(&phone).await?))
    }

    /// Create activities per the fan-out policy; zero matched orders create
    /// a single unlinked activity.
    async fn create_activities(
        &self,
        call_id: &str,
        cdr: &CallDetailRecord,
        orders: &[OrderRecord],
        insights_first: bool,
    ) -> Result<DispatchOutcome> {
        let targets: Vec<Option<String>> = if orders.is_empty() {
            vec![None]
        } else {
            match self.fan_out {
                FanOutPolicy::PerMatch => {
                    orders.iter().map(|order| Some(order.id.clone())).collect()
                }
                FanOutPolicy::FirstMatch => vec![Some(orders[0].id.clone())],
            }
        };

        let mut activity_ids = Vec::with_capacity(targets.len());
        for order_id in targets {
            let activity =
                activity_builder::build_activity(cdr, call_id, order_id.clone(), insights_first);
            let id = self.store.create_activity(&activity).await?;
            tracing::info!(
                call_id = %call_id,
                activity_id = %id,
                order_id = order_id.as_deref().unwrap_or("-"),
                "Activity created"
            );
            activity_ids.push(id);
        }

        Ok(DispatchOutcome::Created { activity_ids })
    }
}
