//! Dispatcher integration tests against in-memory collaborators
//!
//! Covers the create/append/skip decisions per event kind, graceful
//! degradation when the upstream CDR never materializes, fan-out policy and
//! idempotent insights redelivery.

mod helpers;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use callbridge_common::config::FanOutPolicy;
use callbridge_common::retry::RetryPolicy;
use callbridge_gw::models::ExternalCallEvent;
use callbridge_gw::services::{CdrFetcher, DispatchOutcome, EventDispatcher, SkipReason};

use helpers::{
    answered_cdr, anonymous_cdr, available_insights, order, InMemoryStore, InstantSleeper,
    StaticApi,
};

fn dispatcher(
    store: Arc<InMemoryStore>,
    api: Arc<StaticApi>,
    fan_out: FanOutPolicy,
) -> EventDispatcher {
    let policy = RetryPolicy::new(3, Duration::ZERO, Duration::ZERO);
    let fetcher = CdrFetcher::new(api, policy, Arc::new(InstantSleeper));
    EventDispatcher::new(fetcher, store, fan_out)
}

fn call_ended_event(call_id: &str) -> ExternalCallEvent {
    serde_json::from_str(&format!(r#"{{"id": "{call_id}", "cause": "ANSWERED"}}"#)).unwrap()
}

#[tokio::test]
async fn matched_call_creates_linked_activity() {
    let store = Arc::new(InMemoryStore::with_orders(vec![
        order("a01", "06 53233740"),
        order("a02", "0101234567"),
    ]));
    let api = Arc::new(StaticApi::serving(answered_cdr(
        "call-1",
        "*31 6 - 53233740 (Kristel)",
    )));
    let dispatcher = dispatcher(store.clone(), api, FanOutPolicy::PerMatch);

    let outcome = dispatcher
        .handle_call_ended(&call_ended_event("call-1"))
        .await
        .unwrap();

    assert!(matches!(outcome, DispatchOutcome::Created { ref activity_ids } if activity_ids.len() == 1));
    let activities = store.activity_snapshot();
    assert_eq!(activities.len(), 1);
    assert_eq!(activities[0].order_id.as_deref(), Some("a01"));
    assert_eq!(activities[0].call_id, "call-1");
    assert!(activities[0].subject.contains("Inkomend"));
    assert!(activities[0].description.contains("3m 25s"));
}

#[tokio::test]
async fn unmatched_call_still_creates_exactly_one_unlinked_activity() {
    let store = Arc::new(InMemoryStore::with_orders(vec![order("a01", "0101234567")]));
    let api = Arc::new(StaticApi::serving(answered_cdr("call-2", "+31653233740")));
    let dispatcher = dispatcher(store.clone(), api, FanOutPolicy::PerMatch);

    let outcome = dispatcher
        .handle_call_ended(&call_ended_event("call-2"))
        .await
        .unwrap();

    assert!(matches!(outcome, DispatchOutcome::Created { .. }));
    let activities = store.activity_snapshot();
    assert_eq!(activities.len(), 1);
    assert_eq!(activities[0].order_id, None);
}

#[tokio::test]
async fn fan_out_policy_controls_multi_match_behavior() {
    let orders = vec![order("a01", "06 53233740"), order("a02", "+31 6 53233740")];

    let store = Arc::new(InMemoryStore::with_orders(orders.clone()));
    let api = Arc::new(StaticApi::serving(answered_cdr("call-3", "+31653233740")));
    let per_match = dispatcher(store.clone(), api, FanOutPolicy::PerMatch);
    per_match
        .handle_call_ended(&call_ended_event("call-3"))
        .await
        .unwrap();
    assert_eq!(store.activity_snapshot().len(), 2);

    let store = Arc::new(InMemoryStore::with_orders(orders));
    let api = Arc::new(StaticApi::serving(answered_cdr("call-3", "+31653233740")));
    let first_match = dispatcher(store.clone(), api, FanOutPolicy::FirstMatch);
    first_match
        .handle_call_ended(&call_ended_event("call-3"))
        .await
        .unwrap();
    let activities = store.activity_snapshot();
    assert_eq!(activities.len(), 1);
    assert_eq!(activities[0].order_id.as_deref(), Some("a01"));
}

#[tokio::test]
async fn anonymous_caller_is_skipped_without_activity() {
    let store = Arc::new(InMemoryStore::with_orders(vec![order("a01", "06 53233740")]));
    let api = Arc::new(StaticApi::serving(anonymous_cdr("call-4")));
    let dispatcher = dispatcher(store.clone(), api, FanOutPolicy::PerMatch);

    let outcome = dispatcher
        .handle_call_ended(&call_ended_event("call-4"))
        .await
        .unwrap();

    assert_eq!(outcome, DispatchOutcome::Skipped(SkipReason::AnonymousCaller));
    assert!(store.activity_snapshot().is_empty());
    assert_eq!(store.candidate_queries.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn short_number_is_skipped_without_store_query() {
    let store = Arc::new(InMemoryStore::with_orders(vec![order("a01", "12345")]));
    let api = Arc::new(StaticApi::serving(answered_cdr("call-5", "12345")));
    let dispatcher = dispatcher(store.clone(), api, FanOutPolicy::PerMatch);

    let outcome = dispatcher
        .handle_call_ended(&call_ended_event("call-5"))
        .await
        .unwrap();

    assert_eq!(outcome, DispatchOutcome::Skipped(SkipReason::UnmatchablePhone));
    assert!(store.activity_snapshot().is_empty());
    assert_eq!(store.candidate_queries.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_cdr_degrades_to_webhook_fields() {
    let store = Arc::new(InMemoryStore::with_orders(vec![order("a01", "06 53233740")]));
    let api = Arc::new(StaticApi::unavailable());
    let dispatcher = dispatcher(store.clone(), api.clone(), FanOutPolicy::PerMatch);

    let event: ExternalCallEvent = serde_json::from_str(
        r#"{"id": "call-6", "direction": "inbound", "from": "+31653233740", "cause": "MISSED"}"#,
    )
    .unwrap();

    let outcome = dispatcher.handle_call_ended(&event).await.unwrap();

    // All three fetch attempts ran before degrading
    assert_eq!(api.calls.load(Ordering::SeqCst), 3);
    assert!(matches!(outcome, DispatchOutcome::Created { .. }));
    let activities = store.activity_snapshot();
    assert_eq!(activities.len(), 1);
    assert_eq!(activities[0].order_id.as_deref(), Some("a01"));
    assert_eq!(activities[0].duration_secs, 0);
    assert!(activities[0].subject.contains("Gemist"));
}

#[tokio::test]
async fn empty_call_id_is_a_terminal_skip() {
    let store = Arc::new(InMemoryStore::default());
    let api = Arc::new(StaticApi::unavailable());
    let dispatcher = dispatcher(store.clone(), api, FanOutPolicy::PerMatch);

    let outcome = dispatcher
        .handle_call_ended(&ExternalCallEvent::default())
        .await
        .unwrap();
    assert_eq!(outcome, DispatchOutcome::Skipped(SkipReason::EmptyCallId));

    let outcome = dispatcher
        .handle_call_insights(&ExternalCallEvent::default())
        .await
        .unwrap();
    assert_eq!(outcome, DispatchOutcome::Skipped(SkipReason::EmptyCallId));
}

#[tokio::test]
async fn insights_append_preserves_original_description() {
    let store = Arc::new(InMemoryStore::with_orders(vec![order("a01", "06 53233740")]));
    let api = Arc::new(StaticApi::serving(answered_cdr("call-7", "+31653233740")));
    let dispatcher = dispatcher(store.clone(), api.clone(), FanOutPolicy::PerMatch);

    dispatcher
        .handle_call_ended(&call_ended_event("call-7"))
        .await
        .unwrap();
    let original = store.activity_snapshot()[0].description.clone();

    // Insights become available on the CDR afterwards
    let mut cdr = answered_cdr("call-7", "+31653233740");
    cdr.insights = Some(available_insights());
    api.set_cdr(cdr);

    let outcome = dispatcher
        .handle_call_insights(&call_ended_event("call-7"))
        .await
        .unwrap();

    assert!(matches!(outcome, DispatchOutcome::Updated { .. }));
    let updated = &store.activity_snapshot()[0];
    assert!(updated.description.starts_with(original.trim_end()));
    assert!(updated.description.contains("Samenvatting"));
    assert!(updated.insights_logged);
}

#[tokio::test]
async fn redelivered_insights_do_not_duplicate_the_block() {
    let store = Arc::new(InMemoryStore::with_orders(vec![order("a01", "06 53233740")]));
    let mut cdr = answered_cdr("call-8", "+31653233740");
    cdr.insights = Some(available_insights());
    let api = Arc::new(StaticApi::serving(cdr));
    let dispatcher = dispatcher(store.clone(), api, FanOutPolicy::PerMatch);

    dispatcher
        .handle_call_ended(&call_ended_event("call-8"))
        .await
        .unwrap();

    let outcome = dispatcher
        .handle_call_insights(&call_ended_event("call-8"))
        .await
        .unwrap();
    assert_eq!(outcome, DispatchOutcome::AlreadyLogged);

    let description = &store.activity_snapshot()[0].description;
    assert_eq!(description.matches("Samenvatting").count(), 1);
}

#[tokio::test]
async fn insights_before_call_ended_creates_on_demand() {
    let store = Arc::new(InMemoryStore::with_orders(vec![order("a01", "06 53233740")]));
    let mut cdr = answered_cdr("call-9", "+31653233740");
    cdr.insights = Some(available_insights());
    let api = Arc::new(StaticApi::serving(cdr));
    let dispatcher = dispatcher(store.clone(), api, FanOutPolicy::PerMatch);

    let outcome = dispatcher
        .handle_call_insights(&call_ended_event("call-9"))
        .await
        .unwrap();

    assert!(matches!(outcome, DispatchOutcome::Created { .. }));
    let activities = store.activity_snapshot();
    assert_eq!(activities.len(), 1);
    // Created from an insights event: the block leads the description
    assert!(activities[0].description.starts_with("--- AI-inzichten ---"));
    assert!(activities[0].insights_logged);
}

#[tokio::test]
async fn insights_with_no_cdr_and_no_activity_reports_not_found() {
    let store = Arc::new(InMemoryStore::default());
    let api = Arc::new(StaticApi::unavailable());
    let dispatcher = dispatcher(store, api, FanOutPolicy::PerMatch);

    let outcome = dispatcher
        .handle_call_insights(&call_ended_event("call-10"))
        .await
        .unwrap();

    assert_eq!(outcome, DispatchOutcome::NotFound);
}

#[tokio::test]
async fn store_write_failure_propagates() {
    let store = Arc::new(InMemoryStore::with_orders(vec![order("a01", "06 53233740")]));
    store.fail_writes.store(true, Ordering::SeqCst);
    let api = Arc::new(StaticApi::serving(answered_cdr("call-11", "+31653233740")));
    let dispatcher = dispatcher(store.clone(), api, FanOutPolicy::PerMatch);

    let result = dispatcher.handle_call_ended(&call_ended_event("call-11")).await;

    assert!(result.is_err());
    assert!(store.activity_snapshot().is_empty());
}
