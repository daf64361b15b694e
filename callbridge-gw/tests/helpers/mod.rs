//! Shared test fakes: in-memory record store, scripted telephony API and an
//! instant sleeper so retry schedules run without waiting.
#![allow(dead_code)]

use async_trait::async_trait;
use callbridge_common::retry::Sleeper;
use callbridge_common::{Error, Result};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use callbridge_gw::models::{
    ActivityRecord, CallDetailRecord, CallInsights, Direction, ExternalNumber, InsightStatus,
    NewActivity, OrderRecord,
};
use callbridge_gw::services::{CallDetailApi, RecordStore};

/// In-memory record store. The candidate query emulates the store's loose
/// LIKE filter by matching on digit-only containment, so formatting noise in
/// stored values still produces candidates (and false positives, which the
/// matcher must weed out).
#[derive(Default)]
pub struct InMemoryStore {
    pub orders: Vec<OrderRecord>,
    pub activities: Mutex<Vec<ActivityRecord>>,
    pub candidate_queries: AtomicUsize,
    pub fail_writes: AtomicBool,
    next_id: AtomicUsize,
}

impl InMemoryStore {
    pub fn with_orders(orders: Vec<OrderRecord>) -> Self {
        Self {
            orders,
            ..Default::default()
        }
    }

    pub fn activity_snapshot(&self) -> Vec<ActivityRecord> {
        self.activities.lock().unwrap().clone()
    }
}

fn digits(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn find_order_candidates(&self, phone_suffix: &str) -> Result<Vec<OrderRecord>> {
        self.candidate_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .orders
            .iter()
            .filter(|order| digits(&order.phone).contains(phone_suffix))
            .cloned()
            .collect())
    }

    async fn find_activities_by_call_id(&self, call_id: &str) -> Result<Vec<ActivityRecord>> {
        Ok(self
            .activities
            .lock()
            .unwrap()
            .iter()
            .filter(|activity| activity.call_id == call_id)
            .cloned()
            .collect())
    }

    async fn create_activity(&self, activity: &NewActivity) -> Result<String> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Store("write rejected".to_string()));
        }
        let id = format!("task-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.activities.lock().unwrap().push(ActivityRecord {
            id: id.clone(),
            subject: activity.subject.clone(),
            description: activity.description.clone(),
            call_id: activity.call_id.clone(),
            order_id: activity.order_id.clone(),
            duration_secs: activity.duration_secs,
            insights_logged: activity.insights_logged,
        });
        Ok(id)
    }

    async fn update_activity(
        &self,
        activity_id: &str,
        description: &str,
        insights_logged: bool,
    ) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Store("write rejected".to_string()));
        }
        let mut activities = self.activities.lock().unwrap();
        let activity = activities
            .iter_mut()
            .find(|a| a.id == activity_id)
            .ok_or_else(|| Error::NotFound(format!("activity {}", activity_id)))?;
        activity.description = description.to_string();
        activity.insights_logged = insights_logged;
        Ok(())
    }
}

/// Telephony API fake serving a fixed CDR (or nothing)
#[derive(Default)]
pub struct StaticApi {
    pub cdr: Mutex<Option<CallDetailRecord>>,
    pub calls: AtomicUsize,
}

impl StaticApi {
    pub fn serving(cdr: CallDetailRecord) -> Self {
        Self {
            cdr: Mutex::new(Some(cdr)),
            ..Default::default()
        }
    }

    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn set_cdr(&self, cdr: CallDetailRecord) {
        *self.cdr.lock().unwrap() = Some(cdr);
    }
}

#[async_trait]
impl CallDetailApi for StaticApi {
    async fn fetch_cdr(&self, _call_id: &str) -> Result<Option<CallDetailRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.cdr.lock().unwrap().clone())
    }
}

/// Sleeper that never sleeps; retry schedules complete instantly
pub struct InstantSleeper;

#[async_trait]
impl Sleeper for InstantSleeper {
    async fn sleep(&self, _duration: Duration) {}
}

pub fn order(id: &str, phone: &str) -> OrderRecord {
    OrderRecord {
        id: id.to_string(),
        name: format!("WO-{id}"),
        phone: phone.to_string(),
    }
}

pub fn answered_cdr(call_id: &str, caller: &str) -> CallDetailRecord {
    CallDetailRecord {
        call_id: Some(call_id.to_string()),
        direction: Some(Direction::Inbound),
        status: Some("ANSWERED".to_string()),
        duration: 205,
        external_number: Some(ExternalNumber {
            e164: Some(caller.to_string()),
            localized: None,
            anonymous: false,
        }),
        ..Default::default()
    }
}

pub fn anonymous_cdr(call_id: &str) -> CallDetailRecord {
    CallDetailRecord {
        call_id: Some(call_id.to_string()),
        direction: Some(Direction::Inbound),
        status: Some("MISSED".to_string()),
        external_number: Some(ExternalNumber {
            anonymous: true,
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn available_insights() -> CallInsights {
    CallInsights {
        status: Some(InsightStatus::Available),
        summary: Some("Klant belde over de levering.".to_string()),
        custom_summary: None,
        sentiment: Some("POSITIVE".to_string()),
        topics: vec!["levering".to_string()],
    }
}
