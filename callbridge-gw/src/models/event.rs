//! Inbound webhook notification types
//!
//! An [`ExternalCallEvent`] is transient: it exists only for the duration of
//! one dispatch. The call id is the correlation key linking the event to its
//! CDR and to any created activity.

use serde::Deserialize;

use super::cdr::{CallDetailRecord, Direction, ExternalNumber};

/// The two notification kinds delivered to the webhook ingress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    CallEnded,
    CallInsights,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::CallEnded => "call-ended",
            EventKind::CallInsights => "call-insights",
        }
    }
}

/// Webhook notification payload.
///
/// Only `id` is required for correlation; everything else is best-effort
/// data the sender happened to include.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalCallEvent {
    /// External call identifier (correlation key)
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub direction: Option<Direction>,
    /// Caller number as supplied by the notification, if any
    #[serde(default, alias = "from")]
    pub caller_number: Option<String>,
    /// Raw hangup/outcome cause code
    #[serde(default)]
    pub cause: Option<String>,
    /// Raw insight payload carried on `call-insights` notifications
    #[serde(default)]
    pub insights: Option<serde_json::Value>,
}

impl ExternalCallEvent {
    pub fn has_call_id(&self) -> bool {
        !self.id.trim().is_empty()
    }

    /// Degraded CDR stand-in built from webhook-supplied fields, used when
    /// the authoritative record never became available within the retry
    /// budget. Duration stays zero; the call is still logged.
    pub fn to_fallback_cdr(&self) -> CallDetailRecord {
        CallDetailRecord {
            call_id: Some(self.id.clone()),
            direction: self.direction,
            status: self.cause.clone(),
            external_number: self.caller_number.as_ref().map(|number| ExternalNumber {
                e164: Some(number.clone()),
                localized: None,
                anonymous: false,
            }),
            ..Default::default()
        }
    }
}
