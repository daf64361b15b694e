//! Call Detail Record types as served by the upstream telephony API
//!
//! The CDR is owned by the upstream service; this crate only reads it. The
//! record may not be fully populated at webhook-arrival time, so every field
//! tolerates absence and [`CallDetailRecord::has_usable_caller`] decides
//! whether a fetched record is safe to use yet.

use serde::{Deserialize, Serialize};

/// Call direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
}

/// The remote party's number. `anonymous` is set when the caller withheld
/// their number; in that case both number fields are absent.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalNumber {
    #[serde(default)]
    pub e164: Option<String>,
    #[serde(default)]
    pub localized: Option<String>,
    #[serde(default)]
    pub anonymous: bool,
}

impl ExternalNumber {
    /// Preferred display form: localized when present, E.164 otherwise
    pub fn display(&self) -> Option<&str> {
        self.localized.as_deref().or(self.e164.as_deref())
    }
}

/// Agent who handled the call
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRef {
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Playable media attached to a call (recording or voicemail)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaLink {
    #[serde(default)]
    pub play_url: Option<String>,
    /// ISO-8601 timestamp; only the date part is rendered
    #[serde(default)]
    pub available_until: Option<String>,
}

/// AI-insight processing state on a CDR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InsightStatus {
    Available,
    InProgress,
    Pending,
    #[serde(other)]
    Unknown,
}

/// AI-insight sub-record on a CDR
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallInsights {
    #[serde(default)]
    pub status: Option<InsightStatus>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub custom_summary: Option<String>,
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
}

impl CallInsights {
    pub fn is_available(&self) -> bool {
        self.status == Some(InsightStatus::Available)
    }
}

/// Authoritative record of a completed call, keyed by external call id
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallDetailRecord {
    #[serde(default)]
    pub call_id: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub direction: Option<Direction>,
    /// Raw outcome code, e.g. `ANSWERED`, `MISSED`, `OUT_OF_HOURS`
    #[serde(default)]
    pub status: Option<String>,
    /// Duration in seconds
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub external_number: Option<ExternalNumber>,
    /// The dialed (callee) number
    #[serde(default)]
    pub internal_number: Option<ExternalNumber>,
    #[serde(default)]
    pub user: Option<AgentRef>,
    #[serde(default)]
    pub call_recording: Option<MediaLink>,
    #[serde(default)]
    pub voicemail: Option<MediaLink>,
    #[serde(default)]
    pub insights: Option<CallInsights>,
}

impl CallDetailRecord {
    /// Whether the record is safe to use: the caller number is populated or
    /// the caller is explicitly marked anonymous. Anything else means the
    /// upstream write has not finished yet.
    pub fn has_usable_caller(&self) -> bool {
        match &self.external_number {
            Some(ext) => ext.anonymous || ext.e164.is_some(),
            None => false,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.external_number
            .as_ref()
            .map(|ext| ext.anonymous)
            .unwrap_or(false)
    }

    /// Raw caller number in E.164 form, if known
    pub fn caller_e164(&self) -> Option<&str> {
        self.external_number.as_ref().and_then(|ext| ext.e164.as_deref())
    }

    /// Outcome parsed from the raw status code; absent status reads as answered
    pub fn outcome(&self) -> CallOutcome {
        self.status
            .as_deref()
            .map(CallOutcome::from_code)
            .unwrap_or(CallOutcome::Answered)
    }
}

/// Call outcome derived from the CDR status code.
///
/// Everything except [`CallOutcome::Answered`] counts as a non-answer and
/// switches the activity subject to the missed phrasing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    Answered,
    Missed,
    Busy,
    Voicemail,
    AnsweringService,
    OutsideOperatingHours,
    Other(String),
}

impl CallOutcome {
    pub fn from_code(code: &str) -> Self {
        match code.to_ascii_uppercase().as_str() {
            "ANSWERED" => CallOutcome::Answered,
            "MISSED" | "NO_ANSWER" => CallOutcome::Missed,
            "BUSY" => CallOutcome::Busy,
            "VOICEMAIL" => CallOutcome::Voicemail,
            "ANSWERING_SERVICE" => CallOutcome::AnsweringService,
            "OUT_OF_HOURS" | "OUTSIDE_OPERATING_HOURS" => CallOutcome::OutsideOperatingHours,
            _ => CallOutcome::Other(code.to_string()),
        }
    }

    pub fn is_answered(&self) -> bool {
        matches!(self, CallOutcome::Answered)
    }

    /// Localized (Dutch) outcome label for the activity text
    pub fn label(&self) -> &str {
        match self {
            CallOutcome::Answered => "Beantwoord",
            CallOutcome::Missed => "Gemist",
            CallOutcome::Busy => "Bezet",
            CallOutcome::Voicemail => "Voicemail",
            CallOutcome::AnsweringService => "Antwoordservice",
            CallOutcome::OutsideOperatingHours => "Buiten openingstijden",
            CallOutcome::Other(code) => code,
        }
    }
}
