//! Activity records written against matched orders
//!
//! One non-duplicate activity exists per external call id: created once on
//! `call-ended` (or on-demand from `call-insights`), then looked up by
//! correlation key and mutated in place, never duplicated.

/// An activity record already present in the store
#[derive(Debug, Clone)]
pub struct ActivityRecord {
    pub id: String,
    pub subject: String,
    pub description: String,
    /// Correlation key (external call id)
    pub call_id: String,
    /// Linked order, if the call correlated to one
    pub order_id: Option<String>,
    pub duration_secs: u64,
    /// Set once the AI-insights block has been appended; gates redelivery
    pub insights_logged: bool,
}

/// A new activity to be created in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivity {
    pub subject: String,
    pub description: String,
    pub call_id: String,
    pub order_id: Option<String>,
    pub duration_secs: u64,
    /// "Inbound" / "Outbound" for the store's call-type field
    pub call_type: String,
    pub insights_logged: bool,
}
