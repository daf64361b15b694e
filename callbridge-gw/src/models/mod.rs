//! Domain and wire types for the callbridge gateway

pub mod activity;
pub mod cdr;
pub mod event;
pub mod order;

pub use activity::{ActivityRecord, NewActivity};
pub use cdr::{
    AgentRef, CallDetailRecord, CallInsights, CallOutcome, Direction, ExternalNumber,
    InsightStatus, MediaLink,
};
pub use event::{EventKind, ExternalCallEvent};
pub use order::OrderRecord;
