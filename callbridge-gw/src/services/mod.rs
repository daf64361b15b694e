//! Correlation engine services
//!
//! Leaf-first: the normalizer feeds the matcher, the fetcher supplies the
//! activity builder, and the dispatcher is the only component with
//! orchestration logic.

pub mod activity_builder;
pub mod activity_index;
pub mod cdr_fetcher;
pub mod crm_client;
pub mod dispatcher;
pub mod order_matcher;
pub mod phone;
pub mod telephony_client;

pub use cdr_fetcher::CdrFetcher;
pub use crm_client::{CrmClient, RecordStore};
pub use dispatcher::{DispatchOutcome, EventDispatcher, SkipReason};
pub use telephony_client::{CallDetailApi, TelephonyClient};
