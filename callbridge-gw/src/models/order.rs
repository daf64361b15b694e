//! Stored order record, as returned by the downstream record store

/// An order/customer record with an inconsistently formatted phone field.
/// Immutable from the engine's perspective.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    pub id: String,
    pub name: String,
    /// Raw stored phone value; normalized in-process before comparison
    pub phone: String,
}
