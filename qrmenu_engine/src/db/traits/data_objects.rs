use crate::db_types::Order;

/// The outcome of a compare-and-set status update.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusUpdateResult {
    /// The status matched the expected value and has been changed.
    Updated { old: Order, new: Order },
    /// The status had already moved on. The order, as currently stored, is returned.
    Conflict(Order),
    /// No order with the given id exists.
    NotFound,
}
