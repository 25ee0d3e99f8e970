use crate::events::{ChangeFilter, Subscription};

/// Access to the backend's row-level change feed.
pub trait ChangeNotifications: Send + Sync {
    /// Opens a subscription that only yields events matching `filter`. Dropping the subscription closes it.
    fn subscribe(&self, filter: ChangeFilter) -> Subscription;
}
