//! The "last active order" pointer
//!
//! A customer's session remembers at most one order id: the order they placed most recently and have not yet seen
//! finish. It is written when checkout succeeds and cleared when the tracker observes a terminal status. It is used to
//! bring back the "track my order" banner after a reload.
use std::sync::{Arc, Mutex, MutexGuard};

use log::trace;

use crate::db_types::OrderId;

pub trait ActiveOrderStore: Send + Sync {
    fn get(&self) -> Option<OrderId>;

    fn set(&self, order_id: OrderId);

    /// Removes the pointer. Clearing an empty pointer is a no-op.
    fn clear(&self);

    /// Clears the pointer only if it still refers to `order_id`, so that finishing an old order does not hide the
    /// banner of a newer one. Returns whether the pointer was cleared.
    fn clear_if(&self, order_id: &OrderId) -> bool {
        if self.get().as_ref() == Some(order_id) {
            self.clear();
            true
        } else {
            false
        }
    }
}

/// A per-session pointer held in memory. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryActiveOrderStore {
    slot: Arc<Mutex<Option<OrderId>>>,
}

impl MemoryActiveOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<OrderId>> {
        // The slot holds plain data, so a panic elsewhere cannot leave it half-written
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ActiveOrderStore for MemoryActiveOrderStore {
    fn get(&self) -> Option<OrderId> {
        self.lock().clone()
    }

    fn set(&self, order_id: OrderId) {
        trace!("🛵 Active order is now {order_id}");
        *self.lock() = Some(order_id);
    }

    fn clear(&self) {
        if self.lock().take().is_some() {
            trace!("🛵 Active order cleared");
        }
    }
}
