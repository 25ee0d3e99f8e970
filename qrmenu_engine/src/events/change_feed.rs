//! Row-level change notifications
//!
//! Every committed write to the orders, menu item or inventory tables is published on a single broadcast channel as a
//! [`ChangeEvent`]. Consumers subscribe with a [`ChangeFilter`] (table, optional event kind, optional column equality)
//! and only see matching events. Subscribers that fall behind are told so with [`Notification::Lagged`] instead of
//! silently missing rows; the order board uses that as a cue to re-query.
use std::{fmt::Display, sync::Arc};

use log::*;
use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::db_types::{InventoryItem, MenuItem, Order, OrderId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Orders,
    MenuItems,
    Inventory,
}

impl Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Table::Orders => write!(f, "orders"),
            Table::MenuItems => write!(f, "menu_items"),
            Table::Inventory => write!(f, "inventory_items"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "UPPERCASE")]
pub enum RowChange<T> {
    Insert { new: T },
    Update { old: T, new: T },
    Delete { old: T },
}

impl<T> RowChange<T> {
    pub fn kind(&self) -> ChangeKind {
        match self {
            RowChange::Insert { .. } => ChangeKind::Insert,
            RowChange::Update { .. } => ChangeKind::Update,
            RowChange::Delete { .. } => ChangeKind::Delete,
        }
    }

    /// The row as it is after the change. For deletes this is the row that was removed.
    pub fn latest(&self) -> &T {
        match self {
            RowChange::Insert { new } | RowChange::Update { new, .. } => new,
            RowChange::Delete { old } => old,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "table", content = "change", rename_all = "snake_case")]
pub enum ChangeEvent {
    Orders(RowChange<Order>),
    MenuItems(RowChange<MenuItem>),
    Inventory(RowChange<InventoryItem>),
}

impl ChangeEvent {
    pub fn table(&self) -> Table {
        match self {
            ChangeEvent::Orders(_) => Table::Orders,
            ChangeEvent::MenuItems(_) => Table::MenuItems,
            ChangeEvent::Inventory(_) => Table::Inventory,
        }
    }

    pub fn kind(&self) -> ChangeKind {
        match self {
            ChangeEvent::Orders(c) => c.kind(),
            ChangeEvent::MenuItems(c) => c.kind(),
            ChangeEvent::Inventory(c) => c.kind(),
        }
    }

    pub fn restaurant_id(&self) -> i64 {
        match self {
            ChangeEvent::Orders(c) => c.latest().restaurant_id,
            ChangeEvent::MenuItems(c) => c.latest().restaurant_id,
            ChangeEvent::Inventory(c) => c.latest().restaurant_id,
        }
    }

    pub fn order_id(&self) -> Option<&OrderId> {
        match self {
            ChangeEvent::Orders(c) => Some(&c.latest().id),
            _ => None,
        }
    }

    /// The updated order, if this is an update to an order row
    pub fn updated_order(&self) -> Option<&Order> {
        match self {
            ChangeEvent::Orders(RowChange::Update { new, .. }) => Some(new),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnFilter {
    RestaurantId(i64),
    OrderId(OrderId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeFilter {
    pub table: Table,
    pub kind: Option<ChangeKind>,
    pub column: Option<ColumnFilter>,
}

impl ChangeFilter {
    pub fn table(table: Table) -> Self {
        Self { table, kind: None, column: None }
    }

    pub fn with_kind(mut self, kind: ChangeKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn for_restaurant(mut self, restaurant_id: i64) -> Self {
        self.column = Some(ColumnFilter::RestaurantId(restaurant_id));
        self
    }

    pub fn for_order(mut self, order_id: OrderId) -> Self {
        self.column = Some(ColumnFilter::OrderId(order_id));
        self
    }

    pub fn matches(&self, event: &ChangeEvent) -> bool {
        if event.table() != self.table {
            return false;
        }
        if matches!(self.kind, Some(kind) if kind != event.kind()) {
            return false;
        }
        match &self.column {
            None => true,
            Some(ColumnFilter::RestaurantId(id)) => event.restaurant_id() == *id,
            Some(ColumnFilter::OrderId(id)) => event.order_id() == Some(id),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Notification {
    Change(Arc<ChangeEvent>),
    /// The subscriber fell behind and this many events were dropped. Some of them may have matched the filter.
    Lagged(u64),
}

/// The publishing half of the change feed. Cheap to clone; all clones share one channel.
#[derive(Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<Arc<ChangeEvent>>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn publish(&self, event: ChangeEvent) {
        let table = event.table();
        let kind = event.kind();
        match self.sender.send(Arc::new(event)) {
            Ok(n) => trace!("📡 {kind:?} on {table} delivered to {n} subscriber(s)"),
            Err(_) => trace!("📡 {kind:?} on {table} dropped. Nobody is listening"),
        }
    }

    pub fn subscribe(&self, filter: ChangeFilter) -> Subscription {
        debug!("📡 New subscription on {} ({:?}, {:?})", filter.table, filter.kind, filter.column);
        Subscription { filter, receiver: self.sender.subscribe() }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(256)
    }
}

/// A filtered view of the change feed. Dropping it unsubscribes.
pub struct Subscription {
    filter: ChangeFilter,
    receiver: broadcast::Receiver<Arc<ChangeEvent>>,
}

impl Subscription {
    pub fn filter(&self) -> &ChangeFilter {
        &self.filter
    }

    /// Waits for the next matching notification. Returns `None` once the feed has been closed.
    pub async fn next(&mut self) -> Option<Notification> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(Notification::Change(event)),
                Ok(_) => continue,
                Err(RecvError::Lagged(n)) => {
                    warn!("📡 Subscriber on {} lagged behind by {n} events", self.filter.table);
                    return Some(Notification::Lagged(n));
                },
                Err(RecvError::Closed) => {
                    debug!("📡 Change feed closed");
                    return None;
                },
            }
        }
    }
}
