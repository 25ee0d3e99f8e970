//! The customer's live order tracker
//!
//! A tracker follows exactly one order. It fetches the order and the restaurant's branding once, then subscribes to
//! updates on that order id and replaces its view with each update's payload. Nothing is re-fetched unless the
//! subscription lagged.
//!
//! Once the order reaches a terminal status the tracker clears the active-order pointer (if it still points at this
//! order) and stops. To follow a different order, stop this tracker and start another one.
use std::sync::Arc;

use log::*;
use serde::Serialize;
use tokio::{sync::watch, task::JoinHandle};

use crate::{
    db::traits::{ChangeNotifications, OrderManagement, RestaurantManagement},
    db_types::{Order, OrderId, OrderStatusType, PublicBranding},
    events::{ChangeFilter, ChangeKind, Notification, Subscription, Table},
    lifecycle::{progress, terminal_message, ProgressStep},
    live::ActiveOrderStore,
};

/// An order as the customer sees it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackedOrder {
    pub order: Order,
    /// `None` for cancelled orders, which show the terminal message instead
    pub progress: Option<Vec<ProgressStep>>,
    pub is_terminal: bool,
    pub terminal_message: Option<String>,
}

impl From<Order> for TrackedOrder {
    fn from(order: Order) -> Self {
        let status = order.status;
        Self {
            order,
            progress: progress(status),
            is_terminal: status.is_terminal(),
            terminal_message: terminal_message(status).map(String::from),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TrackerView {
    Loading,
    NotFound,
    Tracking(TrackedOrder),
}

impl TrackerView {
    pub fn order(&self) -> Option<&Order> {
        match self {
            TrackerView::Tracking(t) => Some(&t.order),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        match self {
            TrackerView::Tracking(t) => t.is_terminal,
            TrackerView::NotFound => true,
            TrackerView::Loading => false,
        }
    }
}

impl From<Option<Order>> for TrackerView {
    fn from(order: Option<Order>) -> Self {
        order.map(|o| TrackerView::Tracking(o.into())).unwrap_or(TrackerView::NotFound)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackerState {
    pub order_id: OrderId,
    pub view: TrackerView,
    pub branding: Option<PublicBranding>,
    pub last_error: Option<String>,
}

impl TrackerState {
    fn new(order_id: OrderId) -> Self {
        Self { order_id, view: TrackerView::Loading, branding: None, last_error: None }
    }

    pub fn status(&self) -> Option<OrderStatusType> {
        self.view.order().map(|o| o.status)
    }

    /// Replaces the view with `order`, unless the view already holds a newer version of it. Returns whether the view
    /// changed.
    fn apply(&mut self, order: Order) -> bool {
        if matches!(self.view.order(), Some(current) if current.updated_at > order.updated_at) {
            return false;
        }
        self.view = TrackerView::Tracking(order.into());
        self.last_error = None;
        true
    }
}

pub struct OrderTracker<B> {
    db: B,
    order_id: OrderId,
    active_order: Option<Arc<dyn ActiveOrderStore>>,
}

impl<B> OrderTracker<B>
where B: OrderManagement + RestaurantManagement + ChangeNotifications + Clone + 'static
{
    pub fn new(db: B, order_id: OrderId) -> Self {
        Self { db, order_id, active_order: None }
    }

    /// The pointer to clear once the order is finished
    pub fn with_active_order(mut self, store: Arc<dyn ActiveOrderStore>) -> Self {
        self.active_order = Some(store);
        self
    }

    pub fn start(self) -> TrackerHandle {
        let filter =
            ChangeFilter::table(Table::Orders).with_kind(ChangeKind::Update).for_order(self.order_id.clone());
        let subscription = self.db.subscribe(filter);
        let order_id = self.order_id.clone();
        let (sender, receiver) = watch::channel(TrackerState::new(order_id.clone()));
        let task = tokio::spawn(self.run(subscription, sender));
        debug!("🛵 Tracking order {order_id}");
        TrackerHandle { order_id, receiver, task }
    }

    async fn run(self, mut subscription: Subscription, sender: watch::Sender<TrackerState>) {
        let mut state = TrackerState::new(self.order_id.clone());
        self.fetch_order(&mut state).await;
        if matches!(state.view, TrackerView::NotFound) {
            sender.send_replace(state);
            info!("🛵 Order {} does not exist. Nothing to track", self.order_id);
            return;
        }
        self.fetch_branding(&mut state).await;
        sender.send_replace(state.clone());
        if self.finish_if_terminal(&state) {
            return;
        }
        while let Some(notification) = subscription.next().await {
            match notification {
                Notification::Change(event) => match event.updated_order() {
                    Some(order) => self.apply(&mut state, order),
                    None => continue,
                },
                Notification::Lagged(n) => {
                    debug!("🛵 Missed {n} notifications while tracking {}. Re-fetching", self.order_id);
                    self.fetch_order(&mut state).await;
                },
            }
            if state.branding.is_none() {
                self.fetch_branding(&mut state).await;
            }
            sender.send_replace(state.clone());
            if self.finish_if_terminal(&state) {
                return;
            }
        }
        debug!("🛵 Change feed closed. Tracker for {} has stopped", self.order_id);
    }

    async fn fetch_order(&self, state: &mut TrackerState) {
        match self.db.fetch_order(&self.order_id).await {
            Ok(Some(order)) => {
                state.view = TrackerView::Tracking(order.into());
                state.last_error = None;
            },
            Ok(None) => state.view = TrackerView::NotFound,
            Err(e) => {
                warn!("🛵 Could not fetch order {}. {e}", self.order_id);
                state.last_error = Some(e.to_string());
            },
        }
    }

    async fn fetch_branding(&self, state: &mut TrackerState) {
        let Some(restaurant_id) = state.view.order().map(|o| o.restaurant_id) else {
            return;
        };
        match self.db.fetch_restaurant(restaurant_id).await {
            Ok(restaurant) => state.branding = restaurant.as_ref().map(PublicBranding::from),
            Err(e) => warn!("🛵 Could not fetch branding for restaurant {restaurant_id}. {e}"),
        }
    }

    fn apply(&self, state: &mut TrackerState, order: &Order) {
        if state.apply(order.clone()) {
            trace!("🛵 Order {} is now {}", self.order_id, order.status);
        } else {
            trace!("🛵 Ignoring an out-of-date update to {}", self.order_id);
        }
    }

    fn finish_if_terminal(&self, state: &TrackerState) -> bool {
        if !state.view.is_terminal() {
            return false;
        }
        if let Some(store) = &self.active_order {
            if store.clear_if(&self.order_id) {
                debug!("🛵 Order {} is finished. Active order cleared", self.order_id);
            }
        }
        info!("🛵 Order {} is finished. Tracker stopped", self.order_id);
        true
    }
}

/// Owns a running tracker. Dropping the handle stops it.
pub struct TrackerHandle {
    order_id: OrderId,
    receiver: watch::Receiver<TrackerState>,
    task: JoinHandle<()>,
}

impl TrackerHandle {
    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    pub fn snapshot(&self) -> TrackerState {
        self.receiver.borrow().clone()
    }

    /// Waits for the next snapshot. Returns `None` once the tracker has stopped and the last snapshot was seen.
    pub async fn changed(&mut self) -> Option<TrackerState> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Waits until a snapshot satisfies `predicate`. Returns `None` if the tracker stops first.
    pub async fn wait_for<F>(&mut self, predicate: F) -> Option<TrackerState>
    where F: FnMut(&TrackerState) -> bool {
        self.receiver.wait_for(predicate).await.ok().map(|s| s.clone())
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn stop(self) {
        drop(self)
    }
}

impl Drop for TrackerHandle {
    fn drop(&mut self) {
        self.task.abort();
        trace!("🛵 Tracker for {} dropped", self.order_id);
    }
}
