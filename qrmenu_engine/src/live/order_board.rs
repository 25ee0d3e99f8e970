//! The owner's live order board
//!
//! A board keeps the newest orders of one restaurant on display. It runs as a single task that owns the board state:
//! it fetches the list once, then re-fetches the *whole* list whenever the change feed reports an insert, update or
//! delete on that restaurant's orders. There is no incremental patching, so the board cannot drift from what is
//! stored.
//!
//! Readers get snapshots through a `watch` channel. A failed fetch keeps the previous rows and records the error.
//! Dropping (or stopping) the [`BoardHandle`] aborts the task, which ends the subscription and discards any fetch that
//! was still in flight.
use chrono::{DateTime, Utc};
use log::*;
use serde::Serialize;
use tokio::{sync::watch, task::JoinHandle};

use crate::{
    api::{errors::OrderFlowError, order_flow_api::OrderFlowApi},
    db::traits::{ChangeNotifications, OrderManagement},
    db_types::{Order, OrderId},
    events::{ChangeFilter, Notification, Subscription, Table},
    lifecycle::{owner_actions, AvailableAction, OwnerAction},
};

pub const DEFAULT_BOARD_LIMIT: u32 = 200;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardRow {
    #[serde(flatten)]
    pub order: Order,
    /// The legal owner actions for this order. Empty once the order is finished.
    pub actions: Vec<AvailableAction>,
}

impl From<Order> for BoardRow {
    fn from(order: Order) -> Self {
        let actions = owner_actions(order.status);
        Self { order, actions }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardState {
    pub restaurant_id: i64,
    /// False until the first fetch succeeds
    pub loaded: bool,
    /// Newest first
    pub rows: Vec<BoardRow>,
    /// The last fetch error, if the most recent fetch failed. The rows are then stale.
    pub last_error: Option<String>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl BoardState {
    fn new(restaurant_id: i64) -> Self {
        Self { restaurant_id, loaded: false, rows: Vec::new(), last_error: None, refreshed_at: None }
    }

    pub fn row(&self, order_id: &OrderId) -> Option<&BoardRow> {
        self.rows.iter().find(|r| &r.order.id == order_id)
    }
}

pub struct OrderBoard<B> {
    flow: OrderFlowApi<B>,
    restaurant_id: i64,
    limit: u32,
}

impl<B> OrderBoard<B>
where B: OrderManagement + ChangeNotifications + Clone + 'static
{
    pub fn new(flow: OrderFlowApi<B>, restaurant_id: i64) -> Self {
        Self { flow, restaurant_id, limit: DEFAULT_BOARD_LIMIT }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Subscribes to the change feed, then spawns the board task.
    pub fn start(self) -> BoardHandle<B> {
        let filter = ChangeFilter::table(Table::Orders).for_restaurant(self.restaurant_id);
        // Subscribe before the first fetch, so that nothing committed in between is missed
        let subscription = self.flow.db().subscribe(filter);
        let (sender, receiver) = watch::channel(BoardState::new(self.restaurant_id));
        let flow = self.flow.clone();
        let restaurant_id = self.restaurant_id;
        let task = tokio::spawn(self.run(subscription, sender));
        debug!("📋 Order board for restaurant {restaurant_id} started");
        BoardHandle { restaurant_id, flow, receiver, task }
    }

    async fn run(self, mut subscription: Subscription, sender: watch::Sender<BoardState>) {
        let mut state = BoardState::new(self.restaurant_id);
        self.refresh(&mut state).await;
        sender.send_replace(state.clone());
        while let Some(notification) = subscription.next().await {
            match notification {
                Notification::Change(event) => trace!("📋 {:?} on order {:?}", event.kind(), event.order_id()),
                Notification::Lagged(n) => debug!("📋 Missed {n} notifications. Re-fetching anyway"),
            }
            self.refresh(&mut state).await;
            sender.send_replace(state.clone());
        }
        debug!("📋 Change feed closed. Order board for restaurant {} has stopped", self.restaurant_id);
    }

    async fn refresh(&self, state: &mut BoardState) {
        match self.flow.orders_for_restaurant(self.restaurant_id, self.limit).await {
            Ok(orders) => {
                trace!("📋 Board for restaurant {} now shows {} orders", self.restaurant_id, orders.len());
                state.rows = orders.into_iter().map(BoardRow::from).collect();
                state.loaded = true;
                state.last_error = None;
                state.refreshed_at = Some(Utc::now());
            },
            Err(e) => {
                warn!(
                    "📋 Could not refresh the order board for restaurant {}. Showing stale data. {e}",
                    self.restaurant_id
                );
                state.last_error = Some(e.to_string());
            },
        }
    }
}

/// Owns a running board. Dropping the handle stops the board.
pub struct BoardHandle<B> {
    restaurant_id: i64,
    flow: OrderFlowApi<B>,
    receiver: watch::Receiver<BoardState>,
    task: JoinHandle<()>,
}

impl<B> BoardHandle<B> {
    pub fn restaurant_id(&self) -> i64 {
        self.restaurant_id
    }

    pub fn snapshot(&self) -> BoardState {
        self.receiver.borrow().clone()
    }

    /// Waits for the next snapshot. Returns `None` once the board has stopped.
    pub async fn changed(&mut self) -> Option<BoardState> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Waits until a snapshot satisfies `predicate`. Returns `None` if the board stops first.
    pub async fn wait_for<F>(&mut self, predicate: F) -> Option<BoardState>
    where F: FnMut(&BoardState) -> bool {
        self.receiver.wait_for(predicate).await.ok().map(|s| s.clone())
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn stop(self) {
        drop(self)
    }
}

impl<B> BoardHandle<B>
where B: OrderManagement
{
    /// Runs an owner action on one of the board's orders. The board refreshes itself from the resulting change
    /// notification.
    pub async fn perform(&self, order_id: &OrderId, action: OwnerAction) -> Result<Order, OrderFlowError> {
        self.flow.perform_owner_action(self.restaurant_id, order_id, action).await
    }
}

impl<B> Drop for BoardHandle<B> {
    fn drop(&mut self) {
        self.task.abort();
        trace!("📋 Order board for restaurant {} stopped", self.restaurant_id);
    }
}
