use std::fmt::Debug;

use log::*;

use crate::{
    api::errors::OrderFlowError,
    db::traits::{OrderManagement, StatusUpdateResult},
    db_types::{NewOrder, Order, OrderId, OrderStatusType},
    events::{EventProducers, OrderCreatedEvent, OrderStatusChangedEvent},
    lifecycle::{can_transition, may_trigger, Actor, OwnerAction},
};

/// `OrderFlowApi` is the primary API for creating orders and moving them through their lifecycle.
///
/// Every status change goes through [`Self::transition_order`] (or one of its wrappers), which is the single place
/// where transition legality and actor permissions are checked. The write itself is a compare-and-set on the status,
/// so two owners clicking at the same time cannot both win.
#[derive(Clone)]
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> OrderFlowApi<B>
where B: OrderManagement
{
    /// Stores a brand-new order in a single insert. The order starts out `pending`.
    pub async fn place_order(&self, order: NewOrder) -> Result<Order, OrderFlowError> {
        let order = self.db.insert_order(order).await?;
        info!(
            "🔄️📦️ Order {} placed at restaurant {} for {} ({} item(s))",
            order.id,
            order.restaurant_id,
            order.total_amount,
            order.item_count()
        );
        self.producers.publish_order_created(OrderCreatedEvent::new(order.clone())).await;
        Ok(order)
    }

    pub async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderFlowError> {
        Ok(self.db.fetch_order(order_id).await?)
    }

    /// Fetches an order on behalf of a restaurant. Orders of other restaurants are reported as forbidden.
    pub async fn order_for_restaurant(&self, restaurant_id: i64, order_id: &OrderId) -> Result<Order, OrderFlowError> {
        let order =
            self.db.fetch_order(order_id).await?.ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))?;
        if order.restaurant_id != restaurant_id {
            warn!("🔄️ Restaurant {restaurant_id} tried to access order {order_id} of restaurant {}", order.restaurant_id);
            return Err(OrderFlowError::Forbidden(order_id.clone()));
        }
        Ok(order)
    }

    /// The most recent orders of the restaurant, newest first.
    pub async fn orders_for_restaurant(&self, restaurant_id: i64, limit: u32) -> Result<Vec<Order>, OrderFlowError> {
        Ok(self.db.fetch_orders_for_restaurant(restaurant_id, limit).await?)
    }

    /// Moves the order to `to`, if the transition is legal and `actor` is allowed to make it.
    pub async fn transition_order(
        &self,
        order_id: &OrderId,
        to: OrderStatusType,
        actor: Actor,
    ) -> Result<Order, OrderFlowError> {
        let order =
            self.db.fetch_order(order_id).await?.ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))?;
        self.apply_transition(order, to, actor).await
    }

    /// As [`Self::transition_order`], but the order must belong to `restaurant_id`.
    pub async fn transition_for_restaurant(
        &self,
        restaurant_id: i64,
        order_id: &OrderId,
        to: OrderStatusType,
        actor: Actor,
    ) -> Result<Order, OrderFlowError> {
        let order = self.order_for_restaurant(restaurant_id, order_id).await?;
        self.apply_transition(order, to, actor).await
    }

    /// Performs one of the actions offered on the owner's order board.
    pub async fn perform_owner_action(
        &self,
        restaurant_id: i64,
        order_id: &OrderId,
        action: OwnerAction,
    ) -> Result<Order, OrderFlowError> {
        let order = self.order_for_restaurant(restaurant_id, order_id).await?;
        let target =
            action.target(order.status).ok_or(OrderFlowError::ActionUnavailable { action, status: order.status })?;
        self.apply_transition(order, target, Actor::Owner).await
    }

    async fn apply_transition(&self, order: Order, to: OrderStatusType, actor: Actor) -> Result<Order, OrderFlowError> {
        let from = order.status;
        if !can_transition(from, to) {
            debug!("🔄️ Rejected illegal transition of order {} from {from} to {to}", order.id);
            return Err(OrderFlowError::IllegalTransition { from, to });
        }
        if !may_trigger(actor, from, to) {
            debug!("🔄️ Rejected transition of order {} from {from} to {to} by {actor}", order.id);
            return Err(OrderFlowError::NotPermitted { actor, from, to });
        }
        match self.db.update_order_status(&order.id, from, to).await? {
            StatusUpdateResult::Updated { old, new } => {
                info!("🔄️ Order {} moved from {} to {}", new.id, old.status, new.status);
                self.producers.publish_status_changed(OrderStatusChangedEvent::new(old.status, new.clone())).await;
                Ok(new)
            },
            StatusUpdateResult::Conflict(current) => {
                warn!("🔄️ Order {} changed to {} before it could be moved to {to}", current.id, current.status);
                Err(OrderFlowError::StatusConflict { order_id: current.id, current: current.status })
            },
            StatusUpdateResult::NotFound => Err(OrderFlowError::OrderNotFound(order.id)),
        }
    }
}
