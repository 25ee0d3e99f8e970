use async_trait::async_trait;

use crate::{
    db::traits::{GatewayError, StatusUpdateResult},
    db_types::{NewOrder, Order, OrderId, OrderStatusType},
};

/// The `OrderManagement` trait defines the behaviour for creating orders, querying them, and moving them through their
/// lifecycle.
#[async_trait]
pub trait OrderManagement: Send + Sync {
    /// Inserts a new order with status `pending` in a single atomic write and returns the stored row.
    ///
    /// The order id is generated by the backend. The total is derived from the order lines.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, GatewayError>;

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, GatewayError>;

    /// Fetches the most recent `limit` orders for a restaurant, newest first.
    async fn fetch_orders_for_restaurant(&self, restaurant_id: i64, limit: u32) -> Result<Vec<Order>, GatewayError>;

    /// Sets the status of the order to `new_status`, but only if its current status is `expected`.
    ///
    /// Only `status` and `updated_at` are written. This method does not check whether the transition is legal; that
    /// is the job of the order flow API.
    async fn update_order_status(
        &self,
        order_id: &OrderId,
        expected: OrderStatusType,
        new_status: OrderStatusType,
    ) -> Result<StatusUpdateResult, GatewayError>;
}
