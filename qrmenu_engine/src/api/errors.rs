use thiserror::Error;

use crate::{
    db::traits::GatewayError,
    db_types::{OrderId, OrderStatusType},
    lifecycle::{Actor, OwnerAction},
};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] GatewayError),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("An order cannot move from {from} to {to}")]
    IllegalTransition { from: OrderStatusType, to: OrderStatusType },
    #[error("{actor} may not move an order from {from} to {to}")]
    NotPermitted { actor: Actor, from: OrderStatusType, to: OrderStatusType },
    #[error("The '{action}' action is not available for an order that is {status}")]
    ActionUnavailable { action: OwnerAction, status: OrderStatusType },
    #[error("Order {order_id} was changed by someone else in the meantime. It is now {current}")]
    StatusConflict { order_id: OrderId, current: OrderStatusType },
    #[error("Order {0} belongs to another restaurant")]
    Forbidden(OrderId),
}

/// Errors from the menu, inventory and restaurant management APIs
#[derive(Debug, Clone, Error)]
pub enum MenuApiError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] GatewayError),
    #[error("No restaurant is published at '{0}'")]
    RestaurantNotFound(String),
    #[error("You have not set up your restaurant yet")]
    NoRestaurant,
    #[error("{0} does not exist")]
    NotFound(String),
    #[error("{0} belongs to another restaurant")]
    Forbidden(String),
    #[error("Invalid input. {0}")]
    Validation(String),
    #[error("The restaurant URL cannot be changed once it has been published")]
    SlugImmutable,
    #[error("The restaurant URL '{0}' is already taken")]
    SlugTaken(String),
}

#[derive(Debug, Clone, Error)]
pub enum CheckoutError {
    #[error("{0}")]
    Validation(String),
    #[error("Your cart is empty")]
    EmptyCart,
    #[error("{0} is not accepting orders right now")]
    NotAcceptingOrders(String),
    #[error("Table {0} does not exist at this restaurant")]
    InvalidTable(i64),
    #[error("Menu item {0} is not on this restaurant's menu")]
    UnknownMenuItem(i64),
    #[error("{0} is no longer available")]
    ItemUnavailable(String),
    #[error("Your order could not be placed. {0}")]
    DatabaseError(#[from] GatewayError),
}

impl From<OrderFlowError> for CheckoutError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::DatabaseError(e) => CheckoutError::DatabaseError(e),
            e => CheckoutError::DatabaseError(GatewayError::QueryError(e.to_string())),
        }
    }
}
