//! The order state machine
//!
//! Orders move forward along a fixed lineage:
//!
//! ```text
//!   pending -> confirmed -> preparing -> out_for_delivery -> delivered
//! ```
//!
//! Any step may be skipped, and `cancelled` can be reached from every non-terminal state. `delivered` and `cancelled`
//! are terminal; nothing leaves them.
//!
//! Who may drive a transition depends on the [`Actor`]. The owner dashboard only offers the minimal action set given by
//! [`owner_actions`], while integrations (e.g. a rider app) may perform any legal transition. Customers cannot change
//! an order's status at all.
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::db_types::OrderStatusType;

/// The canonical forward lineage. `cancelled` is not part of it.
pub const LINEAGE: [OrderStatusType; 5] = [
    OrderStatusType::Pending,
    OrderStatusType::Confirmed,
    OrderStatusType::Preparing,
    OrderStatusType::OutForDelivery,
    OrderStatusType::Delivered,
];

impl OrderStatusType {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatusType::Delivered | OrderStatusType::Cancelled)
    }

    pub fn lineage_index(&self) -> Option<usize> {
        LINEAGE.iter().position(|s| s == self)
    }

    pub fn can_transition_to(&self, to: OrderStatusType) -> bool {
        can_transition(*self, to)
    }
}

pub fn is_terminal(status: OrderStatusType) -> bool {
    status.is_terminal()
}

pub fn can_transition(from: OrderStatusType, to: OrderStatusType) -> bool {
    if from.is_terminal() {
        return false;
    }
    if to == OrderStatusType::Cancelled {
        return true;
    }
    match (from.lineage_index(), to.lineage_index()) {
        (Some(f), Some(t)) => t > f,
        _ => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Actor {
    Owner,
    Integration,
    Customer,
}

impl Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Actor::Owner => write!(f, "The restaurant owner"),
            Actor::Integration => write!(f, "An integration"),
            Actor::Customer => write!(f, "A customer"),
        }
    }
}

/// Whether `actor` is allowed to move an order from `from` to `to`. Illegal transitions are never permitted.
pub fn may_trigger(actor: Actor, from: OrderStatusType, to: OrderStatusType) -> bool {
    if !can_transition(from, to) {
        return false;
    }
    match actor {
        Actor::Owner => owner_actions(from).iter().any(|a| a.target == to),
        Actor::Integration => true,
        Actor::Customer => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerAction {
    Advance,
    Cancel,
}

impl Display for OwnerAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OwnerAction::Advance => write!(f, "advance"),
            OwnerAction::Cancel => write!(f, "cancel"),
        }
    }
}

impl OwnerAction {
    /// The status this action leads to from `from`, if the action is offered there.
    pub fn target(&self, from: OrderStatusType) -> Option<OrderStatusType> {
        owner_actions(from).into_iter().find(|a| a.action == *self).map(|a| a.target)
    }
}

/// An action button on the owner's order board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableAction {
    pub action: OwnerAction,
    pub target: OrderStatusType,
    pub label: String,
}

impl AvailableAction {
    fn new(action: OwnerAction, target: OrderStatusType) -> Self {
        let label = match (action, target) {
            (OwnerAction::Cancel, _) => "Cancel order",
            (_, OrderStatusType::Preparing) => "Start preparing",
            (_, OrderStatusType::Delivered) => "Mark delivered",
            (_, OrderStatusType::Confirmed) => "Confirm",
            (_, OrderStatusType::OutForDelivery) => "Send out",
            _ => "Advance",
        };
        Self { action, target, label: label.to_string() }
    }
}

/// The minimal set of transitions the owner dashboard offers for an order in the given status.
pub fn owner_actions(status: OrderStatusType) -> Vec<AvailableAction> {
    use OrderStatusType::*;
    let advance = match status {
        Pending | Confirmed => Some(Preparing),
        Preparing | OutForDelivery => Some(Delivered),
        Delivered | Cancelled => None,
    };
    match advance {
        Some(next) => vec![
            AvailableAction::new(OwnerAction::Advance, next),
            AvailableAction::new(OwnerAction::Cancel, Cancelled),
        ],
        None => vec![],
    }
}

/// One step of the customer-facing progress indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressStep {
    pub status: OrderStatusType,
    pub label: String,
    pub completed: bool,
    pub current: bool,
}

fn step_label(status: OrderStatusType) -> &'static str {
    match status {
        OrderStatusType::Pending => "Order placed",
        OrderStatusType::Confirmed => "Confirmed",
        OrderStatusType::Preparing => "Preparing",
        OrderStatusType::OutForDelivery => "Out for delivery",
        OrderStatusType::Delivered => "Delivered",
        OrderStatusType::Cancelled => "Cancelled",
    }
}

/// Progress steps for the given status. Cancelled orders have no stepper, so `None` is returned.
pub fn progress(status: OrderStatusType) -> Option<Vec<ProgressStep>> {
    let current = status.lineage_index()?;
    let steps = LINEAGE
        .iter()
        .enumerate()
        .map(|(i, s)| ProgressStep {
            status: *s,
            label: step_label(*s).to_string(),
            completed: i <= current,
            current: i == current,
        })
        .collect();
    Some(steps)
}

/// The message shown in place of (or beneath) the stepper once an order is finished.
pub fn terminal_message(status: OrderStatusType) -> Option<&'static str> {
    match status {
        OrderStatusType::Delivered => Some("Your order has been delivered. Enjoy your meal!"),
        OrderStatusType::Cancelled => Some("This order was cancelled by the restaurant."),
        _ => None,
    }
}
