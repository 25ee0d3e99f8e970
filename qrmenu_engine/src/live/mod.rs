//! Live views that follow the change feed
mod active_order;
mod order_board;
mod order_tracker;

pub use active_order::{ActiveOrderStore, MemoryActiveOrderStore};
pub use order_board::{BoardHandle, BoardRow, BoardState, OrderBoard, DEFAULT_BOARD_LIMIT};
pub use order_tracker::{OrderTracker, TrackedOrder, TrackerHandle, TrackerState, TrackerView};
