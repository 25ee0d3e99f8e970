//! The public API of the storefront engine.
//!
//! Each API object wraps a Gateway backend and exposes the operations the server (or any other front end) needs. None
//! of them touch storage directly; they only use the traits in [`crate::traits`].
pub mod errors;
pub mod menu_api;
pub mod order_flow_api;
pub mod restaurant_api;
