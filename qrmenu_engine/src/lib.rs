//! QR Menu Storefront Engine
//!
//! The engine holds the storefront logic for restaurants that take orders from a QR-code menu. It knows nothing about
//! HTTP; the server crate wraps it.
//!
//! The library is divided into a few main sections:
//! 1. The Gateway ([`mod@traits`]). Storage and row-level change notifications sit behind a set of traits. SQLite is
//!    the supported backend ([`SqliteDatabase`]). You should never need to access the database directly. The data
//!    types stored in it live in [`mod@db_types`] and are public.
//! 2. The public API ([`mod@api`] and [`mod@storefront`]). Order placement and the order lifecycle, menus, inventory,
//!    restaurant settings, reviews, and the customer's cart and checkout.
//! 3. Live views ([`mod@live`]). The owner's order board and the customer's order tracker each run as a task that
//!    follows the change feed and publishes snapshots.
//!
//! The pure rules, i.e. the order state machine and the stock check, are in [`mod@lifecycle`] and
//! [`mod@availability`].
//!
//! The engine also emits order events. When an order is placed, an `OrderCreated` event is emitted, and every status
//! change emits an `OrderStatusChanged` event. You can hook into these with [`events::EventHooks`].
mod db;

pub mod api;
pub mod availability;
pub mod db_types;
pub mod events;
pub mod lifecycle;
pub mod live;
pub mod storefront;

#[cfg(feature = "sqlite")]
pub use db::sqlite::{db_url, SqliteDatabase, SqliteDatabaseError};
pub use db::traits;
pub use db::traits::{
    ChangeNotifications,
    GatewayError,
    MenuManagement,
    OrderManagement,
    RestaurantManagement,
    StatusUpdateResult,
    StorefrontDatabase,
};
pub use api::{
    errors::{CheckoutError, MenuApiError, OrderFlowError},
    menu_api::MenuApi,
    order_flow_api::OrderFlowApi,
    restaurant_api::RestaurantApi,
};
pub use storefront::CheckoutApi;
