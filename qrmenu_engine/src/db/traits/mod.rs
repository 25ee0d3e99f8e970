//! #  The Gateway: storage and change notification backends
//!
//! The traits in this module are the capability boundary between the storefront logic and whatever persists its rows.
//! A backend stores restaurants, menu items, inventory, orders and reviews, and publishes a row-level change feed for
//! every committed write to the orders, menu item and inventory tables.
//!
//! * [`StorefrontDatabase`] is the highest level of behaviour. A type implementing it can back the whole storefront.
//! * [`OrderManagement`] inserts orders, queries them, and performs compare-and-set status updates.
//! * [`MenuManagement`] manages menu items, their recipe links, and inventory stock.
//! * [`RestaurantManagement`] manages the tenant root (one restaurant per owner) and customer reviews.
//! * [`ChangeNotifications`] hands out filtered subscriptions to the change feed.
//!
//! All methods return [`GatewayError`] so that the API layer and test mocks share a single error type.
mod change_notifications;
mod data_objects;
mod gateway_error;
mod menu_management;
mod order_management;
mod restaurant_management;
mod storefront_database;

pub use change_notifications::ChangeNotifications;
pub use data_objects::StatusUpdateResult;
pub use gateway_error::GatewayError;
pub use menu_management::MenuManagement;
pub use order_management::OrderManagement;
pub use restaurant_management::RestaurantManagement;
pub use storefront_database::StorefrontDatabase;
