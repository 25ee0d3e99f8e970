use crate::db::traits::{ChangeNotifications, MenuManagement, OrderManagement, RestaurantManagement};

/// This trait defines the highest level of behaviour for backends supporting the storefront.
///
/// A backend must be cheap to clone (clones share the same pool and change feed), since each live view and each
/// server worker holds its own handle.
pub trait StorefrontDatabase:
    OrderManagement + MenuManagement + RestaurantManagement + ChangeNotifications + Clone + 'static {
    /// The URL of the database
    fn url(&self) -> &str;
}
