use async_trait::async_trait;

use crate::{
    db::traits::GatewayError,
    db_types::{InventoryItem, MenuItem, MenuItemUpdate, NewInventoryItem, NewMenuItem, Quantity},
};

/// Menu items, their recipe links, and the inventory they draw from.
#[async_trait]
pub trait MenuManagement: Send + Sync {
    /// Stores the menu item together with its recipe links.
    async fn insert_menu_item(&self, item: NewMenuItem) -> Result<MenuItem, GatewayError>;

    async fn fetch_menu_item(&self, item_id: i64) -> Result<Option<MenuItem>, GatewayError>;

    /// All menu items for the restaurant, with their recipe links. When `only_available` is set, items the owner has
    /// switched off are left out.
    async fn fetch_menu_for_restaurant(
        &self,
        restaurant_id: i64,
        only_available: bool,
    ) -> Result<Vec<MenuItem>, GatewayError>;

    /// Applies the update and returns the edited item, or `None` if the item does not exist.
    async fn update_menu_item(&self, item_id: i64, update: MenuItemUpdate) -> Result<Option<MenuItem>, GatewayError>;

    async fn insert_inventory_item(&self, item: NewInventoryItem) -> Result<InventoryItem, GatewayError>;

    async fn fetch_inventory_item(&self, item_id: i64) -> Result<Option<InventoryItem>, GatewayError>;

    async fn fetch_inventory_for_restaurant(&self, restaurant_id: i64) -> Result<Vec<InventoryItem>, GatewayError>;

    /// Sets the stock level of an inventory item. Negative stock is rejected with
    /// [`GatewayError::ConstraintViolation`].
    async fn update_inventory_stock(
        &self,
        item_id: i64,
        current_stock: Quantity,
    ) -> Result<Option<InventoryItem>, GatewayError>;
}
