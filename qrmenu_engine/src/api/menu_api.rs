use std::fmt::Debug;

use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    api::errors::MenuApiError,
    availability::{InventorySnapshot, MenuItemAvailability},
    db::traits::{MenuManagement, RestaurantManagement},
    db_types::{
        InventoryItem,
        MenuItem,
        MenuItemUpdate,
        NewInventoryItem,
        NewMenuItem,
        PublicBranding,
        Quantity,
        Restaurant,
        Review,
    },
};

/// One category section of the public menu
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuCategory {
    pub name: String,
    pub items: Vec<MenuItemAvailability>,
}

/// Everything the public storefront page needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicMenu {
    pub restaurant_id: i64,
    pub branding: PublicBranding,
    pub is_accepting_orders: bool,
    /// Set when the customer scanned a table QR code. Checkout is then a dine-in order.
    pub table_number: Option<i64>,
    pub categories: Vec<MenuCategory>,
    pub reviews: Vec<Review>,
}

impl PublicMenu {
    pub fn is_dine_in(&self) -> bool {
        self.table_number.is_some()
    }

    pub fn items(&self) -> impl Iterator<Item = &MenuItemAvailability> {
        self.categories.iter().flat_map(|c| c.items.iter())
    }
}

/// Groups items by category, keeping the order in which categories first appear.
pub fn group_by_category(items: Vec<MenuItemAvailability>) -> Vec<MenuCategory> {
    let mut categories: Vec<MenuCategory> = Vec::new();
    for item in items {
        match categories.iter_mut().find(|c| c.name == item.item.category) {
            Some(category) => category.items.push(item),
            None => categories.push(MenuCategory { name: item.item.category.clone(), items: vec![item] }),
        }
    }
    categories
}

/// Checks a table number from a QR code against the restaurant's table count.
pub fn validate_table(restaurant: &Restaurant, table: i64) -> bool {
    table >= 1 && (restaurant.total_tables == 0 || table <= restaurant.total_tables)
}

/// The menu and inventory API. Public menu rendering plus the owner's menu and stock management.
#[derive(Clone)]
pub struct MenuApi<B> {
    db: B,
}

impl<B> Debug for MenuApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MenuApi")
    }
}

impl<B> MenuApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> MenuApi<B>
where B: MenuManagement + RestaurantManagement
{
    /// Builds the public menu for the restaurant at `slug`. Only items the owner has switched on are listed, each
    /// annotated with the current stock check.
    pub async fn public_menu(&self, slug: &str, table_number: Option<i64>) -> Result<PublicMenu, MenuApiError> {
        let restaurant = self
            .db
            .fetch_restaurant_by_slug(slug)
            .await?
            .ok_or_else(|| MenuApiError::RestaurantNotFound(slug.to_string()))?;
        if let Some(table) = table_number {
            if !validate_table(&restaurant, table) {
                return Err(MenuApiError::Validation(format!("Table {table} does not exist at {}", restaurant.name)));
            }
        }
        let snapshot = self.inventory_snapshot(restaurant.id).await?;
        let items = self
            .db
            .fetch_menu_for_restaurant(restaurant.id, true)
            .await?
            .into_iter()
            .map(|item| MenuItemAvailability::evaluate(item, &snapshot))
            .collect::<Vec<_>>();
        let reviews = self.db.fetch_visible_reviews(restaurant.id).await?;
        trace!("📋 Public menu for '{slug}' has {} items", items.len());
        Ok(PublicMenu {
            restaurant_id: restaurant.id,
            branding: PublicBranding::from(&restaurant),
            is_accepting_orders: restaurant.is_accepting_orders,
            table_number,
            categories: group_by_category(items),
            reviews,
        })
    }

    pub async fn inventory_snapshot(&self, restaurant_id: i64) -> Result<InventorySnapshot, MenuApiError> {
        let inventory = self.db.fetch_inventory_for_restaurant(restaurant_id).await?;
        Ok(inventory.iter().collect())
    }

    pub async fn menu_for_restaurant(&self, restaurant_id: i64) -> Result<Vec<MenuItem>, MenuApiError> {
        Ok(self.db.fetch_menu_for_restaurant(restaurant_id, false).await?)
    }

    pub async fn add_menu_item(&self, restaurant_id: i64, mut item: NewMenuItem) -> Result<MenuItem, MenuApiError> {
        item.restaurant_id = restaurant_id;
        if item.name.trim().is_empty() {
            return Err(MenuApiError::Validation("A menu item needs a name".into()));
        }
        if !item.price.is_positive() {
            return Err(MenuApiError::Validation(format!("The price must be positive, not {}", item.price)));
        }
        for link in &item.recipe {
            if link.quantity_required <= Quantity::default() {
                return Err(MenuApiError::Validation("Recipe quantities must be positive".into()));
            }
            self.owned_inventory_item(restaurant_id, link.inventory_item_id).await?;
        }
        Ok(self.db.insert_menu_item(item).await?)
    }

    /// Edits a menu item. Orders already placed keep the name and price they were placed with.
    pub async fn update_menu_item(
        &self,
        restaurant_id: i64,
        item_id: i64,
        update: MenuItemUpdate,
    ) -> Result<MenuItem, MenuApiError> {
        if matches!(update.price, Some(p) if !p.is_positive()) {
            return Err(MenuApiError::Validation("The price must be positive".into()));
        }
        if matches!(&update.name, Some(n) if n.trim().is_empty()) {
            return Err(MenuApiError::Validation("A menu item needs a name".into()));
        }
        self.owned_menu_item(restaurant_id, item_id).await?;
        self.db
            .update_menu_item(item_id, update)
            .await?
            .ok_or_else(|| MenuApiError::NotFound(format!("Menu item {item_id}")))
    }

    pub async fn set_item_availability(
        &self,
        restaurant_id: i64,
        item_id: i64,
        is_available: bool,
    ) -> Result<MenuItem, MenuApiError> {
        let update = MenuItemUpdate::default().with_availability(is_available);
        let item = self.update_menu_item(restaurant_id, item_id, update).await?;
        info!("📋 Menu item '{}' is now {}", item.name, if is_available { "available" } else { "switched off" });
        Ok(item)
    }

    pub async fn inventory(&self, restaurant_id: i64) -> Result<Vec<InventoryItem>, MenuApiError> {
        Ok(self.db.fetch_inventory_for_restaurant(restaurant_id).await?)
    }

    pub async fn add_inventory_item(
        &self,
        restaurant_id: i64,
        mut item: NewInventoryItem,
    ) -> Result<InventoryItem, MenuApiError> {
        item.restaurant_id = restaurant_id;
        if item.name.trim().is_empty() {
            return Err(MenuApiError::Validation("An inventory item needs a name".into()));
        }
        if item.current_stock.is_negative() {
            return Err(MenuApiError::Validation("Stock cannot be negative".into()));
        }
        Ok(self.db.insert_inventory_item(item).await?)
    }

    pub async fn update_stock(
        &self,
        restaurant_id: i64,
        item_id: i64,
        current_stock: Quantity,
    ) -> Result<InventoryItem, MenuApiError> {
        if current_stock.is_negative() {
            return Err(MenuApiError::Validation(format!("Stock cannot be negative ({current_stock})")));
        }
        self.owned_inventory_item(restaurant_id, item_id).await?;
        let item = self
            .db
            .update_inventory_stock(item_id, current_stock)
            .await?
            .ok_or_else(|| MenuApiError::NotFound(format!("Inventory item {item_id}")))?;
        if item.is_low_stock() {
            warn!("📋 {} is running low: {} {} left", item.name, item.current_stock, item.unit);
        }
        Ok(item)
    }

    async fn owned_menu_item(&self, restaurant_id: i64, item_id: i64) -> Result<MenuItem, MenuApiError> {
        let item = self
            .db
            .fetch_menu_item(item_id)
            .await?
            .ok_or_else(|| MenuApiError::NotFound(format!("Menu item {item_id}")))?;
        if item.restaurant_id != restaurant_id {
            return Err(MenuApiError::Forbidden(format!("Menu item {item_id}")));
        }
        Ok(item)
    }

    async fn owned_inventory_item(&self, restaurant_id: i64, item_id: i64) -> Result<InventoryItem, MenuApiError> {
        let item = self
            .db
            .fetch_inventory_item(item_id)
            .await?
            .ok_or_else(|| MenuApiError::NotFound(format!("Inventory item {item_id}")))?;
        if item.restaurant_id != restaurant_id {
            return Err(MenuApiError::Forbidden(format!("Inventory item {item_id}")));
        }
        Ok(item)
    }
}
