//! Stock-aware availability of menu items
//!
//! An item with no recipe links is never gated by stock. Otherwise it is out of stock as soon as one linked component
//! is missing from the inventory snapshot or holds less than the recipe requires. The check is a point-in-time
//! estimate: nothing is reserved, so two customers can both order the last portion.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::db_types::{InventoryItem, MenuItem, Quantity, RecipeLink};

/// Current stock levels, keyed by inventory item id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventorySnapshot {
    stock: HashMap<i64, Quantity>,
}

impl InventorySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stock(mut self, inventory_item_id: i64, current_stock: Quantity) -> Self {
        self.stock.insert(inventory_item_id, current_stock);
        self
    }

    pub fn stock_of(&self, inventory_item_id: i64) -> Option<Quantity> {
        self.stock.get(&inventory_item_id).copied()
    }

    pub fn len(&self) -> usize {
        self.stock.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stock.is_empty()
    }
}

impl<'a> FromIterator<&'a InventoryItem> for InventorySnapshot {
    fn from_iter<I: IntoIterator<Item = &'a InventoryItem>>(iter: I) -> Self {
        let stock = iter.into_iter().map(|i| (i.id, i.current_stock)).collect();
        Self { stock }
    }
}

impl From<&[InventoryItem]> for InventorySnapshot {
    fn from(items: &[InventoryItem]) -> Self {
        items.iter().collect()
    }
}

pub fn is_out_of_stock(recipe: &[RecipeLink], snapshot: &InventorySnapshot) -> bool {
    recipe.iter().any(|link| match snapshot.stock_of(link.inventory_item_id) {
        Some(stock) => stock < link.quantity_required,
        None => true,
    })
}

/// The owner's override and the stock check are independent; either one can take an item off sale.
pub fn is_purchasable(item: &MenuItem, snapshot: &InventorySnapshot) -> bool {
    item.is_available && !is_out_of_stock(&item.recipe, snapshot)
}

/// A menu item annotated with both availability signals, as rendered on the public menu
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItemAvailability {
    #[serde(flatten)]
    pub item: MenuItem,
    pub is_out_of_stock: bool,
}

impl MenuItemAvailability {
    pub fn evaluate(item: MenuItem, snapshot: &InventorySnapshot) -> Self {
        let is_out_of_stock = is_out_of_stock(&item.recipe, snapshot);
        Self { item, is_out_of_stock }
    }

    pub fn is_purchasable(&self) -> bool {
        self.item.is_available && !self.is_out_of_stock
    }
}
