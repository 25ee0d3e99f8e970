use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{InventoryItem, NewInventoryItem, Quantity},
};

const INVENTORY_COLUMNS: &str =
    "id, restaurant_id, name, current_stock, unit, cost_per_unit, low_stock_threshold, updated_at";

pub async fn insert_inventory_item(
    item: NewInventoryItem,
    conn: &mut SqliteConnection,
) -> Result<InventoryItem, SqliteDatabaseError> {
    let sql = format!(
        "INSERT INTO inventory_items (restaurant_id, name, current_stock, unit, cost_per_unit, low_stock_threshold) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING {INVENTORY_COLUMNS}"
    );
    let item = sqlx::query_as::<_, InventoryItem>(&sql)
        .bind(item.restaurant_id)
        .bind(item.name)
        .bind(item.current_stock)
        .bind(item.unit)
        .bind(item.cost_per_unit)
        .bind(item.low_stock_threshold)
        .fetch_one(conn)
        .await?;
    debug!("🗃️ Inventory item '{}' saved with id {}", item.name, item.id);
    Ok(item)
}

pub async fn fetch_inventory_item(
    item_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<InventoryItem>, SqliteDatabaseError> {
    let sql = format!("SELECT {INVENTORY_COLUMNS} FROM inventory_items WHERE id = $1");
    let item = sqlx::query_as::<_, InventoryItem>(&sql).bind(item_id).fetch_optional(conn).await?;
    Ok(item)
}

pub async fn fetch_inventory_for_restaurant(
    restaurant_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<InventoryItem>, SqliteDatabaseError> {
    let sql = format!("SELECT {INVENTORY_COLUMNS} FROM inventory_items WHERE restaurant_id = $1 ORDER BY name, id");
    let items = sqlx::query_as::<_, InventoryItem>(&sql).bind(restaurant_id).fetch_all(conn).await?;
    Ok(items)
}

pub async fn update_stock(
    item_id: i64,
    current_stock: Quantity,
    conn: &mut SqliteConnection,
) -> Result<Option<InventoryItem>, SqliteDatabaseError> {
    let sql = format!(
        "UPDATE inventory_items SET current_stock = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING \
         {INVENTORY_COLUMNS}"
    );
    let item = sqlx::query_as::<_, InventoryItem>(&sql).bind(current_stock).bind(item_id).fetch_optional(conn).await?;
    Ok(item)
}
