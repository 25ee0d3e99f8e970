use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::{FromRow, QueryBuilder, SqliteConnection};

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{MenuItem, MenuItemUpdate, Money, NewMenuItem, Quantity, RecipeLink},
};

#[derive(Debug, FromRow)]
struct MenuItemRow {
    id: i64,
    restaurant_id: i64,
    name: String,
    price: Money,
    category: String,
    is_veg: bool,
    image_url: Option<String>,
    is_available: bool,
    updated_at: DateTime<Utc>,
}

impl MenuItemRow {
    fn with_recipe(self, recipe: Vec<RecipeLink>) -> MenuItem {
        MenuItem {
            id: self.id,
            restaurant_id: self.restaurant_id,
            name: self.name,
            price: self.price,
            category: self.category,
            is_veg: self.is_veg,
            image_url: self.image_url,
            is_available: self.is_available,
            recipe,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct RecipeRow {
    menu_item_id: i64,
    inventory_item_id: i64,
    quantity_required: Quantity,
}

const MENU_COLUMNS: &str = "id, restaurant_id, name, price, category, is_veg, image_url, is_available, updated_at";

/// Inserts the menu item and its recipe links. Not atomic on its own; pass `&mut *tx`.
pub async fn insert_menu_item(item: NewMenuItem, conn: &mut SqliteConnection) -> Result<i64, SqliteDatabaseError> {
    let id: i64 = sqlx::query_scalar(
        r#"
            INSERT INTO menu_items (restaurant_id, name, price, category, is_veg, image_url, is_available)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id;
        "#,
    )
    .bind(item.restaurant_id)
    .bind(&item.name)
    .bind(item.price)
    .bind(&item.category)
    .bind(item.is_veg)
    .bind(&item.image_url)
    .bind(item.is_available)
    .fetch_one(&mut *conn)
    .await?;
    for link in &item.recipe {
        sqlx::query(
            "INSERT INTO menu_item_ingredients (menu_item_id, inventory_item_id, quantity_required) VALUES ($1, $2, \
             $3)",
        )
        .bind(id)
        .bind(link.inventory_item_id)
        .bind(link.quantity_required)
        .execute(&mut *conn)
        .await?;
    }
    debug!("🗃️ Menu item '{}' saved with id {id} and {} recipe link(s)", item.name, item.recipe.len());
    Ok(id)
}

pub async fn fetch_menu_item(item_id: i64, conn: &mut SqliteConnection) -> Result<Option<MenuItem>, SqliteDatabaseError> {
    let sql = format!("SELECT {MENU_COLUMNS} FROM menu_items WHERE id = $1");
    let Some(row) = sqlx::query_as::<_, MenuItemRow>(&sql).bind(item_id).fetch_optional(&mut *conn).await? else {
        return Ok(None);
    };
    let recipe = sqlx::query_as::<_, RecipeRow>(
        "SELECT menu_item_id, inventory_item_id, quantity_required FROM menu_item_ingredients WHERE menu_item_id = $1 \
         ORDER BY inventory_item_id",
    )
    .bind(item_id)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(|r| RecipeLink::new(r.inventory_item_id, r.quantity_required))
    .collect();
    Ok(Some(row.with_recipe(recipe)))
}

/// Fetches the restaurant's menu, joined with recipe links, ordered by category then name.
pub async fn fetch_menu_for_restaurant(
    restaurant_id: i64,
    only_available: bool,
    conn: &mut SqliteConnection,
) -> Result<Vec<MenuItem>, SqliteDatabaseError> {
    let mut sql = format!("SELECT {MENU_COLUMNS} FROM menu_items WHERE restaurant_id = $1");
    if only_available {
        sql.push_str(" AND is_available = 1");
    }
    sql.push_str(" ORDER BY category, name, id");
    let rows = sqlx::query_as::<_, MenuItemRow>(&sql).bind(restaurant_id).fetch_all(&mut *conn).await?;
    let links = sqlx::query_as::<_, RecipeRow>(
        r#"
            SELECT menu_item_id, inventory_item_id, quantity_required
            FROM menu_item_ingredients
            WHERE menu_item_id IN (SELECT id FROM menu_items WHERE restaurant_id = $1)
            ORDER BY inventory_item_id
        "#,
    )
    .bind(restaurant_id)
    .fetch_all(&mut *conn)
    .await?;
    let mut recipes: HashMap<i64, Vec<RecipeLink>> = HashMap::new();
    for link in links {
        recipes
            .entry(link.menu_item_id)
            .or_default()
            .push(RecipeLink::new(link.inventory_item_id, link.quantity_required));
    }
    let items = rows
        .into_iter()
        .map(|row| {
            let recipe = recipes.remove(&row.id).unwrap_or_default();
            row.with_recipe(recipe)
        })
        .collect::<Vec<_>>();
    trace!("🗃️ Fetched {} menu items for restaurant {restaurant_id}", items.len());
    Ok(items)
}

/// Applies the non-empty fields of `update`. Returns the number of rows touched (0 or 1).
pub async fn update_menu_item(
    item_id: i64,
    update: MenuItemUpdate,
    conn: &mut SqliteConnection,
) -> Result<u64, SqliteDatabaseError> {
    if update.is_empty() {
        debug!("🗃️ No fields to update for menu item {item_id}. Update request skipped.");
        return Ok(0);
    }
    let mut builder = QueryBuilder::new("UPDATE menu_items SET ");
    let mut set_clause = builder.separated(", ");
    if let Some(name) = update.name {
        set_clause.push("name = ");
        set_clause.push_bind_unseparated(name);
    }
    if let Some(price) = update.price {
        set_clause.push("price = ");
        set_clause.push_bind_unseparated(price);
    }
    if let Some(category) = update.category {
        set_clause.push("category = ");
        set_clause.push_bind_unseparated(category);
    }
    if let Some(is_veg) = update.is_veg {
        set_clause.push("is_veg = ");
        set_clause.push_bind_unseparated(is_veg);
    }
    if let Some(image_url) = update.image_url {
        set_clause.push("image_url = ");
        set_clause.push_bind_unseparated(image_url);
    }
    if let Some(is_available) = update.is_available {
        set_clause.push("is_available = ");
        set_clause.push_bind_unseparated(is_available);
    }
    set_clause.push("updated_at = CURRENT_TIMESTAMP");
    builder.push(" WHERE id = ");
    builder.push_bind(item_id);
    trace!("🗃️ Executing query: {}", builder.sql());
    let result = builder.build().execute(conn).await?;
    Ok(result.rows_affected())
}
