use log::{debug, info};
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{Restaurant, RestaurantSettings},
};

const RESTAURANT_COLUMNS: &str = "id, owner_id, name, slug, city, theme_color, logo_url, tagline, is_accepting_orders, \
                                  total_tables, created_at, updated_at";

/// Creates or updates the owner's restaurant. Embed in a transaction to make the read-then-write atomic.
pub async fn upsert_for_owner(
    owner_id: &str,
    settings: RestaurantSettings,
    conn: &mut SqliteConnection,
) -> Result<Restaurant, SqliteDatabaseError> {
    match fetch_for_owner(owner_id, &mut *conn).await? {
        Some(existing) => update_settings(existing.id, settings, conn).await,
        None => insert(owner_id, settings, conn).await,
    }
}

async fn insert(
    owner_id: &str,
    settings: RestaurantSettings,
    conn: &mut SqliteConnection,
) -> Result<Restaurant, SqliteDatabaseError> {
    let sql = format!(
        "INSERT INTO restaurants (owner_id, name, slug, city, theme_color, logo_url, tagline, is_accepting_orders, \
         total_tables) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {RESTAURANT_COLUMNS}"
    );
    let restaurant = sqlx::query_as::<_, Restaurant>(&sql)
        .bind(owner_id)
        .bind(settings.name)
        .bind(settings.slug)
        .bind(settings.city)
        .bind(settings.theme_color)
        .bind(settings.logo_url)
        .bind(settings.tagline)
        .bind(settings.is_accepting_orders)
        .bind(settings.total_tables)
        .fetch_one(conn)
        .await?;
    info!("🗃️ Restaurant '{}' created with slug '{}'", restaurant.name, restaurant.slug);
    Ok(restaurant)
}

/// Writes every setting except the slug
async fn update_settings(
    id: i64,
    settings: RestaurantSettings,
    conn: &mut SqliteConnection,
) -> Result<Restaurant, SqliteDatabaseError> {
    let sql = format!(
        "UPDATE restaurants SET name = $1, city = $2, theme_color = $3, logo_url = $4, tagline = $5, \
         is_accepting_orders = $6, total_tables = $7, updated_at = CURRENT_TIMESTAMP WHERE id = $8 RETURNING \
         {RESTAURANT_COLUMNS}"
    );
    let restaurant = sqlx::query_as::<_, Restaurant>(&sql)
        .bind(settings.name)
        .bind(settings.city)
        .bind(settings.theme_color)
        .bind(settings.logo_url)
        .bind(settings.tagline)
        .bind(settings.is_accepting_orders)
        .bind(settings.total_tables)
        .bind(id)
        .fetch_one(conn)
        .await?;
    debug!("🗃️ Settings for restaurant {id} updated");
    Ok(restaurant)
}

pub async fn fetch_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Restaurant>, SqliteDatabaseError> {
    let sql = format!("SELECT {RESTAURANT_COLUMNS} FROM restaurants WHERE id = $1");
    Ok(sqlx::query_as::<_, Restaurant>(&sql).bind(id).fetch_optional(conn).await?)
}

pub async fn fetch_by_slug(slug: &str, conn: &mut SqliteConnection) -> Result<Option<Restaurant>, SqliteDatabaseError> {
    let sql = format!("SELECT {RESTAURANT_COLUMNS} FROM restaurants WHERE slug = $1");
    Ok(sqlx::query_as::<_, Restaurant>(&sql).bind(slug).fetch_optional(conn).await?)
}

pub async fn fetch_for_owner(
    owner_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Restaurant>, SqliteDatabaseError> {
    let sql = format!("SELECT {RESTAURANT_COLUMNS} FROM restaurants WHERE owner_id = $1");
    Ok(sqlx::query_as::<_, Restaurant>(&sql).bind(owner_id).fetch_optional(conn).await?)
}
