#![allow(dead_code)]
use log::*;
use qrmenu_engine::{
    db_types::{Money, NewMenuItem, RestaurantSettings},
    events::ChangeFeed,
    MenuManagement,
    RestaurantManagement,
    SqliteDatabase,
};
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub async fn prepare_test_env(url: &str) -> SqliteDatabase {
    prepare_test_env_with_feed(url, ChangeFeed::new(64)).await
}

pub async fn prepare_test_env_with_feed(url: &str, feed: ChangeFeed) -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    create_database(url).await;
    let db = SqliteDatabase::new_with_feed(url, 5, feed)
        .await
        .expect("Error creating connection to database");
    db.run_migrations().await.expect("Error running DB migrations");
    db
}

pub fn random_db_path() -> String {
    let dir = std::env::temp_dir();
    format!("sqlite://{}/qrmenu_test_{}.db", dir.display(), rand::random::<u64>())
}

pub async fn create_database(url: &str) {
    if Sqlite::database_exists(url).await.unwrap_or(false) {
        if let Err(e) = Sqlite::drop_database(url).await {
            warn!("🚀️ Error dropping database {url}: {e:?}");
        }
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    info!("🚀️ Created Sqlite database {url}");
}

pub async fn tear_down(db: SqliteDatabase, url: &str) {
    db.close().await;
    if let Err(e) = Sqlite::drop_database(url).await {
        warn!("🚀️ Could not remove test database {url}: {e}");
    }
}

/// A restaurant with two dishes: A at 100 and B at 50
pub async fn seed_restaurant(db: &SqliteDatabase, owner: &str, slug: &str, tables: i64) -> Seeded {
    let settings = RestaurantSettings::new("Spice Garden", slug).with_city("Bengaluru").with_tables(tables);
    let restaurant = db.upsert_restaurant(owner, settings).await.expect("Error creating restaurant");
    let a = db
        .insert_menu_item(NewMenuItem::new(restaurant.id, "Dish A", Money::from_major(100)).with_category("Mains"))
        .await
        .expect("Error adding dish A");
    let b = db
        .insert_menu_item(NewMenuItem::new(restaurant.id, "Dish B", Money::from_major(50)).with_category("Sides"))
        .await
        .expect("Error adding dish B");
    Seeded { restaurant_id: restaurant.id, dish_a: a.id, dish_b: b.id }
}

#[derive(Debug, Clone, Copy)]
pub struct Seeded {
    pub restaurant_id: i64,
    pub dish_a: i64,
    pub dish_b: i64,
}
