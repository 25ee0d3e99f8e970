//! SQLite backend for the storefront.
//!
//! Each table has its own module of free functions taking a `&mut SqliteConnection`, so that callers can compose them
//! inside a transaction. [`SqliteDatabase`] ties them together, implements the Gateway traits and publishes a change
//! event after every committed write.
pub mod db;
mod errors;

pub mod inventory;
pub mod menu;
pub mod orders;
pub mod restaurants;
pub mod reviews;

use std::env;

pub use db::SqliteDatabase;
pub use errors::SqliteDatabaseError;
use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

const SQLITE_DB_URL: &str = "sqlite://data/qrmenu_store.db";

pub fn db_url() -> String {
    let result = env::var("QRM_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ QRM_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqliteDatabaseError> {
    let options = url.parse::<SqliteConnectOptions>()?.create_if_missing(true).foreign_keys(true);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
