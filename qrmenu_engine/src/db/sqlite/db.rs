use std::fmt::Debug;

use async_trait::async_trait;
use log::*;
use sqlx::SqlitePool;

use super::{db_url, inventory, menu, new_pool, orders, restaurants, reviews, SqliteDatabaseError};
use crate::{
    db::{
        sqlite::orders::OrderQueryFilter,
        traits::{
            ChangeNotifications,
            GatewayError,
            MenuManagement,
            OrderManagement,
            RestaurantManagement,
            StatusUpdateResult,
            StorefrontDatabase,
        },
    },
    db_types::{
        InventoryItem,
        MenuItem,
        MenuItemUpdate,
        NewInventoryItem,
        NewMenuItem,
        NewOrder,
        NewReview,
        Order,
        OrderId,
        OrderStatusType,
        Quantity,
        Restaurant,
        RestaurantSettings,
        Review,
    },
    events::{ChangeEvent, ChangeFeed, ChangeFilter, RowChange, Subscription},
};

/// The SQLite Gateway. Clones share the connection pool and the change feed.
#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
    feed: ChangeFeed,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteDatabase ({}, {} subscriber(s))", self.url, self.feed.subscriber_count())
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the `QRM_DATABASE_URL` environment variable.
    pub async fn new(max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let url = db_url();
        SqliteDatabase::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        Self::new_with_feed(url, max_connections, ChangeFeed::default()).await
    }

    pub async fn new_with_feed(url: &str, max_connections: u32, feed: ChangeFeed) -> Result<Self, SqliteDatabaseError> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool, feed })
    }

    pub async fn run_migrations(&self) -> Result<(), SqliteDatabaseError> {
        sqlx::migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Migrations complete");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn change_feed(&self) -> &ChangeFeed {
        &self.feed
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl StorefrontDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }
}

impl ChangeNotifications for SqliteDatabase {
    fn subscribe(&self, filter: ChangeFilter) -> Subscription {
        self.feed.subscribe(filter)
    }
}

#[async_trait]
impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, GatewayError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::insert_order(order, &mut conn).await?;
        self.feed.publish(ChangeEvent::Orders(RowChange::Insert { new: order.clone() }));
        Ok(order)
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, GatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order(order_id, &mut conn).await?)
    }

    async fn fetch_orders_for_restaurant(&self, restaurant_id: i64, limit: u32) -> Result<Vec<Order>, GatewayError> {
        let mut conn = self.pool.acquire().await?;
        let query = OrderQueryFilter::default().with_restaurant_id(restaurant_id).with_limit(limit);
        Ok(orders::fetch_orders(query, &mut conn).await?)
    }

    async fn update_order_status(
        &self,
        order_id: &OrderId,
        expected: OrderStatusType,
        new_status: OrderStatusType,
    ) -> Result<StatusUpdateResult, GatewayError> {
        let mut tx = self.pool.begin().await?;
        let Some(old) = orders::fetch_order(order_id, &mut tx).await? else {
            return Ok(StatusUpdateResult::NotFound);
        };
        let result = match orders::update_order_status(order_id, expected, new_status, &mut tx).await? {
            Some(new) => StatusUpdateResult::Updated { old, new },
            None => StatusUpdateResult::Conflict(old),
        };
        tx.commit().await?;
        if let StatusUpdateResult::Updated { old, new } = &result {
            debug!("🗃️ Order {order_id} status changed from {} to {}", old.status, new.status);
            self.feed.publish(ChangeEvent::Orders(RowChange::Update { old: old.clone(), new: new.clone() }));
        }
        Ok(result)
    }
}

#[async_trait]
impl MenuManagement for SqliteDatabase {
    async fn insert_menu_item(&self, item: NewMenuItem) -> Result<MenuItem, GatewayError> {
        let mut tx = self.pool.begin().await?;
        let id = menu::insert_menu_item(item, &mut tx).await?;
        let item = menu::fetch_menu_item(id, &mut tx).await?.ok_or(SqliteDatabaseError::MenuItemNotFound(id))?;
        tx.commit().await?;
        self.feed.publish(ChangeEvent::MenuItems(RowChange::Insert { new: item.clone() }));
        Ok(item)
    }

    async fn fetch_menu_item(&self, item_id: i64) -> Result<Option<MenuItem>, GatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(menu::fetch_menu_item(item_id, &mut conn).await?)
    }

    async fn fetch_menu_for_restaurant(
        &self,
        restaurant_id: i64,
        only_available: bool,
    ) -> Result<Vec<MenuItem>, GatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(menu::fetch_menu_for_restaurant(restaurant_id, only_available, &mut conn).await?)
    }

    async fn update_menu_item(&self, item_id: i64, update: MenuItemUpdate) -> Result<Option<MenuItem>, GatewayError> {
        let mut tx = self.pool.begin().await?;
        let Some(old) = menu::fetch_menu_item(item_id, &mut tx).await? else {
            return Ok(None);
        };
        if menu::update_menu_item(item_id, update, &mut tx).await? == 0 {
            return Ok(Some(old));
        }
        let new = menu::fetch_menu_item(item_id, &mut tx).await?.ok_or(SqliteDatabaseError::MenuItemNotFound(item_id))?;
        tx.commit().await?;
        self.feed.publish(ChangeEvent::MenuItems(RowChange::Update { old, new: new.clone() }));
        Ok(Some(new))
    }

    async fn insert_inventory_item(&self, item: NewInventoryItem) -> Result<InventoryItem, GatewayError> {
        let mut conn = self.pool.acquire().await?;
        let item = inventory::insert_inventory_item(item, &mut conn).await?;
        self.feed.publish(ChangeEvent::Inventory(RowChange::Insert { new: item.clone() }));
        Ok(item)
    }

    async fn fetch_inventory_item(&self, item_id: i64) -> Result<Option<InventoryItem>, GatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(inventory::fetch_inventory_item(item_id, &mut conn).await?)
    }

    async fn fetch_inventory_for_restaurant(&self, restaurant_id: i64) -> Result<Vec<InventoryItem>, GatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(inventory::fetch_inventory_for_restaurant(restaurant_id, &mut conn).await?)
    }

    async fn update_inventory_stock(
        &self,
        item_id: i64,
        current_stock: Quantity,
    ) -> Result<Option<InventoryItem>, GatewayError> {
        if current_stock.is_negative() {
            return Err(GatewayError::ConstraintViolation(format!("Stock cannot be negative ({current_stock})")));
        }
        let mut tx = self.pool.begin().await?;
        let Some(old) = inventory::fetch_inventory_item(item_id, &mut tx).await? else {
            return Ok(None);
        };
        let new = inventory::update_stock(item_id, current_stock, &mut tx)
            .await?
            .ok_or(SqliteDatabaseError::InventoryItemNotFound(item_id))?;
        tx.commit().await?;
        self.feed.publish(ChangeEvent::Inventory(RowChange::Update { old, new: new.clone() }));
        Ok(Some(new))
    }
}

#[async_trait]
impl RestaurantManagement for SqliteDatabase {
    async fn upsert_restaurant(&self, owner_id: &str, settings: RestaurantSettings) -> Result<Restaurant, GatewayError> {
        let mut tx = self.pool.begin().await?;
        let restaurant = restaurants::upsert_for_owner(owner_id, settings, &mut tx).await?;
        tx.commit().await?;
        Ok(restaurant)
    }

    async fn fetch_restaurant(&self, restaurant_id: i64) -> Result<Option<Restaurant>, GatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(restaurants::fetch_by_id(restaurant_id, &mut conn).await?)
    }

    async fn fetch_restaurant_by_slug(&self, slug: &str) -> Result<Option<Restaurant>, GatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(restaurants::fetch_by_slug(slug, &mut conn).await?)
    }

    async fn fetch_restaurant_for_owner(&self, owner_id: &str) -> Result<Option<Restaurant>, GatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(restaurants::fetch_for_owner(owner_id, &mut conn).await?)
    }

    async fn insert_review(&self, restaurant_id: i64, review: NewReview) -> Result<Review, GatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(reviews::insert_review(restaurant_id, review, &mut conn).await?)
    }

    async fn fetch_review(&self, review_id: i64) -> Result<Option<Review>, GatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(reviews::fetch_review(review_id, &mut conn).await?)
    }

    async fn fetch_visible_reviews(&self, restaurant_id: i64) -> Result<Vec<Review>, GatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(reviews::fetch_visible_reviews(restaurant_id, &mut conn).await?)
    }

    async fn set_review_visibility(&self, review_id: i64, is_visible: bool) -> Result<Option<Review>, GatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(reviews::set_visibility(review_id, is_visible, &mut conn).await?)
    }
}
