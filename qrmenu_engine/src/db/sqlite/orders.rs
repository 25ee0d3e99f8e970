use chrono::{SecondsFormat, Utc};
use log::{debug, trace};
use sqlx::{sqlite::SqliteRow, types::Json, FromRow, QueryBuilder, Row, SqliteConnection};

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{GeoPoint, NewOrder, Order, OrderId, OrderLine, OrderStatusType},
};

const ORDER_COLUMNS: &str = "id, restaurant_id, customer_name, customer_phone, customer_address, latitude, longitude, \
                             order_details, total_amount, status, payment_method, order_type, table_number, \
                             created_at, updated_at";

impl<'r> FromRow<'r, SqliteRow> for Order {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let latitude: Option<f64> = row.try_get("latitude")?;
        let longitude: Option<f64> = row.try_get("longitude")?;
        let location = match (latitude, longitude) {
            (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
            _ => None,
        };
        let order_details: Json<Vec<OrderLine>> = row.try_get("order_details")?;
        Ok(Self {
            id: row.try_get("id")?,
            restaurant_id: row.try_get("restaurant_id")?,
            customer_name: row.try_get("customer_name")?,
            customer_phone: row.try_get("customer_phone")?,
            customer_address: row.try_get("customer_address")?,
            location,
            order_details: order_details.0,
            total_amount: row.try_get("total_amount")?,
            status: row.try_get("status")?,
            payment_method: row.try_get("payment_method")?,
            order_type: row.try_get("order_type")?,
            table_number: row.try_get("table_number")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Fixed-width timestamps, so that text ordering and chronological ordering agree
fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Inserts a new order into the database using the given connection. This is not atomic on its own; pass `&mut *tx`
/// to embed it in a transaction.
///
/// The status is always `pending` and the total is computed from the lines.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, SqliteDatabaseError> {
    let id = OrderId::random();
    let now = timestamp_now();
    let total = order
        .total_amount()
        .ok_or_else(|| SqliteDatabaseError::QueryError("The order total does not fit in a money amount".into()))?;
    let (latitude, longitude) = order.location.map(|p| (Some(p.latitude), Some(p.longitude))).unwrap_or_default();
    let sql = format!(
        "INSERT INTO orders ({ORDER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, \
         $15) RETURNING {ORDER_COLUMNS}"
    );
    let order = sqlx::query_as::<_, Order>(&sql)
        .bind(id.as_str())
        .bind(order.restaurant_id)
        .bind(order.customer_name)
        .bind(order.customer_phone)
        .bind(order.customer_address)
        .bind(latitude)
        .bind(longitude)
        .bind(Json(order.order_details))
        .bind(total)
        .bind(OrderStatusType::Pending)
        .bind(order.payment_method)
        .bind(order.order_type)
        .bind(order.table_number)
        .bind(&now)
        .bind(&now)
        .fetch_one(conn)
        .await?;
    debug!("🗃️ Order {} has been saved in the DB", order.id);
    Ok(order)
}

pub async fn fetch_order(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, SqliteDatabaseError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
    let order = sqlx::query_as::<_, Order>(&sql).bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

#[derive(Debug, Clone, Default)]
pub struct OrderQueryFilter {
    restaurant_id: Option<i64>,
    limit: Option<u32>,
}

impl OrderQueryFilter {
    pub fn with_restaurant_id(mut self, restaurant_id: i64) -> Self {
        self.restaurant_id = Some(restaurant_id);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.restaurant_id.is_none()
    }
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`
///
/// Resulting orders are ordered newest first. Orders created in the same microsecond keep their insertion order.
pub async fn fetch_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, SqliteDatabaseError> {
    let mut builder = QueryBuilder::new(format!("SELECT {ORDER_COLUMNS} FROM orders "));
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(id) = query.restaurant_id {
        where_clause.push("restaurant_id = ");
        where_clause.push_bind_unseparated(id);
    }
    builder.push(" ORDER BY created_at DESC, rowid DESC");
    if let Some(limit) = query.limit {
        builder.push(" LIMIT ");
        builder.push_bind(i64::from(limit));
    }
    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("🗃️ Result of fetch_orders: {}", orders.len());
    Ok(orders)
}

/// Compare-and-set on the status column. Returns the updated row, or `None` if the order does not exist or its status
/// was not `expected`.
pub(crate) async fn update_order_status(
    order_id: &OrderId,
    expected: OrderStatusType,
    new_status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, SqliteDatabaseError> {
    let sql = format!(
        "UPDATE orders SET status = $1, updated_at = $2 WHERE id = $3 AND status = $4 RETURNING {ORDER_COLUMNS}"
    );
    let order = sqlx::query_as::<_, Order>(&sql)
        .bind(new_status)
        .bind(timestamp_now())
        .bind(order_id.as_str())
        .bind(expected)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}
