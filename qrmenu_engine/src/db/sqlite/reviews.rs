use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{NewReview, Review},
};

const REVIEW_COLUMNS: &str = "id, restaurant_id, author_name, rating, comment, is_visible, created_at";

pub async fn insert_review(
    restaurant_id: i64,
    review: NewReview,
    conn: &mut SqliteConnection,
) -> Result<Review, SqliteDatabaseError> {
    let sql = format!(
        "INSERT INTO reviews (restaurant_id, author_name, rating, comment, is_visible) VALUES ($1, $2, $3, $4, 0) \
         RETURNING {REVIEW_COLUMNS}"
    );
    let review = sqlx::query_as::<_, Review>(&sql)
        .bind(restaurant_id)
        .bind(review.author_name)
        .bind(review.rating)
        .bind(review.comment)
        .fetch_one(conn)
        .await?;
    Ok(review)
}

pub async fn fetch_review(review_id: i64, conn: &mut SqliteConnection) -> Result<Option<Review>, SqliteDatabaseError> {
    let sql = format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1");
    Ok(sqlx::query_as::<_, Review>(&sql).bind(review_id).fetch_optional(conn).await?)
}

pub async fn fetch_visible_reviews(
    restaurant_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Review>, SqliteDatabaseError> {
    let sql = format!(
        "SELECT {REVIEW_COLUMNS} FROM reviews WHERE restaurant_id = $1 AND is_visible = 1 ORDER BY created_at DESC, id \
         DESC"
    );
    Ok(sqlx::query_as::<_, Review>(&sql).bind(restaurant_id).fetch_all(conn).await?)
}

pub async fn set_visibility(
    review_id: i64,
    is_visible: bool,
    conn: &mut SqliteConnection,
) -> Result<Option<Review>, SqliteDatabaseError> {
    let sql = format!("UPDATE reviews SET is_visible = $1 WHERE id = $2 RETURNING {REVIEW_COLUMNS}");
    Ok(sqlx::query_as::<_, Review>(&sql).bind(is_visible).bind(review_id).fetch_optional(conn).await?)
}
