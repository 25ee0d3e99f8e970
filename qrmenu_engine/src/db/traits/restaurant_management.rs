use async_trait::async_trait;

use crate::{
    db::traits::GatewayError,
    db_types::{NewReview, Restaurant, RestaurantSettings, Review},
};

#[async_trait]
pub trait RestaurantManagement: Send + Sync {
    /// Creates the owner's restaurant on first save, and updates it afterwards.
    ///
    /// An owner has at most one restaurant. The slug is only written on creation; later saves leave it untouched.
    async fn upsert_restaurant(&self, owner_id: &str, settings: RestaurantSettings) -> Result<Restaurant, GatewayError>;

    async fn fetch_restaurant(&self, restaurant_id: i64) -> Result<Option<Restaurant>, GatewayError>;

    async fn fetch_restaurant_by_slug(&self, slug: &str) -> Result<Option<Restaurant>, GatewayError>;

    async fn fetch_restaurant_for_owner(&self, owner_id: &str) -> Result<Option<Restaurant>, GatewayError>;

    /// Stores a customer review. New reviews are hidden until the owner makes them visible.
    async fn insert_review(&self, restaurant_id: i64, review: NewReview) -> Result<Review, GatewayError>;

    async fn fetch_review(&self, review_id: i64) -> Result<Option<Review>, GatewayError>;

    /// Visible reviews for the restaurant, newest first.
    async fn fetch_visible_reviews(&self, restaurant_id: i64) -> Result<Vec<Review>, GatewayError>;

    async fn set_review_visibility(&self, review_id: i64, is_visible: bool) -> Result<Option<Review>, GatewayError>;
}
