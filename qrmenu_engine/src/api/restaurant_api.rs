use std::fmt::Debug;

use log::*;

use crate::{
    api::errors::MenuApiError,
    db::traits::{GatewayError, RestaurantManagement},
    db_types::{NewReview, PublicBranding, Restaurant, RestaurantSettings, Review},
};

/// Slugs are lower-case letters, digits and single hyphens, e.g. `spice-garden-2`
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty() &&
        slug.len() <= 64 &&
        !slug.starts_with('-') &&
        !slug.ends_with('-') &&
        !slug.contains("--") &&
        slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Restaurant settings and customer reviews
#[derive(Clone)]
pub struct RestaurantApi<B> {
    db: B,
}

impl<B> Debug for RestaurantApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RestaurantApi")
    }
}

impl<B> RestaurantApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> RestaurantApi<B>
where B: RestaurantManagement
{
    /// Saves the owner's settings. The first save creates the restaurant; the slug is fixed from then on.
    pub async fn save_settings(&self, owner_id: &str, settings: RestaurantSettings) -> Result<Restaurant, MenuApiError> {
        if settings.name.trim().is_empty() {
            return Err(MenuApiError::Validation("The restaurant needs a name".into()));
        }
        if !is_valid_slug(&settings.slug) {
            return Err(MenuApiError::Validation(format!(
                "'{}' is not a valid URL name. Use lower-case letters, digits and hyphens",
                settings.slug
            )));
        }
        if settings.total_tables < 0 {
            return Err(MenuApiError::Validation("The number of tables cannot be negative".into()));
        }
        if let Some(existing) = self.db.fetch_restaurant_for_owner(owner_id).await? {
            if existing.slug != settings.slug {
                return Err(MenuApiError::SlugImmutable);
            }
        }
        let slug = settings.slug.clone();
        match self.db.upsert_restaurant(owner_id, settings).await {
            Ok(r) => {
                debug!("🪛️ Settings for '{}' saved", r.slug);
                Ok(r)
            },
            Err(GatewayError::Duplicate(_)) => Err(MenuApiError::SlugTaken(slug)),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn restaurant_for_owner(&self, owner_id: &str) -> Result<Restaurant, MenuApiError> {
        self.db.fetch_restaurant_for_owner(owner_id).await?.ok_or(MenuApiError::NoRestaurant)
    }

    pub async fn restaurant_by_slug(&self, slug: &str) -> Result<Restaurant, MenuApiError> {
        self.db.fetch_restaurant_by_slug(slug).await?.ok_or_else(|| MenuApiError::RestaurantNotFound(slug.to_string()))
    }

    pub async fn branding(&self, restaurant_id: i64) -> Result<Option<PublicBranding>, MenuApiError> {
        let restaurant = self.db.fetch_restaurant(restaurant_id).await?;
        Ok(restaurant.as_ref().map(PublicBranding::from))
    }

    /// Stores a customer review. It stays hidden until the owner approves it.
    pub async fn submit_review(&self, slug: &str, review: NewReview) -> Result<Review, MenuApiError> {
        if !review.is_valid_rating() {
            return Err(MenuApiError::Validation(format!("Ratings go from 1 to 5, not {}", review.rating)));
        }
        if review.author_name.trim().is_empty() {
            return Err(MenuApiError::Validation("Please tell us your name".into()));
        }
        let restaurant = self.restaurant_by_slug(slug).await?;
        let review = self.db.insert_review(restaurant.id, review).await?;
        info!("🪛️ New {}-star review for '{slug}' awaiting approval", review.rating);
        Ok(review)
    }

    pub async fn set_review_visibility(
        &self,
        restaurant_id: i64,
        review_id: i64,
        is_visible: bool,
    ) -> Result<Review, MenuApiError> {
        let review =
            self.db.fetch_review(review_id).await?.ok_or_else(|| MenuApiError::NotFound(format!("Review {review_id}")))?;
        if review.restaurant_id != restaurant_id {
            return Err(MenuApiError::Forbidden(format!("Review {review_id}")));
        }
        self.db
            .set_review_visibility(review_id, is_visible)
            .await?
            .ok_or_else(|| MenuApiError::NotFound(format!("Review {review_id}")))
    }

    pub async fn visible_reviews(&self, restaurant_id: i64) -> Result<Vec<Review>, MenuApiError> {
        Ok(self.db.fetch_visible_reviews(restaurant_id).await?)
    }
}
