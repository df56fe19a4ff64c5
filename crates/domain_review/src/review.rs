//! Seller reviews written by buyers
//!
//! A review belongs to a (seller, buyer) pair rather than to a product; the
//! product can be mentioned in the description or shown in the images.

use chrono::{DateTime, Utc};
use core_kernel::{ensure_id, ImageId, ReviewId, UserId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ReviewError;

pub const MIN_RATING: Decimal = Decimal::ZERO;
pub const MAX_RATING: Decimal = dec!(5);

/// Ratings outside [0, 5] are pulled back into range
pub fn clamp_rating(rating: Decimal) -> Decimal {
    rating.clamp(MIN_RATING, MAX_RATING)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewImage {
    pub id: ImageId,
    pub url: String,
}

impl ReviewImage {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            id: ImageId::new_v7(),
            url: url.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub seller_id: UserId,
    pub buyer_id: UserId,
    pub description: String,
    pub images: Vec<ReviewImage>,
    pub rating: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Review {
    pub fn new(
        seller_id: UserId,
        buyer_id: UserId,
        description: impl Into<String>,
        images: Vec<ReviewImage>,
        rating: Decimal,
    ) -> Result<Self, ReviewError> {
        ensure_id(seller_id.is_nil(), "seller")?;
        ensure_id(buyer_id.is_nil(), "buyer")?;
        let description = description.into();
        if description.trim().is_empty() {
            return Err(ReviewError::BlankDescription);
        }
        Ok(Self {
            id: ReviewId::new_v7(),
            seller_id,
            buyer_id,
            description,
            images,
            rating: clamp_rating(rating),
            created_at: Utc::now(),
        })
    }

    /// Replaces description and rating; images are replaced only when given
    pub fn edit(
        &mut self,
        description: impl Into<String>,
        rating: Decimal,
        images: Option<Vec<ReviewImage>>,
    ) -> Result<(), ReviewError> {
        let description = description.into();
        if description.trim().is_empty() {
            return Err(ReviewError::BlankDescription);
        }
        self.description = description;
        self.rating = clamp_rating(rating);
        if let Some(images) = images {
            self.images = images;
        }
        Ok(())
    }
}

/// Mean rating rounded to two places, zero when there are no reviews
pub fn average_rating(reviews: &[Review]) -> Decimal {
    if reviews.is_empty() {
        return Decimal::ZERO;
    }
    let total: Decimal = reviews.iter().map(|r| r.rating).sum();
    (total / Decimal::from(reviews.len())).round_dp(2)
}

/// A review with the usernames of both parties resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewView {
    #[serde(flatten)]
    pub review: Review,
    pub seller_username: String,
    pub buyer_username: String,
}

/// Name shown for users that cannot be looked up
pub fn fallback_username(user_id: UserId) -> String {
    format!("User #{}", user_id)
}
