//! Review services

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

use core_kernel::{ensure_id, UserId};
use domain_account::{AccountError, AccountService};

use crate::error::ReviewError;
use crate::ports::{ReviewPort, ReviewPortExt};
use crate::review::{average_rating, fallback_username, Review, ReviewImage, ReviewView};

#[derive(Clone)]
pub struct ReviewService {
    port: Arc<dyn ReviewPort>,
    accounts: AccountService,
}

impl ReviewService {
    pub fn new(port: Arc<dyn ReviewPort>, accounts: AccountService) -> Self {
        Self { port, accounts }
    }

    #[instrument(skip(self, description, images), fields(seller_id = %seller_id, buyer_id = %buyer_id))]
    pub async fn add_review(
        &self,
        seller_id: UserId,
        buyer_id: UserId,
        description: &str,
        images: Vec<ReviewImage>,
        rating: Decimal,
    ) -> Result<Review, ReviewError> {
        let review = Review::new(seller_id, buyer_id, description, images, rating)?;
        let review = self.port.save_review(review, None).await?;
        info!(review_id = %review.id, rating = %review.rating, "Review added");
        self.refresh_seller_trust(seller_id).await?;
        Ok(review)
    }

    /// Edits the review a buyer left for a seller
    #[instrument(skip(self, description, images), fields(seller_id = %seller_id, buyer_id = %buyer_id))]
    pub async fn edit_review(
        &self,
        seller_id: UserId,
        buyer_id: UserId,
        description: &str,
        rating: Decimal,
        images: Option<Vec<ReviewImage>>,
    ) -> Result<Review, ReviewError> {
        let mut review = self.review_of_pair(seller_id, buyer_id).await?;
        review.edit(description, rating, images)?;
        let review = self.port.save_review(review, None).await?;
        self.refresh_seller_trust(seller_id).await?;
        Ok(review)
    }

    #[instrument(skip(self), fields(seller_id = %seller_id, buyer_id = %buyer_id))]
    pub async fn delete_review(&self, seller_id: UserId, buyer_id: UserId) -> Result<(), ReviewError> {
        let review = self.review_of_pair(seller_id, buyer_id).await?;
        self.port.delete_review(review.id, None).await?;
        info!(review_id = %review.id, "Review deleted");
        self.refresh_seller_trust(seller_id).await?;
        Ok(())
    }

    async fn review_of_pair(&self, seller_id: UserId, buyer_id: UserId) -> Result<Review, ReviewError> {
        ensure_id(seller_id.is_nil(), "seller")?;
        ensure_id(buyer_id.is_nil(), "buyer")?;
        self.port
            .find_by_pair(seller_id, buyer_id)
            .await?
            .ok_or(ReviewError::ReviewNotFound)
    }

    pub async fn reviews_of_seller(&self, seller_id: UserId) -> Result<Vec<ReviewView>, ReviewError> {
        ensure_id(seller_id.is_nil(), "seller")?;
        let reviews = self.port.reviews_of_seller(seller_id, None).await?;
        self.with_usernames(reviews).await
    }

    pub async fn reviews_by_buyer(&self, buyer_id: UserId) -> Result<Vec<ReviewView>, ReviewError> {
        ensure_id(buyer_id.is_nil(), "buyer")?;
        let reviews = self.port.reviews_by_buyer(buyer_id, None).await?;
        self.with_usernames(reviews).await
    }

    pub async fn average_score(&self, seller_id: UserId) -> Result<Decimal, ReviewError> {
        ensure_id(seller_id.is_nil(), "seller")?;
        let reviews = self.port.reviews_of_seller(seller_id, None).await?;
        Ok(average_rating(&reviews))
    }

    /// Pushes the current average score into the seller's trust score
    ///
    /// Reviews may target users without a seller profile; those are skipped.
    async fn refresh_seller_trust(&self, seller_id: UserId) -> Result<(), ReviewError> {
        let average = self.average_score(seller_id).await?;
        match self.accounts.update_seller_trust(seller_id, average).await {
            Ok(seller) => {
                debug!(seller_id = %seller_id, trust_score = %seller.trust_score, "Seller trust refreshed");
                Ok(())
            }
            Err(AccountError::NotASeller(_)) => {
                warn!(seller_id = %seller_id, "Reviewed user has no seller profile");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn with_usernames(&self, reviews: Vec<Review>) -> Result<Vec<ReviewView>, ReviewError> {
        let mut names: HashMap<UserId, String> = HashMap::new();
        let mut views = Vec::with_capacity(reviews.len());
        for review in reviews {
            let seller_username = self.username(review.seller_id, &mut names).await;
            let buyer_username = self.username(review.buyer_id, &mut names).await;
            views.push(ReviewView {
                review,
                seller_username,
                buyer_username,
            });
        }
        Ok(views)
    }

    async fn username(&self, user_id: UserId, cache: &mut HashMap<UserId, String>) -> String {
        if let Some(name) = cache.get(&user_id) {
            return name.clone();
        }
        let name = match self.accounts.get_user(user_id).await {
            Ok(user) => user.username,
            Err(e) => {
                debug!(user_id = %user_id, error = %e, "Username lookup failed");
                fallback_username(user_id)
            }
        };
        cache.insert(user_id, name.clone());
        name
    }
}
