//! Review Domain Ports

use async_trait::async_trait;

use core_kernel::{DomainPort, HealthCheckable, OperationMetadata, PortError, ReviewId, UserId};

use crate::review::Review;

#[async_trait]
pub trait ReviewPort: DomainPort + HealthCheckable {
    /// Inserts or replaces a review with its images
    async fn save_review(&self, review: Review, metadata: Option<OperationMetadata>) -> Result<Review, PortError>;

    async fn delete_review(&self, id: ReviewId, metadata: Option<OperationMetadata>) -> Result<(), PortError>;

    /// Reviews received by a seller, oldest first
    async fn reviews_of_seller(
        &self,
        seller_id: UserId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Review>, PortError>;

    /// Reviews written by a buyer, oldest first
    async fn reviews_by_buyer(
        &self,
        buyer_id: UserId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Review>, PortError>;
}

#[async_trait]
pub trait ReviewPortExt: ReviewPort {
    /// The first review a buyer left for a seller
    async fn find_by_pair(&self, seller_id: UserId, buyer_id: UserId) -> Result<Option<Review>, PortError> {
        Ok(self
            .reviews_by_buyer(buyer_id, None)
            .await?
            .into_iter()
            .find(|r| r.seller_id == seller_id))
    }
}

impl<T: ReviewPort + ?Sized> ReviewPortExt for T {}

#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use core_kernel::HealthCheckResult;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    #[derive(Debug, Default, Clone)]
    pub struct MockReviewPort {
        reviews: Arc<RwLock<HashMap<ReviewId, Review>>>,
    }

    impl MockReviewPort {
        pub fn new() -> Self {
            Self::default()
        }

        async fn matching(&self, predicate: impl Fn(&Review) -> bool) -> Vec<Review> {
            let mut reviews: Vec<Review> = self
                .reviews
                .read()
                .await
                .values()
                .filter(|r| predicate(r))
                .cloned()
                .collect();
            reviews.sort_by_key(|r| r.id);
            reviews
        }
    }

    impl DomainPort for MockReviewPort {}

    #[async_trait]
    impl HealthCheckable for MockReviewPort {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("mock-review-port")
        }
    }

    #[async_trait]
    impl ReviewPort for MockReviewPort {
        async fn save_review(&self, review: Review, _metadata: Option<OperationMetadata>) -> Result<Review, PortError> {
            self.reviews.write().await.insert(review.id, review.clone());
            Ok(review)
        }

        async fn delete_review(&self, id: ReviewId, _metadata: Option<OperationMetadata>) -> Result<(), PortError> {
            self.reviews
                .write()
                .await
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| PortError::not_found("Review", id))
        }

        async fn reviews_of_seller(
            &self,
            seller_id: UserId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<Review>, PortError> {
            Ok(self.matching(|r| r.seller_id == seller_id).await)
        }

        async fn reviews_by_buyer(
            &self,
            buyer_id: UserId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<Review>, PortError> {
            Ok(self.matching(|r| r.buyer_id == buyer_id).await)
        }
    }
}
