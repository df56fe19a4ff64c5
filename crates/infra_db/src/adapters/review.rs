//! PostgreSQL review adapter
//!
//! ```sql
//! CREATE TABLE reviews (
//!     id          UUID PRIMARY KEY,
//!     seller_id   UUID        NOT NULL,
//!     buyer_id    UUID        NOT NULL,
//!     description TEXT        NOT NULL,
//!     images      JSONB       NOT NULL DEFAULT '[]',
//!     rating      NUMERIC     NOT NULL,
//!     created_at  TIMESTAMPTZ NOT NULL
//! );
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{DomainPort, HealthCheckResult, HealthCheckable, OperationMetadata, PortError, ReviewId, UserId};
use domain_review::{Review, ReviewPort};

use super::port_err;
use crate::error::DatabaseError;
use crate::pool::check_pool;

#[derive(Debug, FromRow)]
struct ReviewRow {
    id: Uuid,
    seller_id: Uuid,
    buyer_id: Uuid,
    description: String,
    images: serde_json::Value,
    rating: Decimal,
    created_at: DateTime<Utc>,
}

impl ReviewRow {
    fn into_review(self) -> Result<Review, DatabaseError> {
        Ok(Review {
            id: ReviewId::from(self.id),
            seller_id: UserId::from(self.seller_id),
            buyer_id: UserId::from(self.buyer_id),
            description: self.description,
            images: serde_json::from_value(self.images)?,
            rating: self.rating,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PostgresReviewAdapter {
    pool: PgPool,
}

impl PostgresReviewAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn reviews_where(&self, column: &str, user_id: UserId) -> Result<Vec<Review>, PortError> {
        let rows: Vec<ReviewRow> = sqlx::query_as(&format!(
            "SELECT id, seller_id, buyer_id, description, images, rating, created_at \
             FROM reviews WHERE {} = $1 ORDER BY id",
            column
        ))
        .bind(*user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(port_err)?;
        rows.into_iter()
            .map(|row| row.into_review().map_err(port_err))
            .collect()
    }
}

impl DomainPort for PostgresReviewAdapter {}

#[async_trait]
impl HealthCheckable for PostgresReviewAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        check_pool(&self.pool, "postgres-review-adapter").await
    }
}

#[async_trait]
impl ReviewPort for PostgresReviewAdapter {
    #[instrument(skip(self, review, _metadata), fields(review_id = %review.id, seller_id = %review.seller_id))]
    async fn save_review(&self, review: Review, _metadata: Option<OperationMetadata>) -> Result<Review, PortError> {
        let images = serde_json::to_value(&review.images).map_err(port_err)?;
        sqlx::query(
            "INSERT INTO reviews (id, seller_id, buyer_id, description, images, rating, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (id) DO UPDATE SET description = EXCLUDED.description, \
             images = EXCLUDED.images, rating = EXCLUDED.rating",
        )
        .bind(*review.id.as_uuid())
        .bind(*review.seller_id.as_uuid())
        .bind(*review.buyer_id.as_uuid())
        .bind(&review.description)
        .bind(images)
        .bind(review.rating)
        .bind(review.created_at)
        .execute(&self.pool)
        .await
        .map_err(port_err)?;
        debug!("Review stored");
        Ok(review)
    }

    async fn delete_review(&self, id: ReviewId, _metadata: Option<OperationMetadata>) -> Result<(), PortError> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(port_err)?;
        if result.rows_affected() == 0 {
            return Err(PortError::not_found("Review", id));
        }
        Ok(())
    }

    async fn reviews_of_seller(
        &self,
        seller_id: UserId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Review>, PortError> {
        self.reviews_where("seller_id", seller_id).await
    }

    async fn reviews_by_buyer(
        &self,
        buyer_id: UserId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Review>, PortError> {
        self.reviews_where("buyer_id", buyer_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_images_are_decoded() {
        let row = ReviewRow {
            id: Uuid::new_v4(),
            seller_id: Uuid::new_v4(),
            buyer_id: Uuid::new_v4(),
            description: "Quick delivery".to_string(),
            images: serde_json::json!([{"id": Uuid::new_v4(), "url": "https://img.market.ro/1.png"}]),
            rating: dec!(4.5),
            created_at: Utc::now(),
        };
        let review = row.into_review().unwrap();
        assert_eq!(review.images.len(), 1);
        assert_eq!(review.images[0].url, "https://img.market.ro/1.png");
    }
}
