//! PostgreSQL tracking adapter
//!
//! ```sql
//! CREATE TABLE tracked_orders (
//!     id                      UUID PRIMARY KEY,
//!     order_id                UUID NOT NULL UNIQUE,
//!     current_status          TEXT NOT NULL,
//!     estimated_delivery_date DATE NOT NULL,
//!     delivery_address        TEXT NOT NULL
//! );
//!
//! CREATE TABLE order_checkpoints (
//!     id               UUID PRIMARY KEY,
//!     tracked_order_id UUID        NOT NULL REFERENCES tracked_orders (id) ON DELETE CASCADE,
//!     timestamp        TIMESTAMPTZ NOT NULL,
//!     location         TEXT,
//!     description      TEXT        NOT NULL,
//!     status           TEXT        NOT NULL
//! );
//! ```

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{
    CheckpointId, DomainPort, HealthCheckResult, HealthCheckable, OperationMetadata, OrderId, PortError,
    TrackedOrderId,
};
use domain_order::{OrderCheckpoint, OrderStatus, TrackedOrder, TrackingPort};

use super::{parse_label, port_err};
use crate::error::DatabaseError;
use crate::pool::check_pool;

#[derive(Debug, FromRow)]
struct TrackedOrderRow {
    id: Uuid,
    order_id: Uuid,
    current_status: String,
    estimated_delivery_date: NaiveDate,
    delivery_address: String,
}

impl TrackedOrderRow {
    fn into_tracked(self) -> Result<TrackedOrder, DatabaseError> {
        Ok(TrackedOrder {
            id: TrackedOrderId::from(self.id),
            order_id: OrderId::from(self.order_id),
            current_status: parse_label::<OrderStatus>(&self.current_status)?,
            estimated_delivery_date: self.estimated_delivery_date,
            delivery_address: self.delivery_address,
        })
    }
}

#[derive(Debug, FromRow)]
struct CheckpointRow {
    id: Uuid,
    tracked_order_id: Uuid,
    timestamp: DateTime<Utc>,
    location: Option<String>,
    description: String,
    status: String,
}

impl CheckpointRow {
    fn into_checkpoint(self) -> Result<OrderCheckpoint, DatabaseError> {
        Ok(OrderCheckpoint {
            id: CheckpointId::from(self.id),
            tracked_order_id: TrackedOrderId::from(self.tracked_order_id),
            timestamp: self.timestamp,
            location: self.location,
            description: self.description,
            status: parse_label::<OrderStatus>(&self.status)?,
        })
    }
}

const TRACKED_COLUMNS: &str = "id, order_id, current_status, estimated_delivery_date, delivery_address";
const CHECKPOINT_COLUMNS: &str = "id, tracked_order_id, timestamp, location, description, status";

/// PostgreSQL-backed [`TrackingPort`]
#[derive(Debug, Clone)]
pub struct PostgresTrackingAdapter {
    pool: PgPool,
}

impl PostgresTrackingAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn tracked_where(&self, column: &str, id: Uuid) -> Result<Option<TrackedOrder>, PortError> {
        let row: Option<TrackedOrderRow> = sqlx::query_as(&format!(
            "SELECT {} FROM tracked_orders WHERE {} = $1",
            TRACKED_COLUMNS, column
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(port_err)?;
        row.map(TrackedOrderRow::into_tracked).transpose().map_err(port_err)
    }
}

impl DomainPort for PostgresTrackingAdapter {}

#[async_trait]
impl HealthCheckable for PostgresTrackingAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        check_pool(&self.pool, "postgres-tracking-adapter").await
    }
}

#[async_trait]
impl TrackingPort for PostgresTrackingAdapter {
    #[instrument(skip(self, tracked, _metadata), fields(tracked_order_id = %tracked.id, status = %tracked.current_status))]
    async fn save_tracked_order(
        &self,
        tracked: TrackedOrder,
        _metadata: Option<OperationMetadata>,
    ) -> Result<TrackedOrder, PortError> {
        sqlx::query(&format!(
            "INSERT INTO tracked_orders ({}) VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (id) DO UPDATE SET current_status = EXCLUDED.current_status, \
             estimated_delivery_date = EXCLUDED.estimated_delivery_date, \
             delivery_address = EXCLUDED.delivery_address",
            TRACKED_COLUMNS
        ))
        .bind(*tracked.id.as_uuid())
        .bind(*tracked.order_id.as_uuid())
        .bind(tracked.current_status.as_str())
        .bind(tracked.estimated_delivery_date)
        .bind(&tracked.delivery_address)
        .execute(&self.pool)
        .await
        .map_err(port_err)?;
        Ok(tracked)
    }

    async fn get_tracked_order(
        &self,
        id: TrackedOrderId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<TrackedOrder, PortError> {
        self.tracked_where("id", *id.as_uuid())
            .await?
            .ok_or_else(|| PortError::not_found("TrackedOrder", id))
    }

    async fn find_tracked_order_by_order(
        &self,
        order_id: OrderId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Option<TrackedOrder>, PortError> {
        self.tracked_where("order_id", *order_id.as_uuid()).await
    }

    /// Checkpoints go first in the same transaction
    #[instrument(skip(self, _metadata), fields(tracked_order_id = %id))]
    async fn delete_tracked_order(
        &self,
        id: TrackedOrderId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError> {
        let mut tx = self.pool.begin().await.map_err(port_err)?;
        let removed = sqlx::query("DELETE FROM order_checkpoints WHERE tracked_order_id = $1")
            .bind(*id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(port_err)?
            .rows_affected();
        let result = sqlx::query("DELETE FROM tracked_orders WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(port_err)?;
        if result.rows_affected() == 0 {
            return Err(PortError::not_found("TrackedOrder", id));
        }
        tx.commit().await.map_err(port_err)?;
        debug!(checkpoints = removed, "Tracked order deleted");
        Ok(())
    }

    #[instrument(skip(self, checkpoint, _metadata), fields(tracked_order_id = %checkpoint.tracked_order_id))]
    async fn add_checkpoint(
        &self,
        checkpoint: OrderCheckpoint,
        _metadata: Option<OperationMetadata>,
    ) -> Result<OrderCheckpoint, PortError> {
        let result = sqlx::query(&format!(
            "INSERT INTO order_checkpoints ({}) \
             SELECT $1, $2, $3, $4, $5, $6 WHERE EXISTS (SELECT 1 FROM tracked_orders WHERE id = $2)",
            CHECKPOINT_COLUMNS
        ))
        .bind(*checkpoint.id.as_uuid())
        .bind(*checkpoint.tracked_order_id.as_uuid())
        .bind(checkpoint.timestamp)
        .bind(&checkpoint.location)
        .bind(&checkpoint.description)
        .bind(checkpoint.status.as_str())
        .execute(&self.pool)
        .await
        .map_err(port_err)?;
        if result.rows_affected() == 0 {
            return Err(PortError::not_found("TrackedOrder", checkpoint.tracked_order_id));
        }
        Ok(checkpoint)
    }

    async fn update_checkpoint(
        &self,
        checkpoint: OrderCheckpoint,
        _metadata: Option<OperationMetadata>,
    ) -> Result<OrderCheckpoint, PortError> {
        let result = sqlx::query(
            "UPDATE order_checkpoints SET timestamp = $2, location = $3, description = $4, status = $5 \
             WHERE id = $1",
        )
        .bind(*checkpoint.id.as_uuid())
        .bind(checkpoint.timestamp)
        .bind(&checkpoint.location)
        .bind(&checkpoint.description)
        .bind(checkpoint.status.as_str())
        .execute(&self.pool)
        .await
        .map_err(port_err)?;
        if result.rows_affected() == 0 {
            return Err(PortError::not_found("OrderCheckpoint", checkpoint.id));
        }
        Ok(checkpoint)
    }

    async fn get_checkpoint(
        &self,
        id: CheckpointId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<OrderCheckpoint, PortError> {
        let row: Option<CheckpointRow> =
            sqlx::query_as(&format!("SELECT {} FROM order_checkpoints WHERE id = $1", CHECKPOINT_COLUMNS))
                .bind(*id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(port_err)?;
        row.ok_or_else(|| PortError::not_found("OrderCheckpoint", id))?
            .into_checkpoint()
            .map_err(port_err)
    }

    async fn delete_checkpoint(&self, id: CheckpointId, _metadata: Option<OperationMetadata>) -> Result<(), PortError> {
        let result = sqlx::query("DELETE FROM order_checkpoints WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(port_err)?;
        if result.rows_affected() == 0 {
            return Err(PortError::not_found("OrderCheckpoint", id));
        }
        Ok(())
    }

    async fn checkpoints_of(
        &self,
        tracked_order_id: TrackedOrderId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<OrderCheckpoint>, PortError> {
        let rows: Vec<CheckpointRow> = sqlx::query_as(&format!(
            "SELECT {} FROM order_checkpoints WHERE tracked_order_id = $1 ORDER BY timestamp, id",
            CHECKPOINT_COLUMNS
        ))
        .bind(*tracked_order_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(port_err)?;
        rows.into_iter()
            .map(|row| row.into_checkpoint().map_err(port_err))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels_round_trip_through_rows() {
        let row = CheckpointRow {
            id: Uuid::new_v4(),
            tracked_order_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            location: Some("Cluj hub".to_string()),
            description: "Left the warehouse".to_string(),
            status: OrderStatus::InTransit.as_str().to_string(),
        };
        assert_eq!(row.into_checkpoint().unwrap().status, OrderStatus::InTransit);
    }

    #[test]
    fn test_unknown_status_fails() {
        let row = TrackedOrderRow {
            id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            current_status: "LOST_AT_SEA".to_string(),
            estimated_delivery_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            delivery_address: "Str. Lunga 4".to_string(),
        };
        assert!(row.into_tracked().is_err());
    }
}
