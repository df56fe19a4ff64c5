//! Delivery tracking
//!
//! A tracked order carries its current status and a timeline of
//! checkpoints. The newest checkpoint always agrees with the current status;
//! reverting drops the newest one and restores the status before it.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use core_kernel::{ensure_id, CheckpointId, OrderId, TrackedOrderId};

use crate::error::OrderError;
use crate::ports::TrackingPort;

pub const INITIAL_CHECKPOINT_DESCRIPTION: &str = "Order created and being tracked";
pub const DEFAULT_CHECKPOINT_DESCRIPTION: &str = "Status updated";
pub const DEFAULT_DELIVERY_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Processing,
    Shipped,
    InWarehouse,
    InTransit,
    OutForDelivery,
    Delivered,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::InWarehouse => "IN_WAREHOUSE",
            OrderStatus::InTransit => "IN_TRANSIT",
            OrderStatus::OutForDelivery => "OUT_FOR_DELIVERY",
            OrderStatus::Delivered => "DELIVERED",
        }
    }

    /// Share of the delivery completed, shown on the progress bar
    pub fn progress_percentage(&self) -> u8 {
        match self {
            OrderStatus::Processing => 20,
            OrderStatus::Shipped => 40,
            OrderStatus::InWarehouse => 60,
            OrderStatus::InTransit => 75,
            OrderStatus::OutForDelivery => 90,
            OrderStatus::Delivered => 100,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        [
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::InWarehouse,
            OrderStatus::InTransit,
            OrderStatus::OutForDelivery,
            OrderStatus::Delivered,
        ]
        .into_iter()
        .find(|status| status.as_str() == normalized)
        .ok_or_else(|| OrderError::UnknownStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedOrder {
    pub id: TrackedOrderId,
    pub order_id: OrderId,
    pub current_status: OrderStatus,
    pub estimated_delivery_date: NaiveDate,
    pub delivery_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCheckpoint {
    pub id: CheckpointId,
    pub tracked_order_id: TrackedOrderId,
    pub timestamp: DateTime<Utc>,
    pub location: Option<String>,
    pub description: String,
    pub status: OrderStatus,
}

impl OrderCheckpoint {
    pub fn new(
        tracked_order_id: TrackedOrderId,
        status: OrderStatus,
        location: Option<String>,
        description: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: CheckpointId::new_v7(),
            tracked_order_id,
            timestamp,
            location,
            description: description.into(),
            status,
        }
    }
}

#[derive(Clone)]
pub struct TrackingService {
    port: Arc<dyn TrackingPort>,
}

impl TrackingService {
    pub fn new(port: Arc<dyn TrackingPort>) -> Self {
        Self { port }
    }

    pub async fn create_tracked_order_for_order(
        &self,
        order_id: OrderId,
        delivery_address: &str,
    ) -> Result<TrackedOrder, OrderError> {
        self.create_tracked_order_for_order_at(order_id, delivery_address, None, Utc::now())
            .await
    }

    /// Starts tracking an order with an initial PROCESSING checkpoint
    ///
    /// The estimated delivery defaults to a week from `now`.
    #[instrument(skip(self, delivery_address, now), fields(order_id = %order_id))]
    pub async fn create_tracked_order_for_order_at(
        &self,
        order_id: OrderId,
        delivery_address: &str,
        estimated_delivery_date: Option<NaiveDate>,
        now: DateTime<Utc>,
    ) -> Result<TrackedOrder, OrderError> {
        ensure_id(order_id.is_nil(), "order")?;
        if delivery_address.trim().is_empty() {
            return Err(OrderError::invalid_field("delivery_address", "Delivery address is required"));
        }

        let tracked = TrackedOrder {
            id: TrackedOrderId::new_v7(),
            order_id,
            current_status: OrderStatus::Processing,
            estimated_delivery_date: estimated_delivery_date
                .unwrap_or_else(|| (now + Duration::days(DEFAULT_DELIVERY_DAYS)).date_naive()),
            delivery_address: delivery_address.trim().to_string(),
        };
        let tracked = self.port.save_tracked_order(tracked, None).await?;
        self.port
            .add_checkpoint(
                OrderCheckpoint::new(
                    tracked.id,
                    OrderStatus::Processing,
                    Some(tracked.delivery_address.clone()),
                    INITIAL_CHECKPOINT_DESCRIPTION,
                    now,
                ),
                None,
            )
            .await?;
        info!(tracked_order_id = %tracked.id, "Order tracking started");
        Ok(tracked)
    }

    pub async fn get_tracked_order(&self, id: TrackedOrderId) -> Result<TrackedOrder, OrderError> {
        ensure_id(id.is_nil(), "tracked order")?;
        Ok(self.port.get_tracked_order(id, None).await?)
    }

    pub async fn tracked_order_for_order(&self, order_id: OrderId) -> Result<Option<TrackedOrder>, OrderError> {
        ensure_id(order_id.is_nil(), "order")?;
        Ok(self.port.find_tracked_order_by_order(order_id, None).await?)
    }

    pub async fn update_estimated_delivery(
        &self,
        id: TrackedOrderId,
        date: NaiveDate,
    ) -> Result<TrackedOrder, OrderError> {
        let mut tracked = self.get_tracked_order(id).await?;
        tracked.estimated_delivery_date = date;
        Ok(self.port.save_tracked_order(tracked, None).await?)
    }

    pub async fn delete_tracked_order(&self, id: TrackedOrderId) -> Result<(), OrderError> {
        ensure_id(id.is_nil(), "tracked order")?;
        Ok(self.port.delete_tracked_order(id, None).await?)
    }

    pub async fn update_status_with_checkpoint(
        &self,
        id: TrackedOrderId,
        status: OrderStatus,
        location: Option<&str>,
        description: Option<&str>,
    ) -> Result<OrderCheckpoint, OrderError> {
        self.update_status_with_checkpoint_at(id, status, location, description, Utc::now())
            .await
    }

    /// Moves the order to `status` and records a checkpoint for it
    #[instrument(skip(self, location, description, now), fields(tracked_order_id = %id, status = %status))]
    pub async fn update_status_with_checkpoint_at(
        &self,
        id: TrackedOrderId,
        status: OrderStatus,
        location: Option<&str>,
        description: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<OrderCheckpoint, OrderError> {
        let mut tracked = self.get_tracked_order(id).await?;
        tracked.current_status = status;
        self.port.save_tracked_order(tracked, None).await?;

        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(DEFAULT_CHECKPOINT_DESCRIPTION);
        let location = location.map(str::trim).filter(|l| !l.is_empty()).map(String::from);
        let checkpoint = self
            .port
            .add_checkpoint(OrderCheckpoint::new(id, status, location, description, now), None)
            .await?;
        info!("Tracking status updated");
        Ok(checkpoint)
    }

    /// Drops the newest checkpoint and restores the status before it
    #[instrument(skip(self), fields(tracked_order_id = %id))]
    pub async fn revert_to_previous_checkpoint(&self, id: TrackedOrderId) -> Result<TrackedOrder, OrderError> {
        let mut tracked = self.get_tracked_order(id).await?;
        let checkpoints = self.checkpoints(id).await?;
        let [.., previous, newest] = checkpoints.as_slice() else {
            return Err(OrderError::CannotRevert);
        };

        self.port.delete_checkpoint(newest.id, None).await?;
        tracked.current_status = previous.status;
        let tracked = self.port.save_tracked_order(tracked, None).await?;
        info!(status = %tracked.current_status, "Tracking reverted to previous checkpoint");
        Ok(tracked)
    }

    /// Checkpoints oldest first
    pub async fn checkpoints(&self, id: TrackedOrderId) -> Result<Vec<OrderCheckpoint>, OrderError> {
        ensure_id(id.is_nil(), "tracked order")?;
        let mut checkpoints = self.port.checkpoints_of(id, None).await?;
        checkpoints.sort_by_key(|c| (c.timestamp, c.id));
        Ok(checkpoints)
    }

    pub async fn last_checkpoint(&self, id: TrackedOrderId) -> Result<Option<OrderCheckpoint>, OrderError> {
        Ok(self.checkpoints(id).await?.pop())
    }

    pub async fn checkpoint_count(&self, id: TrackedOrderId) -> Result<usize, OrderError> {
        Ok(self.checkpoints(id).await?.len())
    }

    pub async fn get_checkpoint(&self, id: CheckpointId) -> Result<OrderCheckpoint, OrderError> {
        ensure_id(id.is_nil(), "checkpoint")?;
        Ok(self.port.get_checkpoint(id, None).await?)
    }

    pub async fn add_checkpoint(&self, checkpoint: OrderCheckpoint) -> Result<OrderCheckpoint, OrderError> {
        ensure_id(checkpoint.tracked_order_id.is_nil(), "tracked order")?;
        Ok(self.port.add_checkpoint(checkpoint, None).await?)
    }

    pub async fn update_checkpoint(&self, checkpoint: OrderCheckpoint) -> Result<OrderCheckpoint, OrderError> {
        ensure_id(checkpoint.id.is_nil(), "checkpoint")?;
        Ok(self.port.update_checkpoint(checkpoint, None).await?)
    }

    pub async fn delete_checkpoint(&self, id: CheckpointId) -> Result<(), OrderError> {
        ensure_id(id.is_nil(), "checkpoint")?;
        Ok(self.port.delete_checkpoint(id, None).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing_and_progress() {
        assert_eq!("out for delivery".parse::<OrderStatus>().unwrap(), OrderStatus::OutForDelivery);
        assert_eq!("IN_WAREHOUSE".parse::<OrderStatus>().unwrap(), OrderStatus::InWarehouse);
        assert!("LOST".parse::<OrderStatus>().is_err());
        assert_eq!(OrderStatus::InTransit.progress_percentage(), 75);
        assert_eq!(OrderStatus::Delivered.to_string(), "DELIVERED");
    }
}
