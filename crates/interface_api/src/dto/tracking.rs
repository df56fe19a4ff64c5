//! Tracking DTOs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domain_order::{OrderCheckpoint, TrackedOrder};

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckpointResponse {
    pub id: Uuid,
    pub status: String,
    pub description: String,
    pub location: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl From<&OrderCheckpoint> for CheckpointResponse {
    fn from(checkpoint: &OrderCheckpoint) -> Self {
        Self {
            id: *checkpoint.id.as_uuid(),
            status: checkpoint.status.as_str().to_string(),
            description: checkpoint.description.clone(),
            location: checkpoint.location.clone(),
            timestamp: checkpoint.timestamp,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TrackingResponse {
    pub tracked_order_id: Uuid,
    pub order_id: Uuid,
    pub status: String,
    /// Share of the delivery completed, 0 to 100
    pub progress: u8,
    pub estimated_delivery_date: NaiveDate,
    pub delivery_address: String,
    pub checkpoints: Vec<CheckpointResponse>,
}

impl TrackingResponse {
    pub fn new(tracked: &TrackedOrder, checkpoints: &[OrderCheckpoint]) -> Self {
        Self {
            tracked_order_id: *tracked.id.as_uuid(),
            order_id: *tracked.order_id.as_uuid(),
            status: tracked.current_status.as_str().to_string(),
            progress: tracked.current_status.progress_percentage(),
            estimated_delivery_date: tracked.estimated_delivery_date,
            delivery_address: tracked.delivery_address.clone(),
            checkpoints: checkpoints.iter().map(CheckpointResponse::from).collect(),
        }
    }
}
