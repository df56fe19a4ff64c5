//! Order Domain Ports
//!
//! Two ports: [`OrderPort`] for orders, summaries and histories written at
//! checkout, and [`TrackingPort`] for delivery tracking, which is usually
//! updated by a different process than the one placing orders.

use async_trait::async_trait;

use core_kernel::{
    CheckpointId, DomainPort, HealthCheckable, OperationMetadata, OrderHistoryId, OrderId, OrderSummaryId,
    PortError, TrackedOrderId, UserId,
};

use crate::history::OrderHistory;
use crate::order::Order;
use crate::summary::OrderSummary;
use crate::tracking::{OrderCheckpoint, TrackedOrder};

#[async_trait]
pub trait OrderPort: DomainPort + HealthCheckable {
    async fn save_history(
        &self,
        history: OrderHistory,
        metadata: Option<OperationMetadata>,
    ) -> Result<OrderHistory, PortError>;

    async fn get_history(
        &self,
        id: OrderHistoryId,
        metadata: Option<OperationMetadata>,
    ) -> Result<OrderHistory, PortError>;

    async fn save_summary(
        &self,
        summary: OrderSummary,
        metadata: Option<OperationMetadata>,
    ) -> Result<OrderSummary, PortError>;

    async fn get_summary(
        &self,
        id: OrderSummaryId,
        metadata: Option<OperationMetadata>,
    ) -> Result<OrderSummary, PortError>;

    async fn save_order(&self, order: Order, metadata: Option<OperationMetadata>) -> Result<Order, PortError>;

    async fn get_order(&self, id: OrderId, metadata: Option<OperationMetadata>) -> Result<Order, PortError>;

    async fn delete_order(&self, id: OrderId, metadata: Option<OperationMetadata>) -> Result<(), PortError>;

    /// Every order placed by a buyer, in no particular order
    async fn orders_of_buyer(
        &self,
        buyer_id: UserId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Order>, PortError>;

    async fn orders_in_history(
        &self,
        history_id: OrderHistoryId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Order>, PortError>;

    /// Every order sold by a seller
    async fn orders_of_seller(
        &self,
        seller_id: UserId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Order>, PortError>;
}

#[async_trait]
pub trait TrackingPort: DomainPort + HealthCheckable {
    /// Inserts or replaces a tracked order
    async fn save_tracked_order(
        &self,
        tracked: TrackedOrder,
        metadata: Option<OperationMetadata>,
    ) -> Result<TrackedOrder, PortError>;

    async fn get_tracked_order(
        &self,
        id: TrackedOrderId,
        metadata: Option<OperationMetadata>,
    ) -> Result<TrackedOrder, PortError>;

    async fn find_tracked_order_by_order(
        &self,
        order_id: OrderId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Option<TrackedOrder>, PortError>;

    /// Deletes a tracked order along with its checkpoints
    async fn delete_tracked_order(
        &self,
        id: TrackedOrderId,
        metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError>;

    async fn add_checkpoint(
        &self,
        checkpoint: OrderCheckpoint,
        metadata: Option<OperationMetadata>,
    ) -> Result<OrderCheckpoint, PortError>;

    async fn update_checkpoint(
        &self,
        checkpoint: OrderCheckpoint,
        metadata: Option<OperationMetadata>,
    ) -> Result<OrderCheckpoint, PortError>;

    async fn get_checkpoint(
        &self,
        id: CheckpointId,
        metadata: Option<OperationMetadata>,
    ) -> Result<OrderCheckpoint, PortError>;

    async fn delete_checkpoint(&self, id: CheckpointId, metadata: Option<OperationMetadata>) -> Result<(), PortError>;

    async fn checkpoints_of(
        &self,
        tracked_order_id: TrackedOrderId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<OrderCheckpoint>, PortError>;
}

#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use core_kernel::HealthCheckResult;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    #[derive(Debug, Default, Clone)]
    pub struct MockOrderPort {
        histories: Arc<RwLock<HashMap<OrderHistoryId, OrderHistory>>>,
        summaries: Arc<RwLock<HashMap<OrderSummaryId, OrderSummary>>>,
        orders: Arc<RwLock<HashMap<OrderId, Order>>>,
        /// When set, `save_order` fails with this message
        reject_orders: Arc<RwLock<Option<String>>>,
    }

    impl MockOrderPort {
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes every following `save_order` call fail
        pub async fn reject_orders_with(&self, message: impl Into<String>) {
            *self.reject_orders.write().await = Some(message.into());
        }
    }

    impl DomainPort for MockOrderPort {}

    #[async_trait]
    impl HealthCheckable for MockOrderPort {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("mock-order-port")
        }
    }

    #[async_trait]
    impl OrderPort for MockOrderPort {
        async fn save_history(
            &self,
            history: OrderHistory,
            _metadata: Option<OperationMetadata>,
        ) -> Result<OrderHistory, PortError> {
            self.histories.write().await.insert(history.id, history.clone());
            Ok(history)
        }

        async fn get_history(
            &self,
            id: OrderHistoryId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<OrderHistory, PortError> {
            self.histories
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("OrderHistory", id))
        }

        async fn save_summary(
            &self,
            summary: OrderSummary,
            _metadata: Option<OperationMetadata>,
        ) -> Result<OrderSummary, PortError> {
            self.summaries.write().await.insert(summary.id, summary.clone());
            Ok(summary)
        }

        async fn get_summary(
            &self,
            id: OrderSummaryId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<OrderSummary, PortError> {
            self.summaries
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("OrderSummary", id))
        }

        async fn save_order(&self, order: Order, _metadata: Option<OperationMetadata>) -> Result<Order, PortError> {
            if let Some(message) = self.reject_orders.read().await.clone() {
                return Err(PortError::internal(message));
            }
            if !self.summaries.read().await.contains_key(&order.summary_id) {
                return Err(PortError::validation("Order references an unknown summary"));
            }
            self.orders.write().await.insert(order.id, order.clone());
            Ok(order)
        }

        async fn get_order(&self, id: OrderId, _metadata: Option<OperationMetadata>) -> Result<Order, PortError> {
            self.orders
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Order", id))
        }

        async fn delete_order(&self, id: OrderId, _metadata: Option<OperationMetadata>) -> Result<(), PortError> {
            self.orders
                .write()
                .await
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| PortError::not_found("Order", id))
        }

        async fn orders_of_buyer(
            &self,
            buyer_id: UserId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<Order>, PortError> {
            Ok(self
                .orders
                .read()
                .await
                .values()
                .filter(|o| o.buyer_id == buyer_id)
                .cloned()
                .collect())
        }

        async fn orders_in_history(
            &self,
            history_id: OrderHistoryId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<Order>, PortError> {
            Ok(self
                .orders
                .read()
                .await
                .values()
                .filter(|o| o.history_id == history_id)
                .cloned()
                .collect())
        }

        async fn orders_of_seller(
            &self,
            seller_id: UserId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<Order>, PortError> {
            Ok(self
                .orders
                .read()
                .await
                .values()
                .filter(|o| o.seller_id == seller_id)
                .cloned()
                .collect())
        }
    }

    #[derive(Debug, Default, Clone)]
    pub struct MockTrackingPort {
        tracked: Arc<RwLock<HashMap<TrackedOrderId, TrackedOrder>>>,
        checkpoints: Arc<RwLock<HashMap<CheckpointId, OrderCheckpoint>>>,
    }

    impl MockTrackingPort {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl DomainPort for MockTrackingPort {}

    #[async_trait]
    impl HealthCheckable for MockTrackingPort {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("mock-tracking-port")
        }
    }

    #[async_trait]
    impl TrackingPort for MockTrackingPort {
        async fn save_tracked_order(
            &self,
            tracked: TrackedOrder,
            _metadata: Option<OperationMetadata>,
        ) -> Result<TrackedOrder, PortError> {
            self.tracked.write().await.insert(tracked.id, tracked.clone());
            Ok(tracked)
        }

        async fn get_tracked_order(
            &self,
            id: TrackedOrderId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<TrackedOrder, PortError> {
            self.tracked
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("TrackedOrder", id))
        }

        async fn find_tracked_order_by_order(
            &self,
            order_id: OrderId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Option<TrackedOrder>, PortError> {
            Ok(self
                .tracked
                .read()
                .await
                .values()
                .find(|t| t.order_id == order_id)
                .cloned())
        }

        async fn delete_tracked_order(
            &self,
            id: TrackedOrderId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<(), PortError> {
            if self.tracked.write().await.remove(&id).is_none() {
                return Err(PortError::not_found("TrackedOrder", id));
            }
            self.checkpoints.write().await.retain(|_, c| c.tracked_order_id != id);
            Ok(())
        }

        async fn add_checkpoint(
            &self,
            checkpoint: OrderCheckpoint,
            _metadata: Option<OperationMetadata>,
        ) -> Result<OrderCheckpoint, PortError> {
            if !self.tracked.read().await.contains_key(&checkpoint.tracked_order_id) {
                return Err(PortError::not_found("TrackedOrder", checkpoint.tracked_order_id));
            }
            self.checkpoints.write().await.insert(checkpoint.id, checkpoint.clone());
            Ok(checkpoint)
        }

        async fn update_checkpoint(
            &self,
            checkpoint: OrderCheckpoint,
            _metadata: Option<OperationMetadata>,
        ) -> Result<OrderCheckpoint, PortError> {
            let mut checkpoints = self.checkpoints.write().await;
            match checkpoints.get_mut(&checkpoint.id) {
                Some(stored) => {
                    *stored = checkpoint.clone();
                    Ok(checkpoint)
                }
                None => Err(PortError::not_found("OrderCheckpoint", checkpoint.id)),
            }
        }

        async fn get_checkpoint(
            &self,
            id: CheckpointId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<OrderCheckpoint, PortError> {
            self.checkpoints
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("OrderCheckpoint", id))
        }

        async fn delete_checkpoint(&self, id: CheckpointId, _metadata: Option<OperationMetadata>) -> Result<(), PortError> {
            self.checkpoints
                .write()
                .await
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| PortError::not_found("OrderCheckpoint", id))
        }

        async fn checkpoints_of(
            &self,
            tracked_order_id: TrackedOrderId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<OrderCheckpoint>, PortError> {
            Ok(self
                .checkpoints
                .read()
                .await
                .values()
                .filter(|c| c.tracked_order_id == tracked_order_id)
                .cloned()
                .collect())
        }
    }
}
