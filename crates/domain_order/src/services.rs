//! Order lookups and the buyer's order history

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use core_kernel::{ensure_id, OrderHistoryId, OrderId, OrderSummaryId, UserId};

use crate::error::OrderError;
use crate::history::{filter_orders, OrderHistory, OrderHistoryQuery, OrderPage};
use crate::order::Order;
use crate::ports::OrderPort;
use crate::summary::OrderSummary;

#[derive(Clone)]
pub struct OrderService {
    port: Arc<dyn OrderPort>,
}

impl OrderService {
    pub fn new(port: Arc<dyn OrderPort>) -> Self {
        Self { port }
    }

    pub async fn get_order(&self, id: OrderId) -> Result<Order, OrderError> {
        ensure_id(id.is_nil(), "order")?;
        Ok(self.port.get_order(id, None).await?)
    }

    pub async fn get_summary(&self, id: OrderSummaryId) -> Result<OrderSummary, OrderError> {
        ensure_id(id.is_nil(), "order summary")?;
        Ok(self.port.get_summary(id, None).await?)
    }

    pub async fn get_history(&self, id: OrderHistoryId) -> Result<OrderHistory, OrderError> {
        ensure_id(id.is_nil(), "order history")?;
        Ok(self.port.get_history(id, None).await?)
    }

    /// Summary of the checkout an order belongs to
    pub async fn summary_of(&self, order: &Order) -> Result<OrderSummary, OrderError> {
        self.get_summary(order.summary_id).await
    }

    pub async fn orders_in_history(&self, id: OrderHistoryId) -> Result<Vec<Order>, OrderError> {
        ensure_id(id.is_nil(), "order history")?;
        Ok(self.port.orders_in_history(id, None).await?)
    }

    pub async fn orders_of_seller(&self, seller_id: UserId) -> Result<Vec<Order>, OrderError> {
        ensure_id(seller_id.is_nil(), "seller")?;
        Ok(self.port.orders_of_seller(seller_id, None).await?)
    }

    pub async fn buyer_orders(&self, buyer_id: UserId, query: &OrderHistoryQuery) -> Result<OrderPage, OrderError> {
        self.buyer_orders_at(buyer_id, query, Utc::now()).await
    }

    /// A buyer's orders filtered by period and product name, newest first
    #[instrument(skip(self, query, now), fields(buyer_id = %buyer_id, period = ?query.period))]
    pub async fn buyer_orders_at(
        &self,
        buyer_id: UserId,
        query: &OrderHistoryQuery,
        now: DateTime<Utc>,
    ) -> Result<OrderPage, OrderError> {
        ensure_id(buyer_id.is_nil(), "buyer")?;
        let orders = self.port.orders_of_buyer(buyer_id, None).await?;
        let page = filter_orders(orders, query, now);
        debug!(total = page.total_count, returned = page.orders.len(), "Order history listed");
        Ok(page)
    }

    /// Number of orders matching the query, ignoring paging
    pub async fn buyer_order_count(&self, buyer_id: UserId, query: &OrderHistoryQuery) -> Result<usize, OrderError> {
        Ok(self.buyer_orders(buyer_id, query).await?.total_count)
    }

    pub async fn delete_order(&self, id: OrderId) -> Result<(), OrderError> {
        ensure_id(id.is_nil(), "order")?;
        Ok(self.port.delete_order(id, None).await?)
    }
}
