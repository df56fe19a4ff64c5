//! PostgreSQL order adapter
//!
//! ```sql
//! CREATE TABLE order_histories (
//!     id         UUID PRIMARY KEY,
//!     buyer_id   UUID        NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL
//! );
//!
//! CREATE TABLE order_summaries (
//!     id               UUID PRIMARY KEY,
//!     subtotal         NUMERIC NOT NULL,
//!     warranty_tax     NUMERIC NOT NULL,
//!     delivery_fee     NUMERIC NOT NULL,
//!     final_total      NUMERIC NOT NULL,
//!     currency         TEXT    NOT NULL,
//!     full_name        TEXT    NOT NULL,
//!     email            TEXT    NOT NULL,
//!     phone            TEXT    NOT NULL,
//!     address          TEXT    NOT NULL,
//!     postal_code      TEXT    NOT NULL,
//!     additional_info  TEXT,
//!     contract_details TEXT
//! );
//!
//! CREATE TABLE orders (
//!     id             UUID PRIMARY KEY,
//!     product_id     UUID        NOT NULL,
//!     product_title  TEXT        NOT NULL,
//!     buyer_id       UUID        NOT NULL,
//!     seller_id      UUID        NOT NULL,
//!     product_type   TEXT        NOT NULL,
//!     quantity       INT4        NOT NULL,
//!     payment_method TEXT        NOT NULL,
//!     summary_id     UUID        NOT NULL REFERENCES order_summaries (id),
//!     history_id     UUID        NOT NULL REFERENCES order_histories (id),
//!     order_date     TIMESTAMPTZ NOT NULL
//! );
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{
    DomainPort, HealthCheckResult, HealthCheckable, OperationMetadata, OrderHistoryId, OrderId, OrderSummaryId,
    PortError, ProductId, UserId,
};
use domain_basket::ProductType;
use domain_order::{ContactDetails, Order, OrderHistory, OrderPort, OrderSummary, PaymentMethod};

use super::{money, parse_label, port_err};
use crate::error::DatabaseError;
use crate::pool::check_pool;

const ORDER_COLUMNS: &str = "id, product_id, product_title, buyer_id, seller_id, product_type, quantity, \
                             payment_method, summary_id, history_id, order_date";

#[derive(Debug, FromRow)]
struct SummaryRow {
    id: Uuid,
    subtotal: Decimal,
    warranty_tax: Decimal,
    delivery_fee: Decimal,
    final_total: Decimal,
    currency: String,
    full_name: String,
    email: String,
    phone: String,
    address: String,
    postal_code: String,
    additional_info: Option<String>,
    contract_details: Option<String>,
}

impl SummaryRow {
    fn into_summary(self) -> Result<OrderSummary, DatabaseError> {
        Ok(OrderSummary {
            id: OrderSummaryId::from(self.id),
            subtotal: money(self.subtotal, &self.currency)?,
            warranty_tax: money(self.warranty_tax, &self.currency)?,
            delivery_fee: money(self.delivery_fee, &self.currency)?,
            final_total: money(self.final_total, &self.currency)?,
            contact: ContactDetails {
                full_name: self.full_name,
                email: self.email,
                phone: self.phone,
                address: self.address,
                postal_code: self.postal_code,
            },
            additional_info: self.additional_info,
            contract_details: self.contract_details,
        })
    }
}

#[derive(Debug, FromRow)]
struct OrderRow {
    id: Uuid,
    product_id: Uuid,
    product_title: String,
    buyer_id: Uuid,
    seller_id: Uuid,
    product_type: String,
    quantity: i32,
    payment_method: String,
    summary_id: Uuid,
    history_id: Uuid,
    order_date: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self) -> Result<Order, DatabaseError> {
        Ok(Order {
            id: OrderId::from(self.id),
            product_id: ProductId::from(self.product_id),
            product_title: self.product_title,
            buyer_id: UserId::from(self.buyer_id),
            seller_id: UserId::from(self.seller_id),
            product_type: parse_label::<ProductType>(&self.product_type)?,
            quantity: u32::try_from(self.quantity)
                .map_err(|_| DatabaseError::serialization(format!("negative quantity {}", self.quantity)))?,
            payment_method: parse_label::<PaymentMethod>(&self.payment_method)?,
            summary_id: OrderSummaryId::from(self.summary_id),
            history_id: OrderHistoryId::from(self.history_id),
            order_date: self.order_date,
        })
    }
}

fn into_orders(rows: Vec<OrderRow>) -> Result<Vec<Order>, PortError> {
    rows.into_iter()
        .map(|row| row.into_order().map_err(port_err))
        .collect()
}

/// PostgreSQL-backed [`OrderPort`]
#[derive(Debug, Clone)]
pub struct PostgresOrderAdapter {
    pool: PgPool,
}

impl PostgresOrderAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn orders_where(&self, column: &str, id: Uuid) -> Result<Vec<Order>, PortError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {} FROM orders WHERE {} = $1 ORDER BY order_date, id",
            ORDER_COLUMNS, column
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(port_err)?;
        into_orders(rows)
    }
}

impl DomainPort for PostgresOrderAdapter {}

#[async_trait]
impl HealthCheckable for PostgresOrderAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        check_pool(&self.pool, "postgres-order-adapter").await
    }
}

#[async_trait]
impl OrderPort for PostgresOrderAdapter {
    #[instrument(skip(self, history, _metadata), fields(history_id = %history.id))]
    async fn save_history(
        &self,
        history: OrderHistory,
        _metadata: Option<OperationMetadata>,
    ) -> Result<OrderHistory, PortError> {
        sqlx::query(
            "INSERT INTO order_histories (id, buyer_id, created_at) VALUES ($1, $2, $3) \
             ON CONFLICT (id) DO UPDATE SET buyer_id = EXCLUDED.buyer_id",
        )
        .bind(*history.id.as_uuid())
        .bind(*history.buyer_id.as_uuid())
        .bind(history.created_at)
        .execute(&self.pool)
        .await
        .map_err(port_err)?;
        Ok(history)
    }

    async fn get_history(
        &self,
        id: OrderHistoryId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<OrderHistory, PortError> {
        let row: Option<(Uuid, Uuid, DateTime<Utc>)> =
            sqlx::query_as("SELECT id, buyer_id, created_at FROM order_histories WHERE id = $1")
                .bind(*id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(port_err)?;
        let (id, buyer_id, created_at) = row.ok_or_else(|| PortError::not_found("OrderHistory", id))?;
        Ok(OrderHistory {
            id: OrderHistoryId::from(id),
            buyer_id: UserId::from(buyer_id),
            created_at,
        })
    }

    #[instrument(skip(self, summary, _metadata), fields(summary_id = %summary.id, total = %summary.final_total))]
    async fn save_summary(
        &self,
        summary: OrderSummary,
        _metadata: Option<OperationMetadata>,
    ) -> Result<OrderSummary, PortError> {
        let contact = &summary.contact;
        sqlx::query(
            r#"
            INSERT INTO order_summaries (
                id, subtotal, warranty_tax, delivery_fee, final_total, currency,
                full_name, email, phone, address, postal_code, additional_info, contract_details
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (id) DO UPDATE SET
                subtotal = EXCLUDED.subtotal, warranty_tax = EXCLUDED.warranty_tax,
                delivery_fee = EXCLUDED.delivery_fee, final_total = EXCLUDED.final_total,
                currency = EXCLUDED.currency, full_name = EXCLUDED.full_name, email = EXCLUDED.email,
                phone = EXCLUDED.phone, address = EXCLUDED.address, postal_code = EXCLUDED.postal_code,
                additional_info = EXCLUDED.additional_info, contract_details = EXCLUDED.contract_details
            "#,
        )
        .bind(*summary.id.as_uuid())
        .bind(summary.subtotal.amount())
        .bind(summary.warranty_tax.amount())
        .bind(summary.delivery_fee.amount())
        .bind(summary.final_total.amount())
        .bind(summary.final_total.currency().code())
        .bind(&contact.full_name)
        .bind(&contact.email)
        .bind(&contact.phone)
        .bind(&contact.address)
        .bind(&contact.postal_code)
        .bind(&summary.additional_info)
        .bind(&summary.contract_details)
        .execute(&self.pool)
        .await
        .map_err(port_err)?;
        Ok(summary)
    }

    async fn get_summary(
        &self,
        id: OrderSummaryId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<OrderSummary, PortError> {
        let row: Option<SummaryRow> = sqlx::query_as(
            "SELECT id, subtotal, warranty_tax, delivery_fee, final_total, currency, full_name, email, phone, \
             address, postal_code, additional_info, contract_details FROM order_summaries WHERE id = $1",
        )
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(port_err)?;
        row.ok_or_else(|| PortError::not_found("OrderSummary", id))?
            .into_summary()
            .map_err(port_err)
    }

    /// An unknown summary surfaces as a foreign key conflict
    #[instrument(skip(self, order, _metadata), fields(order_id = %order.id, product_id = %order.product_id))]
    async fn save_order(&self, order: Order, _metadata: Option<OperationMetadata>) -> Result<Order, PortError> {
        sqlx::query(&format!(
            "INSERT INTO orders ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             ON CONFLICT (id) DO UPDATE SET product_title = EXCLUDED.product_title, \
             quantity = EXCLUDED.quantity, payment_method = EXCLUDED.payment_method",
            ORDER_COLUMNS
        ))
        .bind(*order.id.as_uuid())
        .bind(*order.product_id.as_uuid())
        .bind(&order.product_title)
        .bind(*order.buyer_id.as_uuid())
        .bind(*order.seller_id.as_uuid())
        .bind(order.product_type.as_str())
        .bind(i32::try_from(order.quantity).unwrap_or(i32::MAX))
        .bind(order.payment_method.as_str())
        .bind(*order.summary_id.as_uuid())
        .bind(*order.history_id.as_uuid())
        .bind(order.order_date)
        .execute(&self.pool)
        .await
        .map_err(port_err)?;
        debug!("Order stored");
        Ok(order)
    }

    async fn get_order(&self, id: OrderId, _metadata: Option<OperationMetadata>) -> Result<Order, PortError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS))
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(port_err)?;
        row.ok_or_else(|| PortError::not_found("Order", id))?
            .into_order()
            .map_err(port_err)
    }

    #[instrument(skip(self, _metadata), fields(order_id = %id))]
    async fn delete_order(&self, id: OrderId, _metadata: Option<OperationMetadata>) -> Result<(), PortError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(port_err)?;
        if result.rows_affected() == 0 {
            return Err(PortError::not_found("Order", id));
        }
        Ok(())
    }

    async fn orders_of_buyer(
        &self,
        buyer_id: UserId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Order>, PortError> {
        self.orders_where("buyer_id", *buyer_id.as_uuid()).await
    }

    async fn orders_in_history(
        &self,
        history_id: OrderHistoryId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Order>, PortError> {
        self.orders_where("history_id", *history_id.as_uuid()).await
    }

    async fn orders_of_seller(
        &self,
        seller_id: UserId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Order>, PortError> {
        self.orders_where("seller_id", *seller_id.as_uuid()).await
    }
}
