//! PostgreSQL basket adapter
//!
//! A basket and its items are one document keyed by the buyer's id, so
//! saving the basket replaces every item at once.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{DomainPort, HealthCheckResult, HealthCheckable, OperationMetadata, PortError, UserId};
use domain_basket::{Basket, BasketPort};

use super::port_err;
use crate::documents::{Collection, DocumentStore};
use crate::pool::check_pool;

#[derive(Debug, Clone)]
pub struct PostgresBasketAdapter {
    documents: DocumentStore,
}

impl PostgresBasketAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            documents: DocumentStore::new(pool),
        }
    }
}

impl DomainPort for PostgresBasketAdapter {}

#[async_trait]
impl HealthCheckable for PostgresBasketAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        check_pool(self.documents.pool(), "postgres-basket-adapter").await
    }
}

#[async_trait]
impl BasketPort for PostgresBasketAdapter {
    #[instrument(skip(self, _metadata), fields(buyer_id = %buyer_id))]
    async fn find_basket(
        &self,
        buyer_id: UserId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Option<Basket>, PortError> {
        self.documents
            .get(Collection::Baskets, *buyer_id.as_uuid())
            .await
            .map_err(port_err)
    }

    #[instrument(skip(self, basket, _metadata), fields(buyer_id = %basket.buyer_id, items = basket.items.len()))]
    async fn save_basket(&self, basket: Basket, _metadata: Option<OperationMetadata>) -> Result<Basket, PortError> {
        let buyer = *basket.buyer_id.as_uuid();
        self.documents
            .put(Collection::Baskets, buyer, Some(buyer), &basket)
            .await
            .map_err(port_err)?;
        debug!("Basket saved");
        Ok(basket)
    }
}
