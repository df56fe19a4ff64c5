//! PostgreSQL catalog adapter
//!
//! Listings, taxonomy entries and waitlist entries are documents. Bids are
//! also appended to their own table so bid history survives a listing being
//! rewritten:
//!
//! ```sql
//! CREATE TABLE bids (
//!     id         UUID PRIMARY KEY,
//!     product_id UUID        NOT NULL,
//!     bidder_id  UUID        NOT NULL,
//!     price      NUMERIC     NOT NULL,
//!     currency   TEXT        NOT NULL,
//!     placed_at  TIMESTAMPTZ NOT NULL
//! );
//! ```

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{
    CategoryId, ConditionId, DomainPort, HealthCheckResult, HealthCheckable, OperationMetadata, PortError, ProductId,
    TagId, UserId,
};
use domain_catalog::{
    AuctionProduct, Bid, BorrowProduct, BuyProduct, CatalogPort, Category, Condition, Listed, Tag, WaitlistEntry,
};

use super::port_err;
use crate::documents::{Collection, DocumentStore};
use crate::pool::check_pool;

/// PostgreSQL-backed [`CatalogPort`]
#[derive(Debug, Clone)]
pub struct PostgresCatalogAdapter {
    pool: PgPool,
    documents: DocumentStore,
}

impl PostgresCatalogAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            documents: DocumentStore::new(pool.clone()),
            pool,
        }
    }

    async fn get_listing<T: DeserializeOwned>(
        &self,
        collection: Collection,
        entity: &'static str,
        id: ProductId,
    ) -> Result<T, PortError> {
        self.documents
            .require(collection, entity, *id.as_uuid())
            .await
            .map_err(port_err)
    }

    /// Listings ordered by id, which is creation order for v7 ids
    async fn list_listings<T: DeserializeOwned + Listed>(&self, collection: Collection) -> Result<Vec<T>, PortError> {
        let mut listings: Vec<T> = self.documents.list(collection).await.map_err(port_err)?;
        listings.sort_by_key(|l| l.core().id);
        Ok(listings)
    }

    async fn save_listing<T: Serialize + Listed>(&self, collection: Collection, listing: &T) -> Result<(), PortError> {
        let core = listing.core();
        self.documents
            .put(collection, *core.id.as_uuid(), Some(*core.seller_id.as_uuid()), listing)
            .await
            .map_err(port_err)
    }

    async fn delete_document(&self, collection: Collection, entity: &'static str, id: Uuid) -> Result<(), PortError> {
        self.documents
            .delete_existing(collection, entity, id)
            .await
            .map_err(port_err)
    }
}

fn assign_id(id: &mut ProductId) {
    if id.is_nil() {
        *id = ProductId::new_v7();
    }
}

impl DomainPort for PostgresCatalogAdapter {}

#[async_trait]
impl HealthCheckable for PostgresCatalogAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        check_pool(&self.pool, "postgres-catalog-adapter").await
    }
}

#[async_trait]
impl CatalogPort for PostgresCatalogAdapter {
    #[instrument(skip(self, _metadata), fields(product_id = %id))]
    async fn get_buy_product(&self, id: ProductId, _metadata: Option<OperationMetadata>) -> Result<BuyProduct, PortError> {
        self.get_listing(Collection::BuyProducts, "BuyProduct", id).await
    }

    async fn list_buy_products(&self, _metadata: Option<OperationMetadata>) -> Result<Vec<BuyProduct>, PortError> {
        self.list_listings(Collection::BuyProducts).await
    }

    #[instrument(skip(self, product, _metadata))]
    async fn save_buy_product(&self, mut product: BuyProduct, _metadata: Option<OperationMetadata>) -> Result<BuyProduct, PortError> {
        assign_id(&mut product.core.id);
        self.save_listing(Collection::BuyProducts, &product).await?;
        debug!(product_id = %product.core.id, "Buy listing saved");
        Ok(product)
    }

    async fn delete_buy_product(&self, id: ProductId, _metadata: Option<OperationMetadata>) -> Result<(), PortError> {
        self.delete_document(Collection::BuyProducts, "BuyProduct", *id.as_uuid()).await
    }

    #[instrument(skip(self, _metadata), fields(product_id = %id))]
    async fn get_borrow_product(&self, id: ProductId, _metadata: Option<OperationMetadata>) -> Result<BorrowProduct, PortError> {
        self.get_listing(Collection::BorrowProducts, "BorrowProduct", id).await
    }

    async fn list_borrow_products(&self, _metadata: Option<OperationMetadata>) -> Result<Vec<BorrowProduct>, PortError> {
        self.list_listings(Collection::BorrowProducts).await
    }

    #[instrument(skip(self, product, _metadata))]
    async fn save_borrow_product(
        &self,
        mut product: BorrowProduct,
        _metadata: Option<OperationMetadata>,
    ) -> Result<BorrowProduct, PortError> {
        assign_id(&mut product.core.id);
        self.save_listing(Collection::BorrowProducts, &product).await?;
        debug!(product_id = %product.core.id, "Borrow listing saved");
        Ok(product)
    }

    async fn delete_borrow_product(&self, id: ProductId, _metadata: Option<OperationMetadata>) -> Result<(), PortError> {
        self.delete_document(Collection::BorrowProducts, "BorrowProduct", *id.as_uuid()).await
    }

    #[instrument(skip(self, _metadata), fields(product_id = %id))]
    async fn get_auction(&self, id: ProductId, _metadata: Option<OperationMetadata>) -> Result<AuctionProduct, PortError> {
        self.get_listing(Collection::Auctions, "AuctionProduct", id).await
    }

    async fn list_auctions(&self, _metadata: Option<OperationMetadata>) -> Result<Vec<AuctionProduct>, PortError> {
        self.list_listings(Collection::Auctions).await
    }

    #[instrument(skip(self, auction, _metadata))]
    async fn save_auction(
        &self,
        mut auction: AuctionProduct,
        _metadata: Option<OperationMetadata>,
    ) -> Result<AuctionProduct, PortError> {
        assign_id(&mut auction.core.id);
        self.save_listing(Collection::Auctions, &auction).await?;
        Ok(auction)
    }

    /// Bid row and auction document are written in one transaction
    #[instrument(skip(self, auction, bid, _metadata), fields(product_id = %auction.core.id, price = %bid.price))]
    async fn record_bid(
        &self,
        auction: &AuctionProduct,
        bid: &Bid,
        _metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError> {
        let product_id = *auction.core.id.as_uuid();
        let mut tx = self.pool.begin().await.map_err(port_err)?;

        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM documents WHERE collection = $1 AND id = $2 FOR UPDATE")
                .bind(Collection::Auctions.as_str())
                .bind(product_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(port_err)?;
        if locked.is_none() {
            return Err(PortError::not_found("AuctionProduct", auction.core.id));
        }

        sqlx::query(
            "INSERT INTO bids (id, product_id, bidder_id, price, currency, placed_at) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(*bid.id.as_uuid())
        .bind(product_id)
        .bind(*bid.bidder_id.as_uuid())
        .bind(bid.price.amount())
        .bind(bid.price.currency().code())
        .bind(bid.timestamp)
        .execute(&mut *tx)
        .await
        .map_err(port_err)?;

        DocumentStore::put_in(
            &mut tx,
            Collection::Auctions,
            product_id,
            Some(*auction.core.seller_id.as_uuid()),
            auction,
        )
        .await
        .map_err(port_err)?;

        tx.commit().await.map_err(port_err)?;
        debug!("Bid recorded");
        Ok(())
    }

    async fn delete_auction(&self, id: ProductId, _metadata: Option<OperationMetadata>) -> Result<(), PortError> {
        self.delete_document(Collection::Auctions, "AuctionProduct", *id.as_uuid()).await
    }

    async fn list_categories(&self, _metadata: Option<OperationMetadata>) -> Result<Vec<Category>, PortError> {
        self.documents.list(Collection::Categories).await.map_err(port_err)
    }

    async fn save_category(&self, category: Category, _metadata: Option<OperationMetadata>) -> Result<Category, PortError> {
        self.documents
            .put(Collection::Categories, *category.id.as_uuid(), None, &category)
            .await
            .map_err(port_err)?;
        Ok(category)
    }

    async fn delete_category(&self, id: CategoryId, _metadata: Option<OperationMetadata>) -> Result<(), PortError> {
        self.delete_document(Collection::Categories, "Category", *id.as_uuid()).await
    }

    async fn list_conditions(&self, _metadata: Option<OperationMetadata>) -> Result<Vec<Condition>, PortError> {
        self.documents.list(Collection::Conditions).await.map_err(port_err)
    }

    async fn save_condition(&self, condition: Condition, _metadata: Option<OperationMetadata>) -> Result<Condition, PortError> {
        self.documents
            .put(Collection::Conditions, *condition.id.as_uuid(), None, &condition)
            .await
            .map_err(port_err)?;
        Ok(condition)
    }

    async fn delete_condition(&self, id: ConditionId, _metadata: Option<OperationMetadata>) -> Result<(), PortError> {
        self.delete_document(Collection::Conditions, "Condition", *id.as_uuid()).await
    }

    async fn list_tags(&self, _metadata: Option<OperationMetadata>) -> Result<Vec<Tag>, PortError> {
        self.documents.list(Collection::Tags).await.map_err(port_err)
    }

    async fn find_tag(&self, title: &str, _metadata: Option<OperationMetadata>) -> Result<Option<Tag>, PortError> {
        let tags: Vec<Tag> = self
            .documents
            .find_by_field(Collection::Tags, "title", title)
            .await
            .map_err(port_err)?;
        Ok(tags.into_iter().next())
    }

    async fn save_tag(&self, tag: Tag, _metadata: Option<OperationMetadata>) -> Result<Tag, PortError> {
        self.documents
            .put(Collection::Tags, *tag.id.as_uuid(), None, &tag)
            .await
            .map_err(port_err)?;
        Ok(tag)
    }

    async fn delete_tag(&self, id: TagId, _metadata: Option<OperationMetadata>) -> Result<(), PortError> {
        self.delete_document(Collection::Tags, "Tag", *id.as_uuid()).await
    }

    #[instrument(skip(self, entry, metadata), fields(product_id = %entry.product_id, user_id = %entry.user_id))]
    async fn add_waitlist_entry(
        &self,
        entry: WaitlistEntry,
        metadata: Option<OperationMetadata>,
    ) -> Result<WaitlistEntry, PortError> {
        let existing = self.waitlists_of_user(entry.user_id, metadata).await?;
        if existing.iter().any(|e| e.product_id == entry.product_id) {
            return Err(PortError::conflict("User is already in the waitlist for this product"));
        }
        self.documents
            .put(Collection::Waitlist, *entry.id.as_uuid(), Some(*entry.user_id.as_uuid()), &entry)
            .await
            .map_err(port_err)?;
        Ok(entry)
    }

    async fn remove_waitlist_entry(
        &self,
        user_id: UserId,
        product_id: ProductId,
        metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError> {
        for entry in self.waitlists_of_user(user_id, metadata).await? {
            if entry.product_id == product_id {
                self.documents
                    .delete(Collection::Waitlist, *entry.id.as_uuid())
                    .await
                    .map_err(port_err)?;
            }
        }
        Ok(())
    }

    async fn waitlist_for_product(
        &self,
        product_id: ProductId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<WaitlistEntry>, PortError> {
        let mut entries: Vec<WaitlistEntry> = self
            .documents
            .find_by_field(Collection::Waitlist, "product_id", &product_id.as_uuid().to_string())
            .await
            .map_err(port_err)?;
        entries.sort_by(|a, b| a.joined_at.cmp(&b.joined_at).then(a.id.cmp(&b.id)));
        Ok(entries)
    }

    async fn waitlists_of_user(&self, user_id: UserId, _metadata: Option<OperationMetadata>) -> Result<Vec<WaitlistEntry>, PortError> {
        self.documents
            .list_by_owner(Collection::Waitlist, *user_id.as_uuid())
            .await
            .map_err(port_err)
    }
}
