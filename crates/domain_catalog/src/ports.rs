//! Catalog Domain Ports
//!
//! `CatalogPort` covers the three listing tables, the taxonomy (categories,
//! conditions, tags) and borrow waitlists.

use async_trait::async_trait;

use core_kernel::{
    CategoryId, ConditionId, DomainPort, HealthCheckable, OperationMetadata, PortError, ProductId,
    TagId, UserId,
};

use crate::auction::{AuctionProduct, Bid};
use crate::borrow::BorrowProduct;
use crate::buy::BuyProduct;
use crate::product::{Category, Condition, Tag};
use crate::waitlist::WaitlistEntry;

#[async_trait]
pub trait CatalogPort: DomainPort + HealthCheckable {
    async fn get_buy_product(&self, id: ProductId, metadata: Option<OperationMetadata>) -> Result<BuyProduct, PortError>;

    async fn list_buy_products(&self, metadata: Option<OperationMetadata>) -> Result<Vec<BuyProduct>, PortError>;

    /// Inserts or replaces a listing; a nil id is replaced by a fresh one
    async fn save_buy_product(&self, product: BuyProduct, metadata: Option<OperationMetadata>) -> Result<BuyProduct, PortError>;

    async fn delete_buy_product(&self, id: ProductId, metadata: Option<OperationMetadata>) -> Result<(), PortError>;

    async fn get_borrow_product(&self, id: ProductId, metadata: Option<OperationMetadata>) -> Result<BorrowProduct, PortError>;

    async fn list_borrow_products(&self, metadata: Option<OperationMetadata>) -> Result<Vec<BorrowProduct>, PortError>;

    async fn save_borrow_product(
        &self,
        product: BorrowProduct,
        metadata: Option<OperationMetadata>,
    ) -> Result<BorrowProduct, PortError>;

    async fn delete_borrow_product(&self, id: ProductId, metadata: Option<OperationMetadata>) -> Result<(), PortError>;

    async fn get_auction(&self, id: ProductId, metadata: Option<OperationMetadata>) -> Result<AuctionProduct, PortError>;

    async fn list_auctions(&self, metadata: Option<OperationMetadata>) -> Result<Vec<AuctionProduct>, PortError>;

    async fn save_auction(
        &self,
        auction: AuctionProduct,
        metadata: Option<OperationMetadata>,
    ) -> Result<AuctionProduct, PortError>;

    /// Stores a new bid together with the auction's updated price and end time
    async fn record_bid(
        &self,
        auction: &AuctionProduct,
        bid: &Bid,
        metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError>;

    async fn delete_auction(&self, id: ProductId, metadata: Option<OperationMetadata>) -> Result<(), PortError>;

    async fn list_categories(&self, metadata: Option<OperationMetadata>) -> Result<Vec<Category>, PortError>;

    async fn save_category(&self, category: Category, metadata: Option<OperationMetadata>) -> Result<Category, PortError>;

    async fn delete_category(&self, id: CategoryId, metadata: Option<OperationMetadata>) -> Result<(), PortError>;

    async fn list_conditions(&self, metadata: Option<OperationMetadata>) -> Result<Vec<Condition>, PortError>;

    async fn save_condition(&self, condition: Condition, metadata: Option<OperationMetadata>) -> Result<Condition, PortError>;

    async fn delete_condition(&self, id: ConditionId, metadata: Option<OperationMetadata>) -> Result<(), PortError>;

    async fn list_tags(&self, metadata: Option<OperationMetadata>) -> Result<Vec<Tag>, PortError>;

    /// Finds a tag by exact title
    async fn find_tag(&self, title: &str, metadata: Option<OperationMetadata>) -> Result<Option<Tag>, PortError>;

    async fn save_tag(&self, tag: Tag, metadata: Option<OperationMetadata>) -> Result<Tag, PortError>;

    async fn delete_tag(&self, id: TagId, metadata: Option<OperationMetadata>) -> Result<(), PortError>;

    async fn add_waitlist_entry(
        &self,
        entry: WaitlistEntry,
        metadata: Option<OperationMetadata>,
    ) -> Result<WaitlistEntry, PortError>;

    async fn remove_waitlist_entry(
        &self,
        user_id: UserId,
        product_id: ProductId,
        metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError>;

    /// Entries for a product, oldest first
    async fn waitlist_for_product(
        &self,
        product_id: ProductId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<WaitlistEntry>, PortError>;

    async fn waitlists_of_user(&self, user_id: UserId, metadata: Option<OperationMetadata>) -> Result<Vec<WaitlistEntry>, PortError>;
}

#[async_trait]
pub trait CatalogPortExt: CatalogPort {
    /// Looks a tag up by title, creating it when missing
    async fn get_or_create_tag(&self, title: &str, metadata: Option<OperationMetadata>) -> Result<Tag, PortError> {
        match self.find_tag(title, metadata.clone()).await? {
            Some(tag) => Ok(tag),
            None => self.save_tag(Tag::new(title), metadata).await,
        }
    }
}

impl<T: CatalogPort + ?Sized> CatalogPortExt for T {}

#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use core_kernel::HealthCheckResult;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// In-memory mock implementation of CatalogPort
    #[derive(Debug, Default, Clone)]
    pub struct MockCatalogPort {
        buy: Arc<RwLock<HashMap<ProductId, BuyProduct>>>,
        borrow: Arc<RwLock<HashMap<ProductId, BorrowProduct>>>,
        auctions: Arc<RwLock<HashMap<ProductId, AuctionProduct>>>,
        categories: Arc<RwLock<Vec<Category>>>,
        conditions: Arc<RwLock<Vec<Condition>>>,
        tags: Arc<RwLock<Vec<Tag>>>,
        waitlist: Arc<RwLock<Vec<WaitlistEntry>>>,
        /// When set, `record_bid` fails with this message
        reject_bids: Arc<RwLock<Option<String>>>,
    }

    impl MockCatalogPort {
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes every following `record_bid` call fail
        pub async fn reject_bids_with(&self, message: impl Into<String>) {
            *self.reject_bids.write().await = Some(message.into());
        }
    }

    fn assign_id(id: &mut ProductId) {
        if id.is_nil() {
            *id = ProductId::new_v7();
        }
    }

    fn sorted<T: Clone>(map: &HashMap<ProductId, T>) -> Vec<T> {
        let mut entries: Vec<_> = map.iter().collect();
        entries.sort_by_key(|(id, _)| **id);
        entries.into_iter().map(|(_, v)| v.clone()).collect()
    }

    impl DomainPort for MockCatalogPort {}

    #[async_trait]
    impl HealthCheckable for MockCatalogPort {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("mock-catalog-port")
        }
    }

    #[async_trait]
    impl CatalogPort for MockCatalogPort {
        async fn get_buy_product(&self, id: ProductId, _metadata: Option<OperationMetadata>) -> Result<BuyProduct, PortError> {
            self.buy.read().await.get(&id).cloned().ok_or_else(|| PortError::not_found("BuyProduct", id))
        }

        async fn list_buy_products(&self, _metadata: Option<OperationMetadata>) -> Result<Vec<BuyProduct>, PortError> {
            Ok(sorted(&*self.buy.read().await))
        }

        async fn save_buy_product(&self, mut product: BuyProduct, _metadata: Option<OperationMetadata>) -> Result<BuyProduct, PortError> {
            assign_id(&mut product.core.id);
            self.buy.write().await.insert(product.core.id, product.clone());
            Ok(product)
        }

        async fn delete_buy_product(&self, id: ProductId, _metadata: Option<OperationMetadata>) -> Result<(), PortError> {
            self.buy.write().await.remove(&id).map(|_| ()).ok_or_else(|| PortError::not_found("BuyProduct", id))
        }

        async fn get_borrow_product(&self, id: ProductId, _metadata: Option<OperationMetadata>) -> Result<BorrowProduct, PortError> {
            self.borrow.read().await.get(&id).cloned().ok_or_else(|| PortError::not_found("BorrowProduct", id))
        }

        async fn list_borrow_products(&self, _metadata: Option<OperationMetadata>) -> Result<Vec<BorrowProduct>, PortError> {
            Ok(sorted(&*self.borrow.read().await))
        }

        async fn save_borrow_product(
            &self,
            mut product: BorrowProduct,
            _metadata: Option<OperationMetadata>,
        ) -> Result<BorrowProduct, PortError> {
            assign_id(&mut product.core.id);
            self.borrow.write().await.insert(product.core.id, product.clone());
            Ok(product)
        }

        async fn delete_borrow_product(&self, id: ProductId, _metadata: Option<OperationMetadata>) -> Result<(), PortError> {
            self.borrow.write().await.remove(&id).map(|_| ()).ok_or_else(|| PortError::not_found("BorrowProduct", id))
        }

        async fn get_auction(&self, id: ProductId, _metadata: Option<OperationMetadata>) -> Result<AuctionProduct, PortError> {
            self.auctions.read().await.get(&id).cloned().ok_or_else(|| PortError::not_found("AuctionProduct", id))
        }

        async fn list_auctions(&self, _metadata: Option<OperationMetadata>) -> Result<Vec<AuctionProduct>, PortError> {
            Ok(sorted(&*self.auctions.read().await))
        }

        async fn save_auction(
            &self,
            mut auction: AuctionProduct,
            _metadata: Option<OperationMetadata>,
        ) -> Result<AuctionProduct, PortError> {
            assign_id(&mut auction.core.id);
            self.auctions.write().await.insert(auction.core.id, auction.clone());
            Ok(auction)
        }

        async fn record_bid(
            &self,
            auction: &AuctionProduct,
            _bid: &Bid,
            _metadata: Option<OperationMetadata>,
        ) -> Result<(), PortError> {
            if let Some(message) = self.reject_bids.read().await.clone() {
                return Err(PortError::internal(message));
            }
            let mut auctions = self.auctions.write().await;
            if !auctions.contains_key(&auction.core.id) {
                return Err(PortError::not_found("AuctionProduct", auction.core.id));
            }
            auctions.insert(auction.core.id, auction.clone());
            Ok(())
        }

        async fn delete_auction(&self, id: ProductId, _metadata: Option<OperationMetadata>) -> Result<(), PortError> {
            self.auctions.write().await.remove(&id).map(|_| ()).ok_or_else(|| PortError::not_found("AuctionProduct", id))
        }

        async fn list_categories(&self, _metadata: Option<OperationMetadata>) -> Result<Vec<Category>, PortError> {
            Ok(self.categories.read().await.clone())
        }

        async fn save_category(&self, category: Category, _metadata: Option<OperationMetadata>) -> Result<Category, PortError> {
            let mut categories = self.categories.write().await;
            categories.retain(|c| c.id != category.id);
            categories.push(category.clone());
            Ok(category)
        }

        async fn delete_category(&self, id: CategoryId, _metadata: Option<OperationMetadata>) -> Result<(), PortError> {
            let mut categories = self.categories.write().await;
            let before = categories.len();
            categories.retain(|c| c.id != id);
            if categories.len() == before {
                return Err(PortError::not_found("Category", id));
            }
            Ok(())
        }

        async fn list_conditions(&self, _metadata: Option<OperationMetadata>) -> Result<Vec<Condition>, PortError> {
            Ok(self.conditions.read().await.clone())
        }

        async fn save_condition(&self, condition: Condition, _metadata: Option<OperationMetadata>) -> Result<Condition, PortError> {
            let mut conditions = self.conditions.write().await;
            conditions.retain(|c| c.id != condition.id);
            conditions.push(condition.clone());
            Ok(condition)
        }

        async fn delete_condition(&self, id: ConditionId, _metadata: Option<OperationMetadata>) -> Result<(), PortError> {
            let mut conditions = self.conditions.write().await;
            let before = conditions.len();
            conditions.retain(|c| c.id != id);
            if conditions.len() == before {
                return Err(PortError::not_found("Condition", id));
            }
            Ok(())
        }

        async fn list_tags(&self, _metadata: Option<OperationMetadata>) -> Result<Vec<Tag>, PortError> {
            Ok(self.tags.read().await.clone())
        }

        async fn find_tag(&self, title: &str, _metadata: Option<OperationMetadata>) -> Result<Option<Tag>, PortError> {
            Ok(self.tags.read().await.iter().find(|t| t.title == title).cloned())
        }

        async fn save_tag(&self, tag: Tag, _metadata: Option<OperationMetadata>) -> Result<Tag, PortError> {
            let mut tags = self.tags.write().await;
            tags.retain(|t| t.id != tag.id);
            tags.push(tag.clone());
            Ok(tag)
        }

        async fn delete_tag(&self, id: TagId, _metadata: Option<OperationMetadata>) -> Result<(), PortError> {
            let mut tags = self.tags.write().await;
            let before = tags.len();
            tags.retain(|t| t.id != id);
            if tags.len() == before {
                return Err(PortError::not_found("Tag", id));
            }
            Ok(())
        }

        async fn add_waitlist_entry(
            &self,
            entry: WaitlistEntry,
            _metadata: Option<OperationMetadata>,
        ) -> Result<WaitlistEntry, PortError> {
            let mut waitlist = self.waitlist.write().await;
            if waitlist.iter().any(|e| e.user_id == entry.user_id && e.product_id == entry.product_id) {
                return Err(PortError::conflict("User is already in the waitlist for this product"));
            }
            waitlist.push(entry.clone());
            Ok(entry)
        }

        async fn remove_waitlist_entry(
            &self,
            user_id: UserId,
            product_id: ProductId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<(), PortError> {
            self.waitlist
                .write()
                .await
                .retain(|e| !(e.user_id == user_id && e.product_id == product_id));
            Ok(())
        }

        async fn waitlist_for_product(
            &self,
            product_id: ProductId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<WaitlistEntry>, PortError> {
            let mut entries: Vec<_> = self
                .waitlist
                .read()
                .await
                .iter()
                .filter(|e| e.product_id == product_id)
                .cloned()
                .collect();
            entries.sort_by(|a, b| a.joined_at.cmp(&b.joined_at).then(a.id.cmp(&b.id)));
            Ok(entries)
        }

        async fn waitlists_of_user(&self, user_id: UserId, _metadata: Option<OperationMetadata>) -> Result<Vec<WaitlistEntry>, PortError> {
            Ok(self
                .waitlist
                .read()
                .await
                .iter()
                .filter(|e| e.user_id == user_id)
                .cloned()
                .collect())
        }
    }
}
