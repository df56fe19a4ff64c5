//! Listing and taxonomy services

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use core_kernel::{ensure_id, CategoryId, ConditionId, Pagination, ProductId, TagId, UserId};
use domain_account::AccountService;

use crate::auction::AuctionProduct;
use crate::borrow::BorrowProduct;
use crate::buy::BuyProduct;
use crate::error::CatalogError;
use crate::filter::{filter_listings, FilteredListings, ListingFilter, ListingSort, SellerNames, SortKey};
use crate::listing_form::{ListingForm, ValidatedDetails};
use crate::ports::{CatalogPort, CatalogPortExt};
use crate::product::{Category, Condition, Listed, Listing, ListingCore, Tag};
use crate::waitlist::WaitlistService;

/// Creates, lists and removes listings of every kind
#[derive(Clone)]
pub struct CatalogService {
    port: Arc<dyn CatalogPort>,
    waitlist: Option<WaitlistService>,
    accounts: Option<AccountService>,
}

impl CatalogService {
    pub fn new(port: Arc<dyn CatalogPort>) -> Self {
        Self {
            port,
            waitlist: None,
            accounts: None,
        }
    }

    /// Notifies waitlisted buyers when a borrow listing is removed
    pub fn with_waitlist(mut self, waitlist: WaitlistService) -> Self {
        self.waitlist = Some(waitlist);
        self
    }

    /// Resolves seller usernames for sorting by seller
    pub fn with_accounts(mut self, accounts: AccountService) -> Self {
        self.accounts = Some(accounts);
        self
    }

    /// Usernames of the listings' sellers, when the sort needs them
    async fn seller_names<L: Listed>(&self, listings: &[L], sort: Option<ListingSort>) -> SellerNames {
        let mut names = SellerNames::new();
        let (Some(accounts), Some(ListingSort { key: SortKey::Seller, .. })) = (&self.accounts, sort) else {
            return names;
        };
        let sellers: BTreeSet<UserId> = listings.iter().map(|l| l.core().seller_id).collect();
        for seller_id in sellers {
            match accounts.get_user(seller_id).await {
                Ok(user) => {
                    names.insert(seller_id, user.username);
                }
                Err(e) => warn!(seller_id = %seller_id, error = %e, "Seller name unavailable for sorting"),
            }
        }
        names
    }

    #[instrument(skip(self, product), fields(title = %product.core.title))]
    pub async fn create_buy_listing(&self, product: BuyProduct) -> Result<BuyProduct, CatalogError> {
        product.validate()?;
        let product = self.port.save_buy_product(product, None).await?;
        info!(product_id = %product.core.id, "Buy listing created");
        Ok(product)
    }

    pub async fn create_borrow_listing(&self, product: BorrowProduct) -> Result<BorrowProduct, CatalogError> {
        self.create_borrow_listing_at(product, Utc::now()).await
    }

    #[instrument(skip(self, product, now), fields(title = %product.core.title))]
    pub async fn create_borrow_listing_at(
        &self,
        mut product: BorrowProduct,
        now: DateTime<Utc>,
    ) -> Result<BorrowProduct, CatalogError> {
        let mut errors = product.validation_errors();
        errors.retain(|(field, _)| *field != "end_date");
        if let Some((field, message)) = errors.first() {
            return Err(CatalogError::invalid_field(*field, *message));
        }
        product.apply_creation_defaults(now);
        let product = self.port.save_borrow_product(product, None).await?;
        info!(product_id = %product.core.id, "Borrow listing created");
        Ok(product)
    }

    pub async fn create_auction_listing(&self, auction: AuctionProduct) -> Result<AuctionProduct, CatalogError> {
        self.create_auction_listing_at(auction, Utc::now()).await
    }

    #[instrument(skip(self, auction, now), fields(title = %auction.core.title))]
    pub async fn create_auction_listing_at(
        &self,
        mut auction: AuctionProduct,
        now: DateTime<Utc>,
    ) -> Result<AuctionProduct, CatalogError> {
        if auction.core.title.trim().is_empty() {
            return Err(CatalogError::invalid_field("title", "Title is required"));
        }
        if auction.core.seller_id.is_nil() {
            return Err(CatalogError::invalid_field("seller_id", "Valid seller ID is required"));
        }
        auction.apply_creation_defaults(now);
        let auction = self.port.save_auction(auction, None).await?;
        info!(product_id = %auction.core.id, end_time = %auction.end_time, "Auction created");
        Ok(auction)
    }

    /// Validates the listing form and creates the listing it describes
    ///
    /// Tags are looked up by title and created when they do not exist yet.
    pub async fn create_from_form(
        &self,
        seller_id: UserId,
        form: &ListingForm,
        now: DateTime<Utc>,
    ) -> Result<Listing, CatalogError> {
        let details = form.validate(now)?;

        let mut core = ListingCore::new(form.title.trim(), form.description.trim(), seller_id);
        core.category = self.find_category(form.category_id).await?;
        core.condition = self.find_condition(form.condition_id).await?;
        for title in form.tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
            core.tags.push(self.port.get_or_create_tag(title, None).await?);
        }

        let listing = match details {
            ValidatedDetails::Buy { price } => Listing::Buy(self.create_buy_listing(BuyProduct::new(core, price)).await?),
            ValidatedDetails::Borrow { daily_rate, time_limit } => {
                let mut product = BorrowProduct::new(core, daily_rate);
                product.time_limit = Some(time_limit);
                Listing::Borrow(self.create_borrow_listing_at(product, now).await?)
            }
            ValidatedDetails::Auction { starting_price, end_date } => {
                let auction = AuctionProduct::new(core, now, end_date, starting_price);
                Listing::Auction(self.create_auction_listing_at(auction, now).await?)
            }
        };
        Ok(listing)
    }

    async fn find_category(&self, id: Option<CategoryId>) -> Result<Option<Category>, CatalogError> {
        let Some(id) = id else { return Ok(None) };
        Ok(self.port.list_categories(None).await?.into_iter().find(|c| c.id == id))
    }

    async fn find_condition(&self, id: Option<ConditionId>) -> Result<Option<Condition>, CatalogError> {
        let Some(id) = id else { return Ok(None) };
        Ok(self.port.list_conditions(None).await?.into_iter().find(|c| c.id == id))
    }

    pub async fn get_buy_product(&self, id: ProductId) -> Result<BuyProduct, CatalogError> {
        ensure_id(id.is_nil(), "product")?;
        Ok(self.port.get_buy_product(id, None).await?)
    }

    pub async fn get_borrow_product(&self, id: ProductId) -> Result<BorrowProduct, CatalogError> {
        ensure_id(id.is_nil(), "product")?;
        Ok(self.port.get_borrow_product(id, None).await?)
    }

    pub async fn get_auction(&self, id: ProductId) -> Result<AuctionProduct, CatalogError> {
        ensure_id(id.is_nil(), "product")?;
        Ok(self.port.get_auction(id, None).await?)
    }

    /// Finds a listing of any kind
    pub async fn get_listing(&self, id: ProductId) -> Result<Listing, CatalogError> {
        ensure_id(id.is_nil(), "product")?;
        match self.port.get_buy_product(id, None).await {
            Ok(p) => return Ok(Listing::Buy(p)),
            Err(e) if !e.is_not_found() => return Err(e.into()),
            Err(_) => {}
        }
        match self.port.get_borrow_product(id, None).await {
            Ok(p) => return Ok(Listing::Borrow(p)),
            Err(e) if !e.is_not_found() => return Err(e.into()),
            Err(_) => {}
        }
        Ok(Listing::Auction(self.port.get_auction(id, None).await?))
    }

    /// Every listing, buy first, then borrow, then auction
    pub async fn all_listings(&self) -> Result<Vec<Listing>, CatalogError> {
        let mut listings: Vec<Listing> = self
            .port
            .list_buy_products(None)
            .await?
            .into_iter()
            .map(Listing::Buy)
            .collect();
        listings.extend(self.port.list_borrow_products(None).await?.into_iter().map(Listing::Borrow));
        listings.extend(self.port.list_auctions(None).await?.into_iter().map(Listing::Auction));
        Ok(listings)
    }

    pub async fn search_buy_products(
        &self,
        filter: &ListingFilter,
        sort: Option<ListingSort>,
        page: Pagination,
    ) -> Result<FilteredListings<BuyProduct>, CatalogError> {
        let products = self.port.list_buy_products(None).await?;
        let names = self.seller_names(&products, sort).await;
        Ok(filter_listings(&products, filter, sort, page, &names))
    }

    pub async fn search_borrow_products(
        &self,
        filter: &ListingFilter,
        sort: Option<ListingSort>,
        page: Pagination,
    ) -> Result<FilteredListings<BorrowProduct>, CatalogError> {
        let products = self.port.list_borrow_products(None).await?;
        let names = self.seller_names(&products, sort).await;
        Ok(filter_listings(&products, filter, sort, page, &names))
    }

    pub async fn search_auctions(
        &self,
        filter: &ListingFilter,
        sort: Option<ListingSort>,
        page: Pagination,
    ) -> Result<FilteredListings<AuctionProduct>, CatalogError> {
        let auctions = self.port.list_auctions(None).await?;
        let names = self.seller_names(&auctions, sort).await;
        Ok(filter_listings(&auctions, filter, sort, page, &names))
    }

    /// Listings of the given sellers, e.g. those a buyer follows
    pub async fn listings_of_sellers(&self, seller_ids: &[UserId]) -> Result<Vec<Listing>, CatalogError> {
        Ok(self
            .all_listings()
            .await?
            .into_iter()
            .filter(|l| seller_ids.contains(&l.core().seller_id))
            .collect())
    }

    pub async fn update_buy_product(&self, product: BuyProduct) -> Result<BuyProduct, CatalogError> {
        ensure_id(product.core.id.is_nil(), "product")?;
        product.validate()?;
        self.port.get_buy_product(product.core.id, None).await?;
        Ok(self.port.save_buy_product(product, None).await?)
    }

    /// Removes sold units from a buy listing's stock
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn take_stock(&self, id: ProductId, quantity: u32) -> Result<BuyProduct, CatalogError> {
        ensure_id(id.is_nil(), "product")?;
        let mut product = self.port.get_buy_product(id, None).await?;
        product.take_stock(quantity)?;
        let product = self.port.save_buy_product(product, None).await?;
        debug!(remaining = product.stock, "Stock taken");
        Ok(product)
    }

    pub async fn update_borrow_product(&self, product: BorrowProduct) -> Result<BorrowProduct, CatalogError> {
        ensure_id(product.core.id.is_nil(), "product")?;
        product.validate()?;
        self.port.get_borrow_product(product.core.id, None).await?;
        Ok(self.port.save_borrow_product(product, None).await?)
    }

    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_buy_product(&self, id: ProductId) -> Result<(), CatalogError> {
        ensure_id(id.is_nil(), "product")?;
        Ok(self.port.delete_buy_product(id, None).await?)
    }

    /// Removes a borrow listing, telling waitlisted buyers first
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_borrow_product(&self, id: ProductId) -> Result<(), CatalogError> {
        ensure_id(id.is_nil(), "product")?;
        if let Some(waitlist) = &self.waitlist {
            let notified = waitlist.notify_product_removed(id).await?;
            if notified > 0 {
                info!(notified, "Waitlisted buyers told about removal");
            }
        }
        Ok(self.port.delete_borrow_product(id, None).await?)
    }

    pub async fn delete_auction(&self, id: ProductId) -> Result<(), CatalogError> {
        ensure_id(id.is_nil(), "product")?;
        Ok(self.port.delete_auction(id, None).await?)
    }

    pub async fn create_category(&self, title: &str, description: &str) -> Result<Category, CatalogError> {
        if title.trim().is_empty() {
            return Err(CatalogError::invalid_field("title", "Category title cannot be empty"));
        }
        Ok(self.port.save_category(Category::new(title.trim(), description), None).await?)
    }

    pub async fn categories(&self) -> Result<Vec<Category>, CatalogError> {
        Ok(self.port.list_categories(None).await?)
    }

    pub async fn delete_category(&self, id: CategoryId) -> Result<(), CatalogError> {
        ensure_id(id.is_nil(), "category")?;
        Ok(self.port.delete_category(id, None).await?)
    }

    pub async fn create_condition(&self, title: &str, description: &str) -> Result<Condition, CatalogError> {
        if title.trim().is_empty() {
            return Err(CatalogError::invalid_field("title", "Condition title cannot be empty"));
        }
        Ok(self.port.save_condition(Condition::new(title.trim(), description), None).await?)
    }

    pub async fn conditions(&self) -> Result<Vec<Condition>, CatalogError> {
        Ok(self.port.list_conditions(None).await?)
    }

    pub async fn delete_condition(&self, id: ConditionId) -> Result<(), CatalogError> {
        ensure_id(id.is_nil(), "condition")?;
        Ok(self.port.delete_condition(id, None).await?)
    }

    /// Returns the tag with this title, creating it on first use
    pub async fn tag(&self, title: &str) -> Result<Tag, CatalogError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(CatalogError::invalid_field("title", "Tag title cannot be empty"));
        }
        Ok(self.port.get_or_create_tag(title, None).await?)
    }

    pub async fn tags(&self) -> Result<Vec<Tag>, CatalogError> {
        Ok(self.port.list_tags(None).await?)
    }

    pub async fn delete_tag(&self, id: TagId) -> Result<(), CatalogError> {
        ensure_id(id.is_nil(), "tag")?;
        Ok(self.port.delete_tag(id, None).await?)
    }
}
