//! Test Data Builders
//!
//! Builders for domain values with sensible defaults, so a test only spells
//! out the fields it cares about.

use chrono::{DateTime, Duration, Utc};
use core_kernel::{Money, OrderId, ProductId, UserId};
use domain_account::{User, UserRole};
use domain_basket::{Basket, BasketItem, ProductType};
use domain_catalog::{AuctionProduct, Bid, BorrowProduct, BuyProduct, Category, Condition, ListingCore, Tag};
use domain_contract::{Contract, ContractStatus, PredefinedContractType};
use domain_review::{Review, ReviewImage};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::fixtures::{IdFixtures, MoneyFixtures, StringFixtures, TemporalFixtures, TEST_PASSWORD_HASH};

/// Builder for [`User`]
pub struct TestUserBuilder {
    username: String,
    email: Option<String>,
    role: UserRole,
    balance: Money,
    failed_logins: u32,
    banned_until: Option<DateTime<Utc>>,
}

impl Default for TestUserBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestUserBuilder {
    pub fn new() -> Self {
        Self {
            username: "test_buyer".to_string(),
            email: None,
            role: UserRole::Buyer,
            balance: MoneyFixtures::usd_zero(),
            failed_logins: 0,
            banned_until: None,
        }
    }

    pub fn buyer(username: impl Into<String>) -> Self {
        Self::new().with_username(username)
    }

    pub fn seller(username: impl Into<String>) -> Self {
        Self::new().with_username(username).with_role(UserRole::Seller)
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    /// Defaults to `<username>@market.ro`
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_role(mut self, role: UserRole) -> Self {
        self.role = role;
        self
    }

    pub fn with_balance(mut self, amount: Decimal) -> Self {
        self.balance = Money::usd(amount);
        self
    }

    pub fn with_failed_logins(mut self, count: u32) -> Self {
        self.failed_logins = count;
        self
    }

    pub fn suspended_until(mut self, until: DateTime<Utc>) -> Self {
        self.banned_until = Some(until);
        self
    }

    /// A user whose password is [`crate::fixtures::TEST_PASSWORD`]
    pub fn build(self) -> User {
        let email = self
            .email
            .unwrap_or_else(|| format!("{}@market.ro", self.username));
        let mut user = User::new(
            self.username,
            email,
            StringFixtures::phone(),
            TEST_PASSWORD_HASH.as_str(),
            self.role,
        );
        user.balance = self.balance;
        user.failed_logins = self.failed_logins;
        user.banned_until = self.banned_until;
        user
    }
}

/// Listing fields shared by the product builders
#[derive(Clone)]
struct CoreFields {
    id: ProductId,
    title: String,
    description: String,
    seller_id: UserId,
    condition: Option<Condition>,
    category: Option<Category>,
    tags: Vec<Tag>,
}

impl CoreFields {
    fn new(title: &str) -> Self {
        Self {
            id: ProductId::nil(),
            title: title.to_string(),
            description: format!("{} in good shape", title),
            seller_id: IdFixtures::seller_id(),
            condition: None,
            category: None,
            tags: Vec::new(),
        }
    }

    fn build(self) -> ListingCore {
        let mut core = ListingCore::new(self.title, self.description, self.seller_id).with_tags(self.tags);
        core.id = self.id;
        core.condition = self.condition;
        core.category = self.category;
        core
    }
}

macro_rules! core_setters {
    () => {
        /// Gives the listing an id, as if it had been stored
        pub fn saved(mut self) -> Self {
            self.core.id = ProductId::new_v7();
            self
        }

        pub fn with_id(mut self, id: ProductId) -> Self {
            self.core.id = id;
            self
        }

        pub fn with_title(mut self, title: impl Into<String>) -> Self {
            self.core.title = title.into();
            self
        }

        pub fn with_description(mut self, description: impl Into<String>) -> Self {
            self.core.description = description.into();
            self
        }

        pub fn with_seller(mut self, seller_id: UserId) -> Self {
            self.core.seller_id = seller_id;
            self
        }

        pub fn with_condition(mut self, title: &str) -> Self {
            self.core.condition = Some(Condition::new(title, ""));
            self
        }

        pub fn with_category(mut self, category: Category) -> Self {
            self.core.category = Some(category);
            self
        }

        pub fn with_tag(mut self, tag: Tag) -> Self {
            self.core.tags.push(tag);
            self
        }
    };
}

/// Builder for fixed-price listings
pub struct TestBuyProductBuilder {
    core: CoreFields,
    price: Money,
    stock: u32,
}

impl Default for TestBuyProductBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestBuyProductBuilder {
    pub fn new() -> Self {
        Self {
            core: CoreFields::new("Mechanical keyboard"),
            price: MoneyFixtures::listing_price(),
            stock: 1,
        }
    }

    core_setters!();

    pub fn with_price(mut self, amount: Decimal) -> Self {
        self.price = Money::usd(amount);
        self
    }

    pub fn with_stock(mut self, stock: u32) -> Self {
        self.stock = stock;
        self
    }

    pub fn build(self) -> BuyProduct {
        let mut product = BuyProduct::new(self.core.build(), self.price);
        product.stock = self.stock;
        product
    }
}

/// Builder for borrow listings
pub struct TestBorrowProductBuilder {
    core: CoreFields,
    daily_rate: Money,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    time_limit: Option<DateTime<Utc>>,
    borrower: Option<UserId>,
}

impl Default for TestBorrowProductBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestBorrowProductBuilder {
    pub fn new() -> Self {
        Self {
            core: CoreFields::new("Camping tent"),
            daily_rate: MoneyFixtures::daily_rate(),
            start_date: None,
            end_date: None,
            time_limit: None,
            borrower: None,
        }
    }

    core_setters!();

    pub fn with_daily_rate(mut self, amount: Decimal) -> Self {
        self.daily_rate = Money::usd(amount);
        self
    }

    pub fn available_between(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    pub fn with_time_limit(mut self, limit: DateTime<Utc>) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn borrowed_by(mut self, borrower: UserId) -> Self {
        self.borrower = Some(borrower);
        self
    }

    pub fn build(self) -> BorrowProduct {
        let mut product = BorrowProduct::new(self.core.build(), self.daily_rate);
        product.start_date = self.start_date;
        product.end_date = self.end_date;
        product.time_limit = self.time_limit;
        if let Some(borrower) = self.borrower {
            product.lend_to(borrower);
        }
        product
    }
}

/// Builder for auctions; by default running around [`TemporalFixtures::now`]
pub struct TestAuctionBuilder {
    core: CoreFields,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    start_price: Money,
    bids: Vec<(UserId, Decimal)>,
}

impl Default for TestAuctionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestAuctionBuilder {
    pub fn new() -> Self {
        let (start_time, end_time) = TemporalFixtures::running_auction_window();
        Self {
            core: CoreFields::new("Vintage camera"),
            start_time,
            end_time,
            start_price: MoneyFixtures::auction_start(),
            bids: Vec::new(),
        }
    }

    core_setters!();

    pub fn with_start_price(mut self, amount: Decimal) -> Self {
        self.start_price = Money::usd(amount);
        self
    }

    pub fn with_window(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start_time = start;
        self.end_time = end;
        self
    }

    pub fn ended(self) -> Self {
        let (start, end) = TemporalFixtures::ended_auction_window();
        self.with_window(start, end)
    }

    pub fn not_started(self) -> Self {
        let now = TemporalFixtures::now();
        self.with_window(now + Duration::hours(1), now + Duration::days(3))
    }

    /// Bids are recorded in order, ten minutes apart from the start
    pub fn with_bid(mut self, bidder: UserId, amount: Decimal) -> Self {
        self.bids.push((bidder, amount));
        self
    }

    pub fn build(self) -> AuctionProduct {
        let mut auction = AuctionProduct::new(self.core.build(), self.start_time, self.end_time, self.start_price);
        for (i, (bidder, amount)) in self.bids.into_iter().enumerate() {
            let at = self.start_time + Duration::minutes(10 * (i as i64 + 1));
            let bid = Bid::new(auction.core.id, bidder, Money::usd(amount), at);
            auction.current_price = auction.current_price.checked_max(bid.price).unwrap_or(bid.price);
            auction.bids.push(bid);
        }
        auction
    }
}

/// Builder for baskets
pub struct TestBasketBuilder {
    buyer_id: UserId,
    items: Vec<BasketItem>,
    promo_code: Option<String>,
}

impl Default for TestBasketBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestBasketBuilder {
    pub fn new() -> Self {
        Self {
            buyer_id: IdFixtures::buyer_id(),
            items: Vec::new(),
            promo_code: None,
        }
    }

    pub fn for_buyer(mut self, buyer_id: UserId) -> Self {
        self.buyer_id = buyer_id;
        self
    }

    /// Adds a line for a new product with a fresh id
    pub fn with_item(self, title: &str, unit_price: Decimal, quantity: u32) -> Self {
        self.with_typed_item(title, unit_price, quantity, ProductType::New)
    }

    pub fn with_typed_item(mut self, title: &str, unit_price: Decimal, quantity: u32, product_type: ProductType) -> Self {
        self.items.push(BasketItem::new(
            ProductId::new_v7(),
            IdFixtures::seller_id(),
            title,
            Money::usd(unit_price),
            quantity,
            product_type,
        ));
        self
    }

    pub fn with_promo_code(mut self, code: impl Into<String>) -> Self {
        self.promo_code = Some(code.into());
        self
    }

    pub fn build(self) -> Basket {
        let mut basket = Basket::new(self.buyer_id);
        for item in self.items {
            basket.add_item(item);
        }
        basket.promo_code = self.promo_code;
        basket
    }
}

/// Builder for contracts, active over calendar 2025 by default
pub struct TestContractBuilder {
    order_id: OrderId,
    buyer_id: UserId,
    seller_id: UserId,
    template: PredefinedContractType,
    content: String,
    status: ContractStatus,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    additional_terms: Option<String>,
}

impl Default for TestContractBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContractBuilder {
    pub fn new() -> Self {
        Self {
            order_id: IdFixtures::order_id(),
            buyer_id: IdFixtures::buyer_id(),
            seller_id: IdFixtures::seller_id(),
            template: PredefinedContractType::Buying,
            content: "The seller transfers ownership of the product to the buyer.".to_string(),
            status: ContractStatus::Active,
            start_date: TemporalFixtures::contract_start(),
            end_date: TemporalFixtures::contract_end(),
            additional_terms: None,
        }
    }

    pub fn for_order(mut self, order_id: OrderId) -> Self {
        self.order_id = order_id;
        self
    }

    pub fn between(mut self, buyer_id: UserId, seller_id: UserId) -> Self {
        self.buyer_id = buyer_id;
        self.seller_id = seller_id;
        self
    }

    pub fn with_template(mut self, template: PredefinedContractType) -> Self {
        self.template = template;
        self
    }

    pub fn with_status(mut self, status: ContractStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_dates(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    /// Ends `days` after `now`, started a year earlier
    pub fn ending_in(self, days: i64, now: DateTime<Utc>) -> Self {
        let end = now + Duration::days(days);
        self.with_dates(end - Duration::days(365), end)
    }

    pub fn with_additional_terms(mut self, terms: impl Into<String>) -> Self {
        self.additional_terms = Some(terms.into());
        self
    }

    pub fn build(self) -> Contract {
        let mut contract = Contract::new(
            self.order_id,
            self.buyer_id,
            self.seller_id,
            self.template,
            self.content,
            self.start_date,
            self.end_date,
        );
        contract.status = self.status;
        contract.additional_terms = self.additional_terms;
        contract
    }
}

/// Builder for reviews
pub struct TestReviewBuilder {
    seller_id: UserId,
    buyer_id: UserId,
    description: String,
    rating: Decimal,
    images: Vec<ReviewImage>,
}

impl Default for TestReviewBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestReviewBuilder {
    pub fn new() -> Self {
        Self {
            seller_id: IdFixtures::seller_id(),
            buyer_id: IdFixtures::buyer_id(),
            description: "Arrived on time, exactly as described".to_string(),
            rating: dec!(4.5),
            images: Vec::new(),
        }
    }

    pub fn between(mut self, buyer_id: UserId, seller_id: UserId) -> Self {
        self.buyer_id = buyer_id;
        self.seller_id = seller_id;
        self
    }

    pub fn with_rating(mut self, rating: Decimal) -> Self {
        self.rating = rating;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.images.push(ReviewImage::new(url));
        self
    }

    /// # Panics
    ///
    /// Panics if the builder holds a nil id or a blank description
    pub fn build(self) -> Review {
        Review::new(self.seller_id, self.buyer_id, self.description, self.images, self.rating)
            .expect("test review should be valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_account::verify_password;

    use crate::fixtures::TEST_PASSWORD;

    #[test]
    fn test_user_builder_defaults() {
        let user = TestUserBuilder::seller("vlad_store").with_balance(dec!(25)).build();
        assert_eq!(user.email, "vlad_store@market.ro");
        assert_eq!(user.role, UserRole::Seller);
        assert_eq!(user.balance.amount(), dec!(25));
        assert!(verify_password(TEST_PASSWORD, &user.password_hash));
    }

    #[test]
    fn test_buy_product_builder() {
        let product = TestBuyProductBuilder::new()
            .with_title("Desk lamp")
            .with_price(dec!(30))
            .with_condition("Used")
            .build();
        assert!(!product.core.is_saved());
        assert_eq!(product.price.amount(), dec!(30));
        assert_eq!(domain_basket::product_type_of(&product), ProductType::Used);
    }

    #[test]
    fn test_auction_builder_tracks_highest_bid() {
        let bidder = UserId::new();
        let auction = TestAuctionBuilder::new()
            .saved()
            .with_bid(bidder, dec!(110))
            .with_bid(UserId::new(), dec!(105))
            .build();
        assert_eq!(auction.bids.len(), 2);
        assert_eq!(auction.current_price.amount(), dec!(110));
        assert_eq!(auction.highest_bid().unwrap().bidder_id, bidder);
        assert!(auction.bids.iter().all(|b| b.product_id == auction.core.id));
    }

    #[test]
    fn test_basket_builder_totals() {
        let basket = TestBasketBuilder::new()
            .with_item("Notebook", dec!(10), 3)
            .with_item("Pen", dec!(2.5), 4)
            .with_promo_code("DISCOUNT10")
            .build();
        let totals = basket.totals(None).unwrap();
        assert_eq!(totals.subtotal.amount(), dec!(40));
        assert_eq!(totals.discount.amount(), dec!(4));
        assert_eq!(totals.total.amount(), dec!(36));
    }

    #[test]
    fn test_contract_builder_is_valid() {
        let contract = TestContractBuilder::new().build();
        assert!(contract.validate().is_ok());
        assert_eq!(contract.status, ContractStatus::Active);

        let now = TemporalFixtures::now();
        let closing = TestContractBuilder::new().ending_in(3, now).build();
        assert!(closing.expires_within(7, now));
    }

    #[test]
    fn test_review_builder() {
        let review = TestReviewBuilder::new().with_rating(dec!(9)).with_image("img.png").build();
        assert_eq!(review.images.len(), 1);
        assert!(review.rating <= domain_review::MAX_RATING);
    }
}
