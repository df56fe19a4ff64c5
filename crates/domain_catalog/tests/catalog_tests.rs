//! Service-level tests for domain_catalog

use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal_macros::dec;

use core_kernel::{Money, Pagination, ProductId, UserId};
use domain_account::{AccountService, MockAccountPort, NotificationKind, RegistrationRequest, UserRole};
use domain_catalog::{
    AuctionProduct, AuctionService, BidError, BorrowProduct, BuyProduct, CatalogError,
    CatalogService, ListingCore, ListingFilter, ListingForm, ListingFormDetails, ListingSort, Listing,
    MockCatalogPort, SortKey, WaitlistService,
};

struct Fixture {
    accounts: AccountService,
    account_port: Arc<MockAccountPort>,
    port: Arc<MockCatalogPort>,
    catalog: CatalogService,
    auctions: AuctionService,
    waitlist: WaitlistService,
}

fn fixture() -> Fixture {
    let account_port = Arc::new(MockAccountPort::new());
    let accounts = AccountService::new(account_port.clone());
    let port = Arc::new(MockCatalogPort::new());
    let waitlist = WaitlistService::new(port.clone(), accounts.clone());
    Fixture {
        catalog: CatalogService::new(port.clone())
            .with_waitlist(waitlist.clone())
            .with_accounts(accounts.clone()),
        auctions: AuctionService::new(port.clone(), accounts.clone()),
        waitlist,
        accounts,
        account_port,
        port,
    }
}

async fn user(accounts: &AccountService, name: &str, role: UserRole, balance: rust_decimal::Decimal) -> UserId {
    let user = accounts
        .register(RegistrationRequest {
            username: name.to_string(),
            email: format!("{}@market.ro", name),
            password: "Passw0rd!".to_string(),
            phone: "+40712345678".to_string(),
            role,
        })
        .await
        .unwrap();
    accounts.set_balance(user.id, Money::usd(balance)).await.unwrap();
    user.id
}

async fn running_auction(f: &Fixture, seller: UserId) -> ProductId {
    let now = Utc::now();
    let auction = AuctionProduct::new(
        ListingCore::new("Vintage camera", "Leica M3", seller),
        now - Duration::minutes(1),
        now + Duration::days(2),
        Money::usd(dec!(100)),
    );
    f.catalog.create_auction_listing(auction).await.unwrap().core.id
}

// ============================================================================
// Bidding
// ============================================================================

mod bidding_tests {
    use super::*;

    #[tokio::test]
    async fn test_bid_debits_and_outbid_is_refunded() {
        let f = fixture();
        let seller = user(&f.accounts, "seller01", UserRole::Seller, dec!(0)).await;
        let alice = user(&f.accounts, "alice01", UserRole::Buyer, dec!(500)).await;
        let bob = user(&f.accounts, "bobby01", UserRole::Buyer, dec!(500)).await;
        let product = running_auction(&f, seller).await;

        f.auctions.place_bid(product, alice, Money::usd(dec!(120))).await.unwrap();
        assert_eq!(f.accounts.get_balance(alice).await.unwrap().amount(), dec!(380));

        let err = f
            .auctions
            .place_bid(product, bob, Money::usd(dec!(120.5)))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Bid must be at least $121.00");

        let auction = f.auctions.place_bid(product, bob, Money::usd(dec!(150))).await.unwrap();
        assert_eq!(auction.current_price.amount(), dec!(150));
        assert_eq!(auction.bids.len(), 2);
        assert_eq!(f.accounts.get_balance(bob).await.unwrap().amount(), dec!(350));
        assert_eq!(f.accounts.get_balance(alice).await.unwrap().amount(), dec!(500));

        let notifications = f.accounts.get_notifications(alice, 0).await.unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::Outbid { product_id: product });
    }

    #[tokio::test]
    async fn test_seller_and_unknown_bidder_rejected() {
        let f = fixture();
        let seller = user(&f.accounts, "seller01", UserRole::Seller, dec!(1000)).await;
        let product = running_auction(&f, seller).await;

        let err = f.auctions.place_bid(product, seller, Money::usd(dec!(200))).await.unwrap_err();
        assert!(matches!(err, CatalogError::Bid(BidError::OwnAuction)));

        let err = f
            .auctions
            .place_bid(product, UserId::new(), Money::usd(dec!(200)))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Bid(BidError::UnknownBidder)));

        let err = f
            .auctions
            .place_bid(ProductId::nil(), seller, Money::usd(dec!(200)))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Cannot place bid on an unsaved auction");
    }

    #[tokio::test]
    async fn test_insufficient_balance() {
        let f = fixture();
        let seller = user(&f.accounts, "seller01", UserRole::Seller, dec!(0)).await;
        let poor = user(&f.accounts, "poorbuyer", UserRole::Buyer, dec!(50)).await;
        let product = running_auction(&f, seller).await;

        let err = f.auctions.place_bid(product, poor, Money::usd(dec!(100))).await.unwrap_err();
        assert_eq!(err.to_string(), "Insufficient balance");
    }

    #[tokio::test]
    async fn test_storage_failure_refunds_bidder() {
        let f = fixture();
        let seller = user(&f.accounts, "seller01", UserRole::Seller, dec!(0)).await;
        let alice = user(&f.accounts, "alice01", UserRole::Buyer, dec!(300)).await;
        let product = running_auction(&f, seller).await;

        f.port.reject_bids_with("database unavailable").await;
        let err = f.auctions.place_bid(product, alice, Money::usd(dec!(120))).await.unwrap_err();
        assert!(matches!(err, CatalogError::Bid(BidError::Rejected(_))));
        assert_eq!(f.accounts.get_balance(alice).await.unwrap().amount(), dec!(300));
        assert!(f.auctions.get_auction(product).await.unwrap().bids.is_empty());
    }

    #[tokio::test]
    async fn test_outbid_bookkeeping_failure_keeps_stored_bid() {
        let f = fixture();
        let seller = user(&f.accounts, "seller01", UserRole::Seller, dec!(0)).await;
        let alice = user(&f.accounts, "alice01", UserRole::Buyer, dec!(500)).await;
        let bob = user(&f.accounts, "bobby01", UserRole::Buyer, dec!(500)).await;
        let product = running_auction(&f, seller).await;
        f.auctions.place_bid(product, alice, Money::usd(dec!(120))).await.unwrap();

        f.account_port.reject_credits_with("wallet service down").await;
        f.account_port.reject_notifications_with("mailer down").await;

        let auction = f.auctions.place_bid(product, bob, Money::usd(dec!(150))).await.unwrap();
        assert_eq!(auction.highest_bid().map(|b| b.bidder_id), Some(bob));
        assert_eq!(f.auctions.get_auction(product).await.unwrap().bids.len(), 2);
        assert_eq!(f.accounts.get_balance(bob).await.unwrap().amount(), dec!(350));
        assert_eq!(f.accounts.get_balance(alice).await.unwrap().amount(), dec!(380));
        assert!(f.accounts.get_notifications(alice, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_conclude_requires_ended_auction() {
        let f = fixture();
        let seller = user(&f.accounts, "seller01", UserRole::Seller, dec!(0)).await;
        let alice = user(&f.accounts, "alice01", UserRole::Buyer, dec!(300)).await;
        let product = running_auction(&f, seller).await;
        f.auctions.place_bid(product, alice, Money::usd(dec!(110))).await.unwrap();

        let err = f.auctions.conclude_auction(product).await.unwrap_err();
        assert!(matches!(err, CatalogError::AuctionStillRunning));

        let outcome = f
            .auctions
            .conclude_auction_at(product, Utc::now() + Duration::days(3))
            .await
            .unwrap();
        assert_eq!(outcome.winner_id, Some(alice));
        assert_eq!(outcome.final_price.amount(), dec!(110));
        assert!(f.auctions.get_auction(product).await.is_err());
        // The held bid is released; the item is paid for at checkout
        assert_eq!(f.accounts.get_balance(alice).await.unwrap().amount(), dec!(300));
    }

    #[tokio::test]
    async fn test_conclude_without_bids_moves_no_money() {
        let f = fixture();
        let seller = user(&f.accounts, "seller01", UserRole::Seller, dec!(0)).await;
        let product = running_auction(&f, seller).await;

        let outcome = f
            .auctions
            .conclude_auction_at(product, Utc::now() + Duration::days(3))
            .await
            .unwrap();
        assert_eq!(outcome.winner_id, None);
        assert_eq!(outcome.final_price.amount(), dec!(100));
        assert_eq!(f.accounts.get_balance(seller).await.unwrap().amount(), dec!(0));
    }
}

// ============================================================================
// Listings and forms
// ============================================================================

mod listing_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_from_form_creates_tags_on_demand() {
        let f = fixture();
        let seller = user(&f.accounts, "seller01", UserRole::Seller, dec!(0)).await;
        let category = f.catalog.create_category("Outdoors", "").await.unwrap();
        let condition = f.catalog.create_condition("Used", "").await.unwrap();
        let existing = f.catalog.tag("camping").await.unwrap();

        let form = ListingForm {
            title: "Tent".to_string(),
            category_id: Some(category.id),
            description: "Two person tent".to_string(),
            tags: vec!["camping".to_string(), "summer".to_string()],
            condition_id: Some(condition.id),
            details: ListingFormDetails::Buy { price: "45.00".to_string() },
        };
        let listing = f.catalog.create_from_form(seller, &form, Utc::now()).await.unwrap();

        let Listing::Buy(product) = listing else {
            panic!("expected a buy listing");
        };
        assert_eq!(product.core.tags[0].id, existing.id);
        assert_eq!(f.catalog.tags().await.unwrap().len(), 2);
        assert_eq!(product.core.category.as_ref().map(|c| c.id), Some(category.id));
    }

    #[tokio::test]
    async fn test_search_across_buy_listings() {
        let f = fixture();
        let seller = user(&f.accounts, "seller01", UserRole::Seller, dec!(0)).await;
        for (title, price) in [("Oak table", dec!(120)), ("Pine table", dec!(80)), ("Lamp", dec!(20))] {
            f.catalog
                .create_buy_listing(BuyProduct::new(ListingCore::new(title, "", seller), Money::usd(price)))
                .await
                .unwrap();
        }

        let result = f
            .catalog
            .search_buy_products(&ListingFilter::new().with_search("TABLE"), None, Pagination::all())
            .await
            .unwrap();
        assert_eq!(result.total_count, 2);
        assert_eq!(result.max_price.amount(), dec!(120));

        let followed = f.catalog.listings_of_sellers(&[seller]).await.unwrap();
        assert_eq!(followed.len(), 3);
    }

    #[tokio::test]
    async fn test_sort_by_seller_uses_usernames() {
        let f = fixture();
        let zed = user(&f.accounts, "zed_tools", UserRole::Seller, dec!(0)).await;
        let amy = user(&f.accounts, "amy_crafts", UserRole::Seller, dec!(0)).await;
        let mia = user(&f.accounts, "mia_home", UserRole::Seller, dec!(0)).await;
        for (title, seller) in [("Hammer", zed), ("Quilt", amy), ("Vase", mia)] {
            f.catalog
                .create_buy_listing(BuyProduct::new(ListingCore::new(title, "", seller), Money::usd(dec!(10))))
                .await
                .unwrap();
        }

        let result = f
            .catalog
            .search_buy_products(
                &ListingFilter::new(),
                Some(ListingSort::ascending(SortKey::Seller)),
                Pagination::all(),
            )
            .await
            .unwrap();
        let titles: Vec<_> = result.items.iter().map(|p| p.core.title.as_str()).collect();
        assert_eq!(titles, vec!["Quilt", "Vase", "Hammer"]);
    }

    #[tokio::test]
    async fn test_borrow_listing_defaults() {
        let f = fixture();
        let seller = user(&f.accounts, "seller01", UserRole::Seller, dec!(0)).await;
        let now = Utc::now();
        let product = f
            .catalog
            .create_borrow_listing_at(
                BorrowProduct::new(ListingCore::new("Drill", "", seller), Money::usd(dec!(4))),
                now,
            )
            .await
            .unwrap();
        assert_eq!(product.end_date, Some(now + Duration::days(7)));
        assert!(!product.core.id.is_nil());
    }
}

// ============================================================================
// Waitlists
// ============================================================================

mod waitlist_tests {
    use super::*;

    async fn borrowed_product(f: &Fixture, seller: UserId, borrower: UserId) -> ProductId {
        let mut product = f
            .catalog
            .create_borrow_listing(BorrowProduct::new(ListingCore::new("Kayak", "", seller), Money::usd(dec!(9))))
            .await
            .unwrap();
        product.lend_to(borrower);
        f.catalog.update_borrow_product(product).await.unwrap().core.id
    }

    #[tokio::test]
    async fn test_queue_positions_and_duplicates() {
        let f = fixture();
        let seller = user(&f.accounts, "seller01", UserRole::Seller, dec!(0)).await;
        let (a, b, c) = (UserId::new(), UserId::new(), UserId::new());
        let product = borrowed_product(&f, seller, a).await;

        f.waitlist.join(b, product).await.unwrap();
        f.waitlist.join(c, product).await.unwrap();
        assert!(matches!(
            f.waitlist.join(b, product).await.unwrap_err(),
            CatalogError::AlreadyWaitlisted
        ));

        assert_eq!(f.waitlist.position(c, product).await.unwrap(), 2);
        assert_eq!(f.waitlist.position(a, product).await.unwrap(), 0);
        assert_eq!(f.waitlist.size(product).await.unwrap(), 2);

        f.waitlist.leave(b, product).await.unwrap();
        assert_eq!(f.waitlist.position(c, product).await.unwrap(), 1);
        assert_eq!(f.waitlist.user_waitlists(c).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_return_hands_product_to_head() {
        let f = fixture();
        let seller = user(&f.accounts, "seller01", UserRole::Seller, dec!(0)).await;
        let first = user(&f.accounts, "borrower1", UserRole::Buyer, dec!(0)).await;
        let next = user(&f.accounts, "borrower2", UserRole::Buyer, dec!(0)).await;
        let product = borrowed_product(&f, seller, first).await;
        f.waitlist.join(next, product).await.unwrap();

        let handed_to = f.waitlist.return_borrowed_product(product).await.unwrap();
        assert_eq!(handed_to, Some(next));
        assert_eq!(f.waitlist.size(product).await.unwrap(), 0);

        let stored = f.catalog.get_borrow_product(product).await.unwrap();
        assert_eq!(stored.borrower_id, Some(next));
        let notes = f.accounts.get_notifications(next, 0).await.unwrap();
        assert_eq!(notes[0].kind, NotificationKind::ProductAvailable { product_id: product });

        assert_eq!(f.waitlist.return_borrowed_product(product).await.unwrap(), None);
        assert!(!f.catalog.get_borrow_product(product).await.unwrap().is_borrowed);
    }

    #[tokio::test]
    async fn test_removing_listing_notifies_waitlist() {
        let f = fixture();
        let seller = user(&f.accounts, "seller01", UserRole::Seller, dec!(0)).await;
        let waiting = user(&f.accounts, "waiting1", UserRole::Buyer, dec!(0)).await;
        let product = borrowed_product(&f, seller, UserId::new()).await;
        f.waitlist.join(waiting, product).await.unwrap();

        f.catalog.delete_borrow_product(product).await.unwrap();
        let notes = f.accounts.get_notifications(waiting, 0).await.unwrap();
        assert_eq!(notes[0].kind, NotificationKind::ProductRemoved { product_id: product });
    }
}
