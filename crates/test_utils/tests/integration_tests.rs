//! Cross-domain workflows over the in-memory ports
//!
//! Each test wires the real services together the way the API does and
//! walks one marketplace journey end to end.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{Money, UserId};
use domain_account::{AccountService, MockAccountPort, NotificationKind, UserRole};
use domain_basket::{BasketService, MockBasketPort, ProductType};
use domain_catalog::{AuctionService, BidError, CatalogError, CatalogService, MockCatalogPort, WaitlistService};
use domain_contract::{ContractError, ContractService, ContractStatus, MockContractPort};
use domain_messaging::{
    ChatbotService, ConversationService, KeywordResponder, MockMessagingPort, UserContextService, WELCOME_RESPONSE,
};
use domain_order::{
    CheckoutRequest, CheckoutService, MockOrderPort, MockTrackingPort, OrderError, OrderService, OrderStatus,
    PaymentMethod, TrackingService,
};
use domain_review::{MockReviewPort, ReviewService};
use test_utils::{
    assert_auction_led_by, assert_basket_has, assert_contract_status, assert_err_variant, assert_money_eq,
    ContactFixtures, RegistrationFixtures, TemporalFixtures, TestAuctionBuilder, TestBorrowProductBuilder,
    TestBuyProductBuilder, TestContractBuilder,
};

struct Marketplace {
    accounts: AccountService,
    catalog: CatalogService,
    auctions: AuctionService,
    waitlist: WaitlistService,
    baskets: BasketService,
    checkout: CheckoutService,
    orders: OrderService,
    tracking: TrackingService,
    contracts: ContractService,
    reviews: ReviewService,
    conversations: ConversationService,
    chatbot: ChatbotService,
}

impl Marketplace {
    fn new() -> Self {
        let account_port = Arc::new(MockAccountPort::new());
        let catalog_port = Arc::new(MockCatalogPort::new());
        let order_port = Arc::new(MockOrderPort::new());

        let accounts = AccountService::new(account_port);
        let waitlist = WaitlistService::new(catalog_port.clone(), accounts.clone());
        let catalog = CatalogService::new(catalog_port.clone())
            .with_waitlist(waitlist.clone())
            .with_accounts(accounts.clone());
        let baskets = BasketService::new(Arc::new(MockBasketPort::new()), catalog.clone());
        let orders = OrderService::new(order_port.clone());
        let reviews = ReviewService::new(Arc::new(MockReviewPort::new()), accounts.clone());
        let context = UserContextService::new(accounts.clone(), baskets.clone(), orders.clone(), reviews.clone());

        Self {
            auctions: AuctionService::new(catalog_port, accounts.clone()),
            checkout: CheckoutService::new(order_port, accounts.clone(), baskets.clone()),
            tracking: TrackingService::new(Arc::new(MockTrackingPort::new())),
            contracts: ContractService::new(Arc::new(MockContractPort::new()), accounts.clone()),
            conversations: ConversationService::new(Arc::new(MockMessagingPort::new())),
            chatbot: ChatbotService::new(Arc::new(KeywordResponder::default())).with_context(context),
            accounts,
            catalog,
            waitlist,
            baskets,
            orders,
            reviews,
        }
    }

    async fn user(&self, role: UserRole, balance: Decimal) -> UserId {
        let user = self
            .accounts
            .register(RegistrationFixtures::random(role))
            .await
            .expect("registration");
        self.accounts
            .set_balance(user.id, Money::usd(balance))
            .await
            .expect("balance");
        user.id
    }

    fn checkout_request(buyer_id: UserId, payment_method: PaymentMethod) -> CheckoutRequest {
        CheckoutRequest {
            buyer_id,
            payment_method,
            contact: ContactFixtures::buyer_contact(),
            additional_info: None,
            rentals: HashMap::new(),
        }
    }

    async fn balance(&self, user_id: UserId) -> Decimal {
        self.accounts.get_balance(user_id).await.unwrap().amount()
    }
}

// ============================================================================
// Auction to order
// ============================================================================

mod auction_to_order {
    use super::*;

    #[tokio::test]
    async fn test_outbid_refund_and_won_auction_checkout() {
        let market = Marketplace::new();
        let now = TemporalFixtures::now();
        let seller = market.user(UserRole::Seller, dec!(0)).await;
        let first = market.user(UserRole::Buyer, dec!(500)).await;
        let second = market.user(UserRole::Buyer, dec!(500)).await;

        let auction = market
            .catalog
            .create_auction_listing_at(TestAuctionBuilder::new().with_seller(seller).build(), now)
            .await
            .unwrap();
        let id = auction.core.id;

        market.auctions.place_bid_at(id, first, Money::usd(dec!(120)), now).await.unwrap();
        assert_eq!(market.balance(first).await, dec!(380));

        let below = market
            .auctions
            .place_bid_at(id, second, Money::usd(dec!(120.50)), now + Duration::minutes(5))
            .await;
        assert_err_variant!(below, CatalogError::Bid(BidError::BelowMinimum(_)));

        let auction = market
            .auctions
            .place_bid_at(id, second, Money::usd(dec!(150)), now + Duration::hours(1))
            .await
            .unwrap();
        assert_auction_led_by(&auction, second, dec!(150));
        assert_eq!(market.balance(first).await, dec!(500));
        assert_eq!(market.balance(second).await, dec!(350));

        let notes = market.accounts.get_notifications(first, 10).await.unwrap();
        assert!(notes
            .iter()
            .any(|n| n.kind == NotificationKind::Outbid { product_id: id }));

        let outcome = market
            .auctions
            .conclude_auction_at(id, auction.end_time + Duration::minutes(1))
            .await
            .unwrap();
        assert_eq!(outcome.winner_id, Some(second));
        assert_money_eq(&outcome.final_price, dec!(150));
        assert_eq!(market.balance(second).await, dec!(500));

        let basket = market.baskets.add_won_auction(&auction, &outcome).await.unwrap().unwrap();
        assert_eq!(basket.items[0].product_type, ProductType::Bid);

        let totals = market.checkout.preview(second, &HashMap::new()).await.unwrap();
        assert!(totals.delivery_fee.is_zero());
        assert_money_eq(&totals.final_total, dec!(150));

        market
            .checkout
            .create_order_from_cart_at(Marketplace::checkout_request(second, PaymentMethod::Wallet), now)
            .await
            .unwrap();
        assert_eq!(market.balance(second).await, dec!(350));
        assert!(market.baskets.get_basket(second).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_running_auction_cannot_be_concluded() {
        let market = Marketplace::new();
        let now = TemporalFixtures::now();
        let seller = market.user(UserRole::Seller, dec!(0)).await;
        let auction = market
            .catalog
            .create_auction_listing_at(TestAuctionBuilder::new().with_seller(seller).build(), now)
            .await
            .unwrap();

        let result = market.auctions.conclude_auction_at(auction.core.id, now).await;
        assert_err_variant!(result, CatalogError::AuctionStillRunning);
    }
}

// ============================================================================
// Borrowing
// ============================================================================

mod borrowing {
    use super::*;

    #[tokio::test]
    async fn test_rental_is_billed_per_month_with_warranty() {
        let market = Marketplace::new();
        let now = TemporalFixtures::now();
        let seller = market.user(UserRole::Seller, dec!(0)).await;
        let buyer = market.user(UserRole::Buyer, dec!(0)).await;

        let tent = market
            .catalog
            .create_borrow_listing_at(
                TestBorrowProductBuilder::new().with_seller(seller).with_daily_rate(dec!(12)).build(),
                now,
            )
            .await
            .unwrap();
        market.baskets.add_borrowed_product(buyer, tent.core.id).await.unwrap();

        let mut rentals = HashMap::new();
        rentals.insert(tent.core.id, TemporalFixtures::three_month_borrow());
        let totals = market.checkout.preview(buyer, &rentals).await.unwrap();
        assert_money_eq(&totals.subtotal, dec!(36));
        assert_money_eq(&totals.warranty_tax, dec!(7.20));
        assert_money_eq(&totals.delivery_fee, dec!(13.99));
        assert_money_eq(&totals.final_total, dec!(57.19));

        let mut request = Marketplace::checkout_request(buyer, PaymentMethod::Card);
        request.rentals = rentals;
        let history = market.checkout.create_order_from_cart_at(request, now).await.unwrap();

        let orders = market.orders.orders_in_history(history).await.unwrap();
        assert_eq!(orders.len(), 1);
        let summary = market.orders.summary_of(&orders[0]).await.unwrap();
        assert!(summary
            .contract_details
            .as_deref()
            .is_some_and(|d| d.starts_with("Borrowing Camping tent from 15/11/2024")));
    }

    #[tokio::test]
    async fn test_returned_product_goes_to_the_waitlist_head() {
        let market = Marketplace::new();
        let now = TemporalFixtures::now();
        let seller = market.user(UserRole::Seller, dec!(0)).await;
        let borrower = market.user(UserRole::Buyer, dec!(0)).await;
        let next = market.user(UserRole::Buyer, dec!(0)).await;
        let later = market.user(UserRole::Buyer, dec!(0)).await;

        let product = market
            .catalog
            .create_borrow_listing_at(
                TestBorrowProductBuilder::new().with_seller(seller).borrowed_by(borrower).build(),
                now,
            )
            .await
            .unwrap();
        let id = product.core.id;

        market.waitlist.join(next, id).await.unwrap();
        market.waitlist.join(later, id).await.unwrap();
        assert_err_variant!(market.waitlist.join(next, id).await, CatalogError::AlreadyWaitlisted);
        assert_eq!(market.waitlist.position(later, id).await.unwrap(), 2);

        assert_eq!(market.waitlist.return_borrowed_product(id).await.unwrap(), Some(next));
        let product = market.catalog.get_borrow_product(id).await.unwrap();
        assert_eq!(product.borrower_id, Some(next));
        assert_eq!(market.waitlist.position(later, id).await.unwrap(), 1);

        let notes = market.accounts.get_notifications(next, 10).await.unwrap();
        assert!(notes
            .iter()
            .any(|n| n.kind == NotificationKind::ProductAvailable { product_id: id }));

        market.catalog.delete_borrow_product(id).await.unwrap();
        let notes = market.accounts.get_notifications(later, 10).await.unwrap();
        assert!(notes
            .iter()
            .any(|n| n.kind == NotificationKind::ProductRemoved { product_id: id }));
    }
}

// ============================================================================
// Checkout and tracking
// ============================================================================

mod checkout_and_tracking {
    use super::*;

    #[tokio::test]
    async fn test_promo_checkout_then_tracking_lifecycle() {
        let market = Marketplace::new();
        let now = TemporalFixtures::now();
        let seller = market.user(UserRole::Seller, dec!(0)).await;
        let buyer = market.user(UserRole::Buyer, dec!(0)).await;

        let lamp = market
            .catalog
            .create_buy_listing(
                TestBuyProductBuilder::new()
                    .with_seller(seller)
                    .with_title("Desk lamp")
                    .with_price(dec!(100))
                    .with_stock(5)
                    .build(),
            )
            .await
            .unwrap();
        market.baskets.add_product(buyer, lamp.core.id, 2).await.unwrap();
        let basket = market.baskets.apply_promo_code(buyer, "welcome20").await.unwrap();
        assert_basket_has(&basket, "Desk lamp", 2);

        let totals = market.checkout.preview(buyer, &HashMap::new()).await.unwrap();
        assert_money_eq(&totals.discount, dec!(40));
        assert_money_eq(&totals.subtotal, dec!(160));
        assert_money_eq(&totals.final_total, dec!(173.99));

        let history = market
            .checkout
            .create_order_from_cart_at(Marketplace::checkout_request(buyer, PaymentMethod::Cash), now)
            .await
            .unwrap();
        let order = market.orders.orders_in_history(history).await.unwrap().remove(0);
        assert_eq!(order.quantity, 2);
        assert_eq!(order.seller_id, seller);
        assert_eq!(market.catalog.get_buy_product(lamp.core.id).await.unwrap().stock, 3);
        assert_eq!(market.orders.orders_of_seller(seller).await.unwrap().len(), 1);

        let buyer_profile = market.accounts.get_buyer(buyer).await.unwrap();
        assert_eq!(buyer_profile.number_of_purchases, 1);
        assert_eq!(buyer_profile.badge, domain_account::BuyerBadge::Silver);

        let tracked = market
            .tracking
            .create_tracked_order_for_order_at(order.id, "Str. Lunga 5, Iasi", None, now)
            .await
            .unwrap();
        assert_eq!(tracked.current_status, OrderStatus::Processing);
        assert_eq!(tracked.estimated_delivery_date, (now + Duration::days(7)).date_naive());

        market
            .tracking
            .update_status_with_checkpoint_at(
                tracked.id,
                OrderStatus::Shipped,
                Some("Bucharest hub"),
                None,
                now + Duration::days(1),
            )
            .await
            .unwrap();
        assert_eq!(market.tracking.checkpoint_count(tracked.id).await.unwrap(), 2);

        let reverted = market.tracking.revert_to_previous_checkpoint(tracked.id).await.unwrap();
        assert_eq!(reverted.current_status, OrderStatus::Processing);
        assert_err_variant!(
            market.tracking.revert_to_previous_checkpoint(tracked.id).await,
            OrderError::CannotRevert
        );
    }

    #[tokio::test]
    async fn test_wallet_checkout_needs_enough_balance() {
        let market = Marketplace::new();
        let seller = market.user(UserRole::Seller, dec!(0)).await;
        let buyer = market.user(UserRole::Buyer, dec!(20)).await;

        let pen = market
            .catalog
            .create_buy_listing(TestBuyProductBuilder::new().with_seller(seller).with_price(dec!(10)).build())
            .await
            .unwrap();
        market.baskets.add_product(buyer, pen.core.id, 1).await.unwrap();

        let result = market
            .checkout
            .create_order_from_cart(Marketplace::checkout_request(buyer, PaymentMethod::Wallet))
            .await;
        assert!(result.is_err());
        assert_eq!(market.balance(buyer).await, dec!(20));
        assert_basket_has(&market.baskets.get_basket(buyer).await.unwrap(), "Mechanical keyboard", 1);
    }
}

// ============================================================================
// Contracts
// ============================================================================

mod contracts {
    use super::*;

    #[tokio::test]
    async fn test_renewal_chain_and_expiry_warnings() {
        let market = Marketplace::new();
        let now = TemporalFixtures::now();
        let seller = market.user(UserRole::Seller, dec!(0)).await;
        let buyer = market.user(UserRole::Buyer, dec!(0)).await;

        let original = market
            .contracts
            .add_contract(
                TestContractBuilder::new()
                    .between(buyer, seller)
                    .ending_in(3, now)
                    .with_additional_terms("Return cleaned")
                    .build(),
                None,
            )
            .await
            .unwrap();
        assert!(market.contracts.get_pdf(original.id).await.unwrap().starts_with(b"%PDF"));

        assert_eq!(market.contracts.notify_expiring_at(now).await.unwrap(), 1);
        let notes = market.accounts.get_notifications(buyer, 10).await.unwrap();
        assert!(notes
            .iter()
            .any(|n| n.kind == NotificationKind::ContractExpiration { contract_id: original.id }));

        let renewal = market.contracts.renew_contract(original.id, None).await.unwrap();
        assert_contract_status(&renewal, ContractStatus::Renewed);
        assert_eq!(renewal.start_date, original.end_date);
        assert_eq!(renewal.additional_terms.as_deref(), Some("Return cleaned"));

        let history = market.contracts.contract_history(renewal.id).await.unwrap();
        assert_eq!(
            history.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![renewal.id, original.id]
        );
        assert_err_variant!(
            market.contracts.renew_contract(original.id, None).await,
            ContractError::AlreadyRenewed
        );

        let expired = market
            .contracts
            .expire_contracts_at(now + Duration::days(4))
            .await
            .unwrap();
        assert_eq!(expired.len(), 1);
        assert_contract_status(&expired[0], ContractStatus::Expired);
    }
}

// ============================================================================
// Reviews and the assistant
// ============================================================================

mod reviews_and_assistant {
    use super::*;

    #[tokio::test]
    async fn test_reviews_drive_seller_trust() {
        let market = Marketplace::new();
        let seller = market.user(UserRole::Seller, dec!(0)).await;
        let first = market.user(UserRole::Buyer, dec!(0)).await;
        let second = market.user(UserRole::Buyer, dec!(0)).await;

        market.reviews.add_review(seller, first, "Great seller", vec![], dec!(4)).await.unwrap();
        market.reviews.add_review(seller, second, "Fast shipping", vec![], dec!(5)).await.unwrap();
        assert_eq!(market.accounts.get_seller(seller).await.unwrap().trust_score, dec!(90));

        market
            .reviews
            .edit_review(seller, first, "Item scratched", dec!(3), None)
            .await
            .unwrap();
        assert_eq!(market.accounts.get_seller(seller).await.unwrap().trust_score, dec!(80));

        market.reviews.delete_review(seller, first).await.unwrap();
        assert_eq!(market.accounts.get_seller(seller).await.unwrap().trust_score, dec!(100));

        let views = market.reviews.reviews_of_seller(seller).await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].review.buyer_id, second);
    }

    #[tokio::test]
    async fn test_conversation_opens_with_welcome_then_answers() {
        let market = Marketplace::new();
        let buyer = market.user(UserRole::Buyer, dec!(0)).await;
        let conversation = market.conversations.create_conversation(buyer).await.unwrap();

        let (_, welcome) = market
            .conversations
            .send_and_reply(&market.chatbot, conversation.id, buyer, "hello")
            .await
            .unwrap();
        assert_eq!(welcome, WELCOME_RESPONSE);

        let (_, answer) = market
            .conversations
            .send_and_reply(&market.chatbot, conversation.id, buyer, "Where is my delivery?")
            .await
            .unwrap();
        assert!(answer.contains("tracking"));

        let messages = market.conversations.messages_of_conversation(conversation.id).await.unwrap();
        assert_eq!(messages.len(), 2);
    }
}
