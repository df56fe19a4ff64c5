//! Route tests for the service shell over the in-memory ports

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

use core_kernel::{Money, OrderHistoryId, OrderId, ProductId, UserId};
use domain_account::{MockAccountPort, RegistrationRequest, UserRole};
use domain_basket::MockBasketPort;
use domain_catalog::{AuctionProduct, BuyProduct, ListingCore, MockCatalogPort};
use domain_contract::{Contract, MockContractPort, PredefinedContractType};
use domain_order::{MockOrderPort, MockTrackingPort};
use interface_api::config::ApiConfig;
use interface_api::dto::auction::AuctionResponse;
use interface_api::dto::auth::LoginResponse;
use interface_api::dto::basket::{BasketResponse, TotalsResponse};
use interface_api::dto::checkout::CheckoutResponse;
use interface_api::dto::contract::ContractResponse;
use interface_api::dto::tracking::TrackingResponse;
use interface_api::{create_router, Ports, Services};

const PASSWORD: &str = "Passw0rd!";

struct Harness {
    server: TestServer,
    services: Services,
}

fn harness() -> Harness {
    let ports = Ports {
        accounts: Arc::new(MockAccountPort::new()),
        catalog: Arc::new(MockCatalogPort::new()),
        baskets: Arc::new(MockBasketPort::new()),
        orders: Arc::new(MockOrderPort::new()),
        tracking: Arc::new(MockTrackingPort::new()),
        contracts: Arc::new(MockContractPort::new()),
    };
    let config = ApiConfig {
        jwt_secret: "test-secret".to_string(),
        ..ApiConfig::default()
    };
    Harness {
        services: Services::new(&ports),
        server: TestServer::new(create_router(ports, config)).unwrap(),
    }
}

async fn register(h: &Harness, name: &str, role: UserRole, balance: Decimal) -> UserId {
    let user = h
        .services
        .accounts
        .register(RegistrationRequest {
            username: name.to_string(),
            email: format!("{}@market.ro", name),
            password: PASSWORD.to_string(),
            phone: "+40712345678".to_string(),
            role,
        })
        .await
        .unwrap();
    h.services.accounts.set_balance(user.id, Money::usd(balance)).await.unwrap();
    user.id
}

async fn login(h: &Harness, name: &str) -> String {
    let response = h
        .server
        .post("/api/v1/auth/login")
        .json(&json!({ "email": format!("{}@market.ro", name), "password": PASSWORD }))
        .await;
    response.assert_status_ok();
    response.json::<LoginResponse>().access_token
}

async fn listing(h: &Harness, seller: UserId, title: &str, price: Decimal) -> ProductId {
    let mut product = BuyProduct::new(ListingCore::new(title, "Route test listing", seller), Money::usd(price));
    product.stock = 5;
    h.services.catalog.create_buy_listing(product).await.unwrap().core.id
}

async fn running_auction(h: &Harness, seller: UserId) -> ProductId {
    let now = Utc::now();
    let auction = AuctionProduct::new(
        ListingCore::new("Vintage camera", "Leica M3", seller),
        now - Duration::minutes(1),
        now + Duration::days(2),
        Money::usd(dec!(100)),
    );
    h.services.catalog.create_auction_listing(auction).await.unwrap().core.id
}

fn checkout_body(payment_method: &str) -> Value {
    json!({
        "payment_method": payment_method,
        "contact": {
            "full_name": "Ioana Marin",
            "email": "ioana@market.ro",
            "phone": "+40722222222",
            "address": "Bd. Eroilor 10, Brasov",
            "postal_code": "500000"
        },
        "additional_info": "Leave at the door"
    })
}

// ============================================================================
// Health and login
// ============================================================================

mod public_routes {
    use super::*;

    #[tokio::test]
    async fn test_health_probes() {
        let h = harness();
        h.server.get("/health").await.assert_status_ok();
        h.server.get("/health/live").await.assert_status_ok();

        let ready = h.server.get("/health/ready").await;
        ready.assert_status_ok();
        let body: Value = ready.json();
        assert_eq!(body["status"], "ready");
        assert_eq!(body["adapters"].as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_login_issues_token() {
        let h = harness();
        let id = register(&h, "ioana_m", UserRole::Buyer, dec!(0)).await;

        let response = h
            .server
            .post("/api/v1/auth/login")
            .json(&json!({ "email": "ioana_m@market.ro", "password": PASSWORD }))
            .await;
        response.assert_status_ok();
        let body: LoginResponse = response.json();
        assert_eq!(body.user_id, *id.as_uuid());
        assert_eq!(body.role, UserRole::Buyer);
        assert_eq!(body.token_type, "Bearer");
    }

    #[tokio::test]
    async fn test_bad_credentials_are_unauthorized() {
        let h = harness();
        register(&h, "ioana_m", UserRole::Buyer, dec!(0)).await;

        let response = h
            .server
            .post("/api/v1/auth/login")
            .json(&json!({ "email": "ioana_m@market.ro", "password": "wrong" }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(body["error"], "unauthorized");
        assert_eq!(body["message"], "Login failed");

        let unknown = h
            .server
            .post("/api/v1/auth/login")
            .json(&json!({ "email": "nobody@market.ro", "password": PASSWORD }))
            .await;
        unknown.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(unknown.json::<Value>()["message"], "Email does not exist.");
    }

    #[tokio::test]
    async fn test_blank_login_fields_fail_validation() {
        let h = harness();
        let response = h
            .server
            .post("/api/v1/auth/login")
            .json(&json!({ "email": "", "password": "" }))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["details"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_protected_routes_need_a_token() {
        let h = harness();
        h.server.get("/api/v1/basket").await.assert_status(StatusCode::UNAUTHORIZED);
        h.server
            .get("/api/v1/basket")
            .authorization_bearer("not-a-token")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}

// ============================================================================
// Auctions
// ============================================================================

mod auction_routes {
    use super::*;

    #[tokio::test]
    async fn test_bid_raises_price_and_debits_wallet() {
        let h = harness();
        let seller = register(&h, "seller01", UserRole::Seller, dec!(0)).await;
        let buyer = register(&h, "alice01", UserRole::Buyer, dec!(500)).await;
        let product = running_auction(&h, seller).await;
        let token = login(&h, "alice01").await;

        let response = h
            .server
            .post(&format!("/api/v1/auctions/{}/bids", product.as_uuid()))
            .authorization_bearer(&token)
            .json(&json!({ "amount": "120" }))
            .await;
        response.assert_status_ok();
        let auction: AuctionResponse = response.json();
        assert_eq!(auction.current_price, dec!(120));
        assert_eq!(auction.bid_count, 1);
        assert_eq!(auction.highest_bidder, Some(*buyer.as_uuid()));

        let balance = h.services.accounts.get_balance(buyer).await.unwrap();
        assert_eq!(balance.amount(), dec!(380));
    }

    #[tokio::test]
    async fn test_bid_rejections() {
        let h = harness();
        let seller = register(&h, "seller01", UserRole::Seller, dec!(1000)).await;
        register(&h, "alice01", UserRole::Buyer, dec!(500)).await;
        let product = running_auction(&h, seller).await;
        let path = format!("/api/v1/auctions/{}/bids", product.as_uuid());

        let alice = login(&h, "alice01").await;
        let malformed = h
            .server
            .post(&path)
            .authorization_bearer(&alice)
            .json(&json!({ "amount": "lots" }))
            .await;
        malformed.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(malformed.json::<Value>()["message"], "Invalid bid format");

        let too_low = h
            .server
            .post(&path)
            .authorization_bearer(&alice)
            .json(&json!({ "amount": "90" }))
            .await;
        too_low.assert_status(StatusCode::CONFLICT);

        let own = login(&h, "seller01").await;
        h.server
            .post(&path)
            .authorization_bearer(&own)
            .json(&json!({ "amount": "200" }))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }
}

// ============================================================================
// Basket and checkout
// ============================================================================

mod basket_routes {
    use super::*;

    #[tokio::test]
    async fn test_add_update_and_remove_items() {
        let h = harness();
        let seller = register(&h, "seller01", UserRole::Seller, dec!(0)).await;
        register(&h, "ioana_m", UserRole::Buyer, dec!(0)).await;
        let tent = listing(&h, seller, "Camping tent", dec!(60)).await;
        let lamp = listing(&h, seller, "Desk lamp", dec!(15)).await;
        let token = login(&h, "ioana_m").await;

        for product in [tent, lamp] {
            let added = h
                .server
                .post("/api/v1/basket/items")
                .authorization_bearer(&token)
                .json(&json!({ "product_id": product.as_uuid(), "quantity": 2 }))
                .await;
            added.assert_status(StatusCode::CREATED);
        }

        let updated = h
            .server
            .put(&format!("/api/v1/basket/items/{}", tent.as_uuid()))
            .authorization_bearer(&token)
            .json(&json!({ "quantity": 3 }))
            .await;
        updated.assert_status_ok();

        let removed = h
            .server
            .delete(&format!("/api/v1/basket/items/{}", lamp.as_uuid()))
            .authorization_bearer(&token)
            .await;
        removed.assert_status_ok();
        let basket: BasketResponse = removed.json();
        assert_eq!(basket.items.len(), 1);
        assert_eq!(basket.items[0].quantity, 3);
        assert_eq!(basket.items[0].line_total, dec!(180));

        let totals = h
            .server
            .get("/api/v1/basket/totals")
            .add_query_param("promo_code", "welcome20")
            .authorization_bearer(&token)
            .await;
        totals.assert_status_ok();
        let totals: TotalsResponse = totals.json();
        assert_eq!(totals.subtotal, dec!(180));
        assert_eq!(totals.discount, dec!(36));
        assert_eq!(totals.total, dec!(144));
    }

    #[tokio::test]
    async fn test_invalid_quantities_and_missing_lines() {
        let h = harness();
        register(&h, "ioana_m", UserRole::Buyer, dec!(0)).await;
        let token = login(&h, "ioana_m").await;

        let zero = h
            .server
            .post("/api/v1/basket/items")
            .authorization_bearer(&token)
            .json(&json!({ "product_id": ProductId::new().as_uuid(), "quantity": 0 }))
            .await;
        zero.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let missing = h
            .server
            .put(&format!("/api/v1/basket/items/{}", ProductId::new().as_uuid()))
            .authorization_bearer(&token)
            .json(&json!({ "quantity": 1 }))
            .await;
        missing.assert_status(StatusCode::NOT_FOUND);

        let negative = h
            .server
            .put(&format!("/api/v1/basket/items/{}", ProductId::new().as_uuid()))
            .authorization_bearer(&token)
            .json(&json!({ "quantity": -1 }))
            .await;
        negative.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(negative.json::<Value>()["message"], "Quantity cannot be negative");
    }

    #[tokio::test]
    async fn test_wallet_checkout_places_orders() {
        let h = harness();
        let seller = register(&h, "seller01", UserRole::Seller, dec!(0)).await;
        let buyer = register(&h, "ioana_m", UserRole::Buyer, dec!(500)).await;
        let tent = listing(&h, seller, "Camping tent", dec!(60)).await;
        let token = login(&h, "ioana_m").await;

        h.server
            .post("/api/v1/basket/items")
            .authorization_bearer(&token)
            .json(&json!({ "product_id": tent.as_uuid(), "quantity": 2 }))
            .await
            .assert_status(StatusCode::CREATED);

        let response = h
            .server
            .post("/api/v1/checkout")
            .authorization_bearer(&token)
            .json(&checkout_body("wallet"))
            .await;
        response.assert_status(StatusCode::CREATED);
        let placed: CheckoutResponse = response.json();
        assert_eq!(placed.subtotal, dec!(120));
        assert_eq!(placed.delivery_fee, dec!(13.99));
        assert_eq!(placed.final_total, dec!(133.99));

        let orders = h
            .services
            .orders
            .orders_in_history(OrderHistoryId::from(placed.history_id))
            .await
            .unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].quantity, 2);
        assert_eq!(h.services.accounts.get_balance(buyer).await.unwrap().amount(), dec!(366.01));

        let basket: BasketResponse = h
            .server
            .get("/api/v1/basket")
            .authorization_bearer(&token)
            .await
            .json();
        assert!(basket.items.is_empty());
    }

    #[tokio::test]
    async fn test_checkout_rejections() {
        let h = harness();
        register(&h, "ioana_m", UserRole::Buyer, dec!(500)).await;
        let token = login(&h, "ioana_m").await;

        let empty = h
            .server
            .post("/api/v1/checkout")
            .authorization_bearer(&token)
            .json(&checkout_body("wallet"))
            .await;
        empty.assert_status(StatusCode::CONFLICT);
        assert_eq!(empty.json::<Value>()["message"], "Cart is empty");

        let unsupported = h
            .server
            .post("/api/v1/checkout")
            .authorization_bearer(&token)
            .json(&checkout_body("barter"))
            .await;
        unsupported.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = unsupported.json();
        assert_eq!(body["details"][0], "payment_method: Unsupported payment method 'barter'");
    }
}

// ============================================================================
// Tracking and contracts
// ============================================================================

mod order_routes {
    use super::*;

    async fn placed_order(h: &Harness) -> (OrderId, String) {
        let seller = register(h, "seller01", UserRole::Seller, dec!(0)).await;
        register(h, "ioana_m", UserRole::Buyer, dec!(500)).await;
        let tent = listing(h, seller, "Camping tent", dec!(60)).await;
        let token = login(h, "ioana_m").await;

        h.server
            .post("/api/v1/basket/items")
            .authorization_bearer(&token)
            .json(&json!({ "product_id": tent.as_uuid(), "quantity": 1 }))
            .await
            .assert_status(StatusCode::CREATED);
        let placed: CheckoutResponse = h
            .server
            .post("/api/v1/checkout")
            .authorization_bearer(&token)
            .json(&checkout_body("card"))
            .await
            .json();
        let orders = h
            .services
            .orders
            .orders_in_history(OrderHistoryId::from(placed.history_id))
            .await
            .unwrap();
        (orders[0].id, token)
    }

    #[tokio::test]
    async fn test_buyer_sees_tracking() {
        let h = harness();
        let (order_id, token) = placed_order(&h).await;
        h.services
            .tracking
            .create_tracked_order_for_order(order_id, "Bd. Eroilor 10, Brasov")
            .await
            .unwrap();

        let response = h
            .server
            .get(&format!("/api/v1/orders/{}/tracking", order_id.as_uuid()))
            .authorization_bearer(&token)
            .await;
        response.assert_status_ok();
        let tracking: TrackingResponse = response.json();
        assert_eq!(tracking.status, "PROCESSING");
        assert_eq!(tracking.checkpoints.len(), 1);
        assert_eq!(tracking.delivery_address, "Bd. Eroilor 10, Brasov");
    }

    #[tokio::test]
    async fn test_tracking_is_private_and_may_be_missing() {
        let h = harness();
        let (order_id, token) = placed_order(&h).await;

        h.server
            .get(&format!("/api/v1/orders/{}/tracking", order_id.as_uuid()))
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::NOT_FOUND);

        register(&h, "stranger", UserRole::Buyer, dec!(0)).await;
        let stranger = login(&h, "stranger").await;
        h.server
            .get(&format!("/api/v1/orders/{}/tracking", order_id.as_uuid()))
            .authorization_bearer(&stranger)
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_contract_renewal() {
        let h = harness();
        let buyer = register(&h, "ioana_m", UserRole::Buyer, dec!(0)).await;
        register(&h, "stranger", UserRole::Buyer, dec!(0)).await;
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let contract = h
            .services
            .contracts
            .add_contract(
                Contract::new(
                    OrderId::new(),
                    buyer,
                    UserId::new(),
                    PredefinedContractType::Borrowing,
                    "Borrowing agreement for a camping tent",
                    start,
                    end,
                ),
                None,
            )
            .await
            .unwrap();
        let path = format!("/api/v1/contracts/{}/renew", contract.id.as_uuid());

        let stranger = login(&h, "stranger").await;
        h.server
            .post(&path)
            .authorization_bearer(&stranger)
            .json(&json!({}))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let token = login(&h, "ioana_m").await;
        let response = h.server.post(&path).authorization_bearer(&token).json(&json!({})).await;
        response.assert_status(StatusCode::CREATED);
        let renewal: ContractResponse = response.json();
        assert_eq!(renewal.renewed_from, Some(*contract.id.as_uuid()));
        assert_eq!(renewal.status, "RENEWED");
        assert_eq!(renewal.start_date, end);

        let again = h.server.post(&path).authorization_bearer(&token).json(&json!({})).await;
        again.assert_status(StatusCode::CONFLICT);
        assert_eq!(again.json::<Value>()["message"], "This contract has already been renewed.");
    }
}
