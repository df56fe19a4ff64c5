//! HTTP service shell
//!
//! A thin Axum layer over the marketplace services: health probes, login
//! and the core buyer flows (bidding, basket, checkout, tracking, contract
//! renewal).
//!
//! # Architecture
//!
//! - **Handlers**: one module per flow, calling the domain services
//! - **Middleware**: bearer authentication and audit logging
//! - **DTOs**: request and response bodies
//! - **Error Handling**: domain errors map to JSON error responses
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, Ports};
//!
//! let app = create_router(Ports::postgres(pool), config);
//! axum::serve(listener, app).await?;
//! ```

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    http::HeaderValue,
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use core_kernel::{HealthCheckResult, HealthCheckable};
use domain_account::{AccountPort, AccountService};
use domain_basket::{BasketPort, BasketService};
use domain_catalog::{AuctionService, CatalogPort, CatalogService, WaitlistService};
use domain_contract::{ContractPort, ContractService};
use domain_order::{CheckoutService, OrderPort, OrderService, TrackingPort, TrackingService};
use infra_db::{
    DatabasePool, PostgresAccountAdapter, PostgresBasketAdapter, PostgresCatalogAdapter, PostgresContractAdapter,
    PostgresOrderAdapter, PostgresTrackingAdapter,
};

use crate::config::ApiConfig;
use crate::handlers::{auctions, auth as auth_handlers, basket, checkout, contracts, health, tracking};
use crate::middleware::{audit_middleware, auth_middleware};

/// Storage ports the service shell needs
#[derive(Clone)]
pub struct Ports {
    pub accounts: Arc<dyn AccountPort>,
    pub catalog: Arc<dyn CatalogPort>,
    pub baskets: Arc<dyn BasketPort>,
    pub orders: Arc<dyn OrderPort>,
    pub tracking: Arc<dyn TrackingPort>,
    pub contracts: Arc<dyn ContractPort>,
}

impl Ports {
    /// Postgres adapters sharing one pool
    pub fn postgres(pool: DatabasePool) -> Self {
        Self {
            accounts: Arc::new(PostgresAccountAdapter::new(pool.clone())),
            catalog: Arc::new(PostgresCatalogAdapter::new(pool.clone())),
            baskets: Arc::new(PostgresBasketAdapter::new(pool.clone())),
            orders: Arc::new(PostgresOrderAdapter::new(pool.clone())),
            tracking: Arc::new(PostgresTrackingAdapter::new(pool.clone())),
            contracts: Arc::new(PostgresContractAdapter::new(pool)),
        }
    }

    pub async fn health_checks(&self) -> Vec<HealthCheckResult> {
        vec![
            self.accounts.health_check().await,
            self.catalog.health_check().await,
            self.baskets.health_check().await,
            self.orders.health_check().await,
            self.tracking.health_check().await,
            self.contracts.health_check().await,
        ]
    }
}

/// Domain services wired over a set of ports
#[derive(Clone)]
pub struct Services {
    pub accounts: AccountService,
    pub catalog: CatalogService,
    pub auctions: AuctionService,
    pub baskets: BasketService,
    pub checkout: CheckoutService,
    pub orders: OrderService,
    pub tracking: TrackingService,
    pub contracts: ContractService,
}

impl Services {
    pub fn new(ports: &Ports) -> Self {
        let accounts = AccountService::new(ports.accounts.clone());
        let waitlist = WaitlistService::new(ports.catalog.clone(), accounts.clone());
        let catalog = CatalogService::new(ports.catalog.clone())
            .with_waitlist(waitlist)
            .with_accounts(accounts.clone());
        let baskets = BasketService::new(ports.baskets.clone(), catalog.clone());
        Self {
            auctions: AuctionService::new(ports.catalog.clone(), accounts.clone()),
            checkout: CheckoutService::new(ports.orders.clone(), accounts.clone(), baskets.clone()),
            orders: OrderService::new(ports.orders.clone()),
            tracking: TrackingService::new(ports.tracking.clone()),
            contracts: ContractService::new(ports.contracts.clone(), accounts.clone()),
            accounts,
            catalog,
            baskets,
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub ports: Ports,
    pub services: Services,
}

fn cors_layer(config: &ApiConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    }
}

/// Creates the main API router
pub fn create_router(ports: Ports, config: ApiConfig) -> Router {
    let cors = cors_layer(&config);
    let state = AppState {
        config: Arc::new(config),
        services: Services::new(&ports),
        ports,
    };

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness_check))
        .route("/health/ready", get(health::readiness_check));

    let login_routes = Router::new()
        .route("/auth/login", post(auth_handlers::login))
        .layer(axum_middleware::from_fn(audit_middleware));

    let auction_routes = Router::new()
        .route("/:id", get(auctions::get_auction))
        .route("/:id/bids", post(auctions::place_bid));

    let basket_routes = Router::new()
        .route("/", get(basket::get_basket))
        .route("/items", post(basket::add_item))
        .route("/items/:product_id", put(basket::update_quantity).delete(basket::remove_item))
        .route("/totals", get(basket::totals));

    // Protected API routes
    let protected_routes = Router::new()
        .nest("/auctions", auction_routes)
        .nest("/basket", basket_routes)
        .route("/checkout", post(checkout::checkout))
        .route("/orders/:id/tracking", get(tracking::order_tracking))
        .route("/contracts/:id/renew", post(contracts::renew_contract))
        .layer(axum_middleware::from_fn(audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", login_routes.merge(protected_routes))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(state)
}
