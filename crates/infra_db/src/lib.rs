//! Infrastructure Database Layer
//!
//! PostgreSQL adapters for the marketplace domain ports, built on SQLx.
//!
//! # Layout
//!
//! - [`pool`]: connection pool configuration and health checks
//! - [`error`]: [`DatabaseError`] and its mapping onto `PortError`
//! - [`documents`]: JSONB storage for nested aggregates (listings, baskets,
//!   buyer profiles)
//! - [`adapters`]: one `Postgres*Adapter` per domain port
//!
//! Flat records (users, orders, contracts, reviews, messages) have their own
//! tables and are read through `FromRow` row structs. The schema is expected
//! to exist; each adapter module documents the tables it uses.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, DatabaseConfig, PostgresCatalogAdapter};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/marketminds")).await?;
//! let catalog = PostgresCatalogAdapter::new(pool.clone());
//! ```

pub mod pool;
pub mod error;
pub mod documents;
pub mod adapters;

pub use pool::{check_pool, create_pool, create_pool_from_url, DatabaseConfig, DatabasePool};
pub use error::DatabaseError;
pub use documents::{Collection, DocumentStore};
pub use adapters::{
    PostgresAccountAdapter, PostgresBasketAdapter, PostgresCatalogAdapter, PostgresContractAdapter,
    PostgresMessagingAdapter, PostgresOrderAdapter, PostgresReviewAdapter, PostgresTrackingAdapter,
};
