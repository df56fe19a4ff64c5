//! PostgreSQL adapters for the domain ports
//!
//! Each adapter implements one domain port trait plus `HealthCheckable`.
//! Flat entities live in their own tables and are read through `FromRow`
//! row structs; nested aggregates go through the [`DocumentStore`].
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresAccountAdapter;
//! use domain_account::{AccountPort, AccountService};
//! use std::sync::Arc;
//!
//! let accounts = AccountService::new(Arc::new(PostgresAccountAdapter::new(pool)));
//! ```
//!
//! [`DocumentStore`]: crate::documents::DocumentStore

pub mod account;
pub mod catalog;
pub mod basket;
pub mod order;
pub mod tracking;
pub mod contract;
pub mod review;
pub mod messaging;

pub use account::PostgresAccountAdapter;
pub use catalog::PostgresCatalogAdapter;
pub use basket::PostgresBasketAdapter;
pub use order::PostgresOrderAdapter;
pub use tracking::PostgresTrackingAdapter;
pub use contract::PostgresContractAdapter;
pub use review::PostgresReviewAdapter;
pub use messaging::PostgresMessagingAdapter;

use core_kernel::{Currency, Money, PortError};
use rust_decimal::Decimal;

use crate::error::DatabaseError;

/// Rebuilds a `Money` from its stored amount and currency code
pub(crate) fn money(amount: Decimal, currency: &str) -> Result<Money, DatabaseError> {
    let currency: Currency = currency.parse().map_err(DatabaseError::serialization)?;
    Ok(Money::new(amount, currency))
}

/// Parses a stored enum label with its `FromStr` impl
pub(crate) fn parse_label<T>(label: &str) -> Result<T, DatabaseError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    label.parse().map_err(DatabaseError::serialization)
}

pub(crate) fn port_err(e: impl Into<DatabaseError>) -> PortError {
    e.into().into()
}
