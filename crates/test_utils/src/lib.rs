//! Test Utilities Crate
//!
//! Shared test infrastructure, fixtures, and helpers for the MarketMinds
//! test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built test data for common entities
//! - `builders`: Builder patterns for users, listings, baskets and contracts
//! - `database`: Postgres test containers with the marketplace schema
//! - `assertions`: Custom assertion helpers for domain types
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;
