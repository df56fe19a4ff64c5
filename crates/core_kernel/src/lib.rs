//! Core Kernel - Foundational types shared by every marketplace domain
//!
//! This crate provides the building blocks used across all domain modules:
//! - Money and rates with precise decimal arithmetic
//! - Date ranges and countdowns for rentals and auctions
//! - Strongly-typed identifiers
//! - Port abstractions for the hexagonal architecture

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod error;
pub mod ports;

pub use money::{Money, Currency, MoneyError, Rate};
pub use temporal::{DateRange, TimeLeft, TemporalError};
pub use identifiers::{
    UserId, ProductId, BidId, CategoryId, ConditionId, TagId, ImageId,
    BasketId, BasketItemId, OrderId, OrderSummaryId, OrderHistoryId,
    TrackedOrderId, CheckpointId, ContractId, PredefinedContractId, PdfId,
    ReviewId, ConversationId, MessageId, NotificationId, LinkageId, WaitlistEntryId,
};
pub use error::{CoreError, ensure_id};
pub use ports::{
    PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth,
    OperationMetadata, Pagination,
};
