//! Catalog domain errors

use core_kernel::{CoreError, Money, MoneyError, PortError};
use domain_account::AccountError;
use thiserror::Error;

/// Reasons a bid is refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BidError {
    #[error("Cannot place bid on an unsaved auction")]
    UnsavedAuction,

    #[error("Cannot bid with an unsaved user profile")]
    UnknownBidder,

    #[error("You cannot bid on your own auction")]
    OwnAuction,

    #[error("Auction already ended")]
    AuctionEnded,

    #[error("Auction has not started yet")]
    NotStarted,

    #[error("Bid must be at least {0}")]
    BelowMinimum(Money),

    #[error("Insufficient balance")]
    InsufficientBalance,

    #[error("Bid amount is required")]
    EmptyAmount,

    #[error("Invalid bid format")]
    InvalidFormat,

    #[error("Bid amount must be positive")]
    NotPositive,

    /// Storage refused the bid after the wallet was debited; the debit is refunded
    #[error("Server rejected the bid: {0}")]
    Rejected(String),
}

/// Errors that can occur in the catalog domain
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A listing or form field failed validation
    #[error("{message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },

    #[error(transparent)]
    Bid(#[from] BidError),

    /// The auction cannot be concluded yet
    #[error("Auction has not ended yet")]
    AuctionStillRunning,

    #[error("User is already in the waitlist for this product")]
    AlreadyWaitlisted,

    #[error("Product {0} is not currently borrowed")]
    NotBorrowed(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Money(#[from] MoneyError),

    #[error(transparent)]
    Account(#[from] AccountError),

    #[error(transparent)]
    Port(#[from] PortError),
}

impl CatalogError {
    pub fn invalid_field(field: &'static str, message: impl Into<String>) -> Self {
        CatalogError::InvalidField {
            field,
            message: message.into(),
        }
    }

    /// Field name for form errors
    pub fn field(&self) -> Option<&'static str> {
        match self {
            CatalogError::InvalidField { field, .. } => Some(field),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            CatalogError::Port(e) => e.is_not_found(),
            CatalogError::Account(e) => e.is_not_found(),
            _ => false,
        }
    }
}
