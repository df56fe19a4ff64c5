//! Account domain errors

use core_kernel::{CoreError, MoneyError, PortError};
use thiserror::Error;

/// Errors that can occur in the account domain
#[derive(Debug, Error)]
pub enum AccountError {
    /// A registration or profile field failed validation
    #[error("{message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },

    /// The username is already taken
    #[error("Username already exists.")]
    UsernameTaken,

    /// The email is already registered
    #[error("Email is already in use.")]
    EmailTaken,

    /// A login attempt was refused; the message is shown to the user as is
    #[error("{0}")]
    LoginRejected(String),

    /// The user has no buyer profile
    #[error("User {0} is not a buyer")]
    NotABuyer(String),

    /// The user has no seller profile
    #[error("User {0} is not a seller")]
    NotASeller(String),

    /// A wallet debit exceeded the available balance
    #[error("Insufficient balance")]
    InsufficientBalance,

    /// A linkage operation is not valid in the linkage's current state
    #[error("Invalid linkage transition from {from} to {to}")]
    InvalidLinkageTransition {
        from: String,
        to: String,
    },

    /// A generic validation failure
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Money(#[from] MoneyError),

    /// Failure reported by the storage port
    #[error(transparent)]
    Port(#[from] PortError),
}

impl AccountError {
    /// Creates an InvalidField error
    pub fn invalid_field(field: &'static str, message: impl Into<String>) -> Self {
        AccountError::InvalidField {
            field,
            message: message.into(),
        }
    }

    pub fn login_rejected(message: impl Into<String>) -> Self {
        AccountError::LoginRejected(message.into())
    }

    /// Returns true when the underlying cause is a missing entity
    pub fn is_not_found(&self) -> bool {
        matches!(self, AccountError::Port(e) if e.is_not_found())
    }
}
