//! Core error types used across the system

use thiserror::Error;
use crate::money::MoneyError;
use crate::temporal::TemporalError;

/// Core error type for the kernel
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    #[error("Temporal error: {0}")]
    Temporal(#[from] TemporalError),

    #[error("Invalid {0} ID")]
    InvalidIdentifier(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::Validation(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        CoreError::InvalidStateTransition(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        CoreError::NotFound(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        CoreError::Configuration(message.into())
    }
}

/// Rejects nil identifiers, naming the kind of id in the error
///
/// ```
/// use core_kernel::{UserId, error::ensure_id};
///
/// assert!(ensure_id(UserId::new().is_nil(), "user").is_ok());
/// assert_eq!(
///     ensure_id(UserId::nil().is_nil(), "user").unwrap_err().to_string(),
///     "Invalid user ID"
/// );
/// ```
pub fn ensure_id(is_nil: bool, kind: &'static str) -> Result<(), CoreError> {
    if is_nil {
        Err(CoreError::InvalidIdentifier(kind))
    } else {
        Ok(())
    }
}
