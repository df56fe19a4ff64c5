//! Contract domain errors

use core_kernel::{CoreError, PortError};
use domain_account::AccountError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContractError {
    #[error("Invalid {field}: {message}")]
    InvalidField { field: &'static str, message: String },

    #[error("Only active contracts can be renewed (status: {0})")]
    NotActive(String),

    #[error("This contract has already been renewed.")]
    AlreadyRenewed,

    #[error("New end date must be after the current end date.")]
    EndDateNotAfter,

    #[error("Renewal not allowed: seller limit exceeded.")]
    RenewalLimitExceeded,

    #[error("Contract document is not a PDF")]
    InvalidDocument,

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Account(#[from] AccountError),

    #[error(transparent)]
    Port(#[from] PortError),
}

impl ContractError {
    pub fn invalid_field(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ContractError::Port(e) if e.is_not_found())
    }
}
