//! Order domain errors

use core_kernel::{CoreError, MoneyError, PortError};
use domain_account::AccountError;
use domain_basket::BasketError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Invalid {field}: {message}")]
    InvalidField { field: &'static str, message: String },

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Unknown order status: {0}")]
    UnknownStatus(String),

    #[error("Unknown time period: {0}")]
    UnknownPeriod(String),

    #[error("Cannot revert further. Only one checkpoint exists.")]
    CannotRevert,

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Money(#[from] MoneyError),

    #[error(transparent)]
    Account(#[from] AccountError),

    #[error(transparent)]
    Basket(#[from] BasketError),

    #[error(transparent)]
    Port(#[from] PortError),
}

impl OrderError {
    pub fn invalid_field(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            OrderError::Port(e) => e.is_not_found(),
            OrderError::Account(e) => e.is_not_found(),
            OrderError::Core(CoreError::NotFound(_)) => true,
            _ => false,
        }
    }
}
