//! Messaging domain errors

use core_kernel::{CoreError, PortError};
use domain_account::AccountError;
use domain_basket::BasketError;
use domain_order::OrderError;
use domain_review::ReviewError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("Content cannot be null or empty.")]
    EmptyContent,

    #[error("Chat option {0} is not available here")]
    UnknownOption(u32),

    /// The bot responder could not produce an answer
    #[error("Responder failed: {0}")]
    Responder(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Account(#[from] AccountError),

    #[error(transparent)]
    Basket(#[from] BasketError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Review(#[from] ReviewError),

    #[error(transparent)]
    Port(#[from] PortError),
}
