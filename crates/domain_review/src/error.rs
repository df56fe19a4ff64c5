//! Review domain errors

use core_kernel::{CoreError, PortError};
use domain_account::AccountError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("Review description cannot be null or empty.")]
    BlankDescription,

    #[error("Review not found.")]
    ReviewNotFound,

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Account(#[from] AccountError),

    #[error(transparent)]
    Port(#[from] PortError),
}
