//! Basket domain errors

use core_kernel::{CoreError, MoneyError, PortError};
use domain_catalog::CatalogError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BasketError {
    #[error("Quantity cannot be negative")]
    NegativeQuantity,

    #[error("Please enter a valid quantity")]
    InvalidQuantityText,

    #[error("Item not found in basket")]
    ItemNotFound,

    #[error("Promo code cannot be empty")]
    EmptyPromoCode,

    #[error("Invalid promo code")]
    InvalidPromoCode,

    #[error("{title} is out of stock")]
    OutOfStock { title: String },

    #[error("Only {available} of {title} left in stock")]
    InsufficientStock { title: String, available: u32 },

    /// The basket cannot be checked out as it is
    #[error("Basket validation failed: {0}")]
    NotCheckoutReady(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Money(#[from] MoneyError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Port(#[from] PortError),
}
