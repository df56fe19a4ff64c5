//! Basket Domain
//!
//! Per-buyer baskets with clamped quantities, promo codes and the totals a
//! checkout starts from.

pub mod basket;
pub mod promo;
pub mod error;
pub mod ports;
pub mod services;

pub use basket::{
    checked_quantity, limited_quantity, parse_quantity, Basket, BasketItem, BasketTotals, ProductType,
    MAXIMUM_QUANTITY_PER_ITEM,
};
pub use error::BasketError;
pub use ports::{BasketPort, BasketPortExt};
pub use services::{product_type_of, BasketService};

#[cfg(any(test, feature = "mock"))]
pub use ports::mock::MockBasketPort;
