//! Request and response bodies

pub mod auth;
pub mod auction;
pub mod basket;
pub mod checkout;
pub mod contract;
pub mod tracking;
