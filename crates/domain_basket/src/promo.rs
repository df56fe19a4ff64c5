//! Promo codes
//!
//! Codes are matched after trimming and upper-casing, so " welcome20 " is
//! the same code as "WELCOME20".

use core_kernel::{Money, Rate};
use rust_decimal_macros::dec;

use crate::error::BasketError;

const PROMO_CODES: [(&str, rust_decimal::Decimal); 3] = [
    ("DISCOUNT10", dec!(10)),
    ("WELCOME20", dec!(20)),
    ("FLASH30", dec!(30)),
];

pub fn normalize(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Discount rate of a promo code
pub fn discount_rate(code: &str) -> Result<Rate, BasketError> {
    let code = normalize(code);
    if code.is_empty() {
        return Err(BasketError::EmptyPromoCode);
    }
    PROMO_CODES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, percent)| Rate::from_percentage(*percent))
        .ok_or(BasketError::InvalidPromoCode)
}

/// Discount a code gives on a subtotal; unknown or blank codes give none
pub fn discount_for(code: Option<&str>, subtotal: &Money) -> Money {
    match code.map(discount_rate) {
        Some(Ok(rate)) => rate.apply(subtotal),
        _ => Money::zero(subtotal.currency()),
    }
}
