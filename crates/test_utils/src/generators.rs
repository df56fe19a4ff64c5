//! Property-Based Test Generators
//!
//! Proptest strategies for marketplace values that keep domain invariants.

use chrono::{DateTime, Duration, TimeZone, Utc};
use core_kernel::{Currency, DateRange, Money, ProductId, UserId};
use domain_basket::{Basket, BasketItem, ProductType};
use proptest::prelude::*;
use rust_decimal::Decimal;

pub fn currency_strategy() -> impl Strategy<Value = Currency> {
    prop_oneof![
        Just(Currency::USD),
        Just(Currency::EUR),
        Just(Currency::GBP),
        Just(Currency::RON),
    ]
}

/// Positive amounts in minor units, up to ten million
pub fn positive_amount_minor_strategy() -> impl Strategy<Value = i64> {
    1i64..1_000_000_000i64
}

pub fn positive_money_strategy() -> impl Strategy<Value = Money> {
    (positive_amount_minor_strategy(), currency_strategy())
        .prop_map(|(amount, currency)| Money::from_minor(amount, currency))
}

pub fn usd_money_strategy() -> impl Strategy<Value = Money> {
    positive_amount_minor_strategy().prop_map(|amount| Money::from_minor(amount, Currency::USD))
}

/// Listing prices between 0.01 and 10,000.00
pub fn price_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Quantities including values above the per-item cap
pub fn quantity_strategy() -> impl Strategy<Value = u32> {
    0u32..50u32
}

/// Percentages from 0.00 to 100.00
pub fn percentage_strategy() -> impl Strategy<Value = Decimal> {
    (0u32..=10000u32).prop_map(|n| Decimal::new(n as i64, 2))
}

/// Ratings, sometimes outside the 0..=5 scale
pub fn rating_strategy() -> impl Strategy<Value = Decimal> {
    (-20i64..80i64).prop_map(|tenths| Decimal::new(tenths, 1))
}

/// Bid text as a buyer might type it
pub fn bid_text_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        price_strategy().prop_map(|d| d.to_string()),
        price_strategy().prop_map(|d| format!("  {}  ", d)),
        "[a-z]{1,8}",
        Just(String::new()),
        Just("-5".to_string()),
    ]
}

pub fn product_type_strategy() -> impl Strategy<Value = ProductType> {
    prop_oneof![
        Just(ProductType::New),
        Just(ProductType::Used),
        Just(ProductType::Borrowed),
        Just(ProductType::Refill),
        Just(ProductType::Bid),
    ]
}

pub fn basket_item_strategy() -> impl Strategy<Value = BasketItem> {
    (price_strategy(), 1u32..12u32, product_type_strategy(), "[A-Z][a-z]{3,10}").prop_map(
        |(price, quantity, product_type, title)| {
            BasketItem::new(
                ProductId::new_v7(),
                UserId::new_v7(),
                title,
                Money::usd(price),
                quantity,
                product_type,
            )
        },
    )
}

/// Baskets of one to eight distinct lines
pub fn basket_strategy() -> impl Strategy<Value = Basket> {
    proptest::collection::vec(basket_item_strategy(), 1..8).prop_map(|items| {
        let mut basket = Basket::new(UserId::new_v7());
        for item in items {
            basket.add_item(item);
        }
        basket
    })
}

pub fn promo_code_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("DISCOUNT10".to_string())),
        Just(Some("welcome20".to_string())),
        Just(Some(" FLASH30 ".to_string())),
        "[A-Z0-9]{4,10}".prop_map(Some),
    ]
}

/// Instants during 2025
pub fn timestamp_2025_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..365 * 24).prop_map(|hours| Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Duration::hours(hours))
}

/// Ordered (start, end) pairs up to two years apart
pub fn time_range_strategy() -> impl Strategy<Value = (DateTime<Utc>, DateTime<Utc>)> {
    (timestamp_2025_strategy(), 0i64..730i64).prop_map(|(start, days)| (start, start + Duration::days(days)))
}

pub fn date_range_strategy() -> impl Strategy<Value = DateRange> {
    time_range_strategy().prop_map(|(start, end)| DateRange::new(start, end).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_basket::MAXIMUM_QUANTITY_PER_ITEM;

    proptest! {
        #[test]
        fn prop_positive_money_is_positive(money in positive_money_strategy()) {
            prop_assert!(money.is_positive());
        }

        #[test]
        fn prop_time_ranges_are_ordered((start, end) in time_range_strategy()) {
            prop_assert!(start <= end);
        }

        #[test]
        fn prop_basket_lines_respect_the_cap(basket in basket_strategy()) {
            prop_assert!(!basket.is_empty());
            prop_assert!(basket.items.iter().all(|i| i.quantity >= 1 && i.quantity <= MAXIMUM_QUANTITY_PER_ITEM));
        }

        #[test]
        fn prop_date_ranges_span_at_least_one_month(range in date_range_strategy()) {
            prop_assert!(range.months_spanned() >= 1);
        }
    }
}
