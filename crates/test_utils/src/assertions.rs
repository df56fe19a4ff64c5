//! Custom Test Assertions
//!
//! Assertion helpers for domain types that fail with a readable message.

use chrono::{DateTime, Utc};
use core_kernel::{DateRange, Money, UserId};
use domain_basket::{Basket, BasketTotals};
use domain_catalog::AuctionProduct;
use domain_contract::{Contract, ContractStatus};
use rust_decimal::Decimal;

/// Asserts two amounts match in currency and differ by at most `tolerance`
pub fn assert_money_approx_eq(actual: &Money, expected: &Money, tolerance: Decimal) {
    assert_eq!(
        actual.currency(),
        expected.currency(),
        "Currency mismatch: actual={}, expected={}",
        actual.currency(),
        expected.currency()
    );

    let diff = (actual.amount() - expected.amount()).abs();
    assert!(
        diff <= tolerance,
        "Money amounts differ by more than tolerance: actual={}, expected={}, diff={}, tolerance={}",
        actual.amount(),
        expected.amount(),
        diff,
        tolerance
    );
}

/// Asserts an amount equals `expected` once rounded to the currency
pub fn assert_money_eq(actual: &Money, expected: Decimal) {
    assert_eq!(
        actual.round_to_currency().amount(),
        expected,
        "Expected {} {}, got {}",
        actual.currency().code(),
        expected,
        actual.amount()
    );
}

pub fn assert_money_positive(money: &Money) {
    assert!(
        money.is_positive(),
        "Expected positive money, got {} {}",
        money.currency().symbol(),
        money.amount()
    );
}

pub fn assert_money_zero(money: &Money) {
    assert!(
        money.is_zero(),
        "Expected zero money, got {} {}",
        money.currency().symbol(),
        money.amount()
    );
}

/// Asserts that money values sum to a total
///
/// # Panics
///
/// Panics on a currency mismatch or when the sum differs from the total
pub fn assert_money_sum_equals(parts: &[Money], total: &Money) {
    let sum = Money::sum(total.currency(), parts.iter()).expect("Currency mismatch in sum");
    assert_eq!(
        sum.amount(),
        total.amount(),
        "Sum of parts ({}) doesn't equal total ({})",
        sum.amount(),
        total.amount()
    );
}

/// Asserts subtotal minus discount equals total
pub fn assert_totals_consistent(totals: &BasketTotals) {
    assert_eq!(
        totals.subtotal.amount() - totals.discount.amount(),
        totals.total.amount(),
        "Totals inconsistent: {} - {} != {}",
        totals.subtotal.amount(),
        totals.discount.amount(),
        totals.total.amount()
    );
    assert!(
        !totals.total.is_negative(),
        "Total {} is negative",
        totals.total.amount()
    );
}

/// Asserts a basket holds `expected` units of the line titled `title`
pub fn assert_basket_has(basket: &Basket, title: &str, expected: u32) {
    let line = basket.items.iter().find(|i| i.title == title);
    match line {
        Some(item) => assert_eq!(
            item.quantity, expected,
            "Line '{}' has quantity {}, expected {}",
            title, item.quantity, expected
        ),
        None => panic!(
            "Basket has no line '{}'; lines: {:?}",
            title,
            basket.items.iter().map(|i| i.title.as_str()).collect::<Vec<_>>()
        ),
    }
}

/// Asserts the auction's price and leading bid agree
pub fn assert_auction_led_by(auction: &AuctionProduct, bidder: UserId, price: Decimal) {
    let leader = auction
        .highest_bid()
        .unwrap_or_else(|| panic!("Auction {} has no bids", auction.core.id));
    assert_eq!(leader.bidder_id, bidder, "Auction led by {}, expected {}", leader.bidder_id, bidder);
    assert_eq!(
        auction.current_price.amount(),
        price,
        "Auction price {}, expected {}",
        auction.current_price.amount(),
        price
    );
}

pub fn assert_contract_status(contract: &Contract, expected: ContractStatus) {
    assert_eq!(
        contract.status, expected,
        "Contract {} is {}, expected {}",
        contract.id, contract.status, expected
    );
}

pub fn assert_range_contains(range: &DateRange, instant: DateTime<Utc>) {
    assert!(
        range.contains(instant),
        "Range {:?} does not contain {}",
        range,
        instant
    );
}

pub fn assert_decimal_in_range(value: Decimal, min: Decimal, max: Decimal) {
    assert!(
        value >= min && value <= max,
        "Decimal {} is not in range [{}, {}]",
        value,
        min,
        max
    );
}

/// Asserts that a result is Ok and returns the value
#[macro_export]
macro_rules! assert_ok {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
    ($result:expr, $msg:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("{}: {:?}", $msg, e),
        }
    };
}

/// Asserts that a result is Err and returns the error
#[macro_export]
macro_rules! assert_err {
    ($result:expr) => {
        match $result {
            Ok(value) => panic!("Expected Err, got Ok: {:?}", value),
            Err(e) => e,
        }
    };
}

/// Asserts that an error matches a specific variant
#[macro_export]
macro_rules! assert_err_variant {
    ($result:expr, $pattern:pat) => {
        match $result {
            Ok(value) => panic!("Expected Err matching {}, got Ok({:?})", stringify!($pattern), value),
            Err(ref e) => {
                assert!(
                    matches!(e, $pattern),
                    "Error {:?} does not match pattern {}",
                    e,
                    stringify!($pattern)
                );
            }
        }
    };
}
