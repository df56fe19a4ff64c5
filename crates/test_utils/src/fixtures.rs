//! Pre-built Test Fixtures
//!
//! Predictable data for unit tests: amounts, dates, identifiers and the
//! strings a registration form expects.

use chrono::{DateTime, TimeZone, Utc};
use core_kernel::{
    Currency, DateRange, Money, OrderId, ProductId, Rate, UserId,
};
use domain_account::{hash_password, RegistrationRequest, UserRole};
use domain_order::ContactDetails;
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use once_cell::sync::Lazy;
use rust_decimal_macros::dec;
use uuid::Uuid;

/// Password every fixture user registers with
pub const TEST_PASSWORD: &str = "Passw0rd!";

/// Stored hash of [`TEST_PASSWORD`]
pub static TEST_PASSWORD_HASH: Lazy<String> = Lazy::new(|| hash_password(TEST_PASSWORD));

pub struct MoneyFixtures;

impl MoneyFixtures {
    pub fn usd_100() -> Money {
        Money::usd(dec!(100.00))
    }

    /// Typical price of a fixed-price listing
    pub fn listing_price() -> Money {
        Money::usd(dec!(45.50))
    }

    /// Daily rate of a borrow listing
    pub fn daily_rate() -> Money {
        Money::usd(dec!(12.00))
    }

    /// Opening price of an auction
    pub fn auction_start() -> Money {
        Money::usd(dec!(100.00))
    }

    /// Wallet balance large enough for most flows
    pub fn wallet() -> Money {
        Money::usd(dec!(500.00))
    }

    /// Subtotal at which delivery becomes free
    pub fn free_delivery_threshold() -> Money {
        Money::usd(dec!(200.00))
    }

    pub fn delivery_fee() -> Money {
        Money::usd(dec!(13.99))
    }

    pub fn usd_zero() -> Money {
        Money::zero(Currency::USD)
    }

    /// For currency mismatch tests
    pub fn eur_100() -> Money {
        Money::new(dec!(100.00), Currency::EUR)
    }

    pub fn ron_100() -> Money {
        Money::new(dec!(100.00), Currency::RON)
    }

    pub fn usd_refund() -> Money {
        Money::usd(dec!(-50.00))
    }
}

pub struct RateFixtures;

impl RateFixtures {
    /// WELCOME20
    pub fn welcome_discount() -> Rate {
        Rate::from_percentage(dec!(20))
    }

    /// Gold badge discount
    pub fn gold_discount() -> Rate {
        Rate::from_percentage(dec!(10))
    }
}

pub struct TemporalFixtures;

impl TemporalFixtures {
    /// Fixed "now" for deterministic tests (1 March 2025, noon)
    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    pub fn contract_start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    pub fn contract_end() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 59).unwrap()
    }

    /// Borrow period from 15 November to 1 February, spanning three months
    pub fn three_month_borrow() -> DateRange {
        DateRange::new(
            Utc.with_ymd_and_hms(2024, 11, 15, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap(),
        )
        .unwrap()
    }

    /// Auction window around [`Self::now`]: opened a day ago, closes in two
    pub fn running_auction_window() -> (DateTime<Utc>, DateTime<Utc>) {
        let now = Self::now();
        (now - chrono::Duration::days(1), now + chrono::Duration::days(2))
    }

    /// Auction window entirely before [`Self::now`]
    pub fn ended_auction_window() -> (DateTime<Utc>, DateTime<Utc>) {
        let now = Self::now();
        (now - chrono::Duration::days(5), now - chrono::Duration::hours(1))
    }
}

/// Deterministic identifiers
pub struct IdFixtures;

impl IdFixtures {
    pub fn buyer_id() -> UserId {
        UserId::from_uuid(Uuid::from_u128(0x550e8400_e29b_41d4_a716_446655440001))
    }

    pub fn seller_id() -> UserId {
        UserId::from_uuid(Uuid::from_u128(0x550e8400_e29b_41d4_a716_446655440002))
    }

    pub fn product_id() -> ProductId {
        ProductId::from_uuid(Uuid::from_u128(0x550e8400_e29b_41d4_a716_446655440003))
    }

    pub fn order_id() -> OrderId {
        OrderId::from_uuid(Uuid::from_u128(0x550e8400_e29b_41d4_a716_446655440004))
    }
}

pub struct StringFixtures;

impl StringFixtures {
    pub fn phone() -> &'static str {
        "+40712345678"
    }

    pub fn address() -> &'static str {
        "Str. Memorandumului 28, Cluj-Napoca"
    }

    pub fn postal_code() -> &'static str {
        "400114"
    }

    pub fn promo_code() -> &'static str {
        "WELCOME20"
    }
}

pub struct RegistrationFixtures;

impl RegistrationFixtures {
    /// A registration that passes every validation rule
    pub fn valid(username: &str, role: UserRole) -> RegistrationRequest {
        RegistrationRequest {
            username: username.to_string(),
            email: format!("{}@market.ro", username),
            password: TEST_PASSWORD.to_string(),
            phone: StringFixtures::phone().to_string(),
            role,
        }
    }

    /// A valid registration with a generated, unique username
    pub fn random(role: UserRole) -> RegistrationRequest {
        let first: String = FirstName().fake();
        let suffix: u32 = (1000..9999u32).fake();
        let stem: String = first.chars().filter(char::is_ascii_alphanumeric).collect();
        Self::valid(&format!("{}_{}", stem.to_lowercase(), suffix), role)
    }
}

pub struct ContactFixtures;

impl ContactFixtures {
    pub fn buyer_contact() -> ContactDetails {
        let first: String = FirstName().fake();
        let last: String = LastName().fake();
        ContactDetails {
            full_name: format!("{} {}", first, last),
            email: "buyer@market.ro".to_string(),
            phone: StringFixtures::phone().to_string(),
            address: StringFixtures::address().to_string(),
            postal_code: StringFixtures::postal_code().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_account::{verify_password, UserValidator};

    #[test]
    fn test_password_hash_matches_password() {
        assert!(verify_password(TEST_PASSWORD, &TEST_PASSWORD_HASH));
    }

    #[test]
    fn test_random_registration_is_valid() {
        let request = RegistrationFixtures::random(UserRole::Buyer);
        assert!(UserValidator::is_valid_username(&request.username));
        assert!(UserValidator::is_valid_email(&request.email));
        assert!(UserValidator::is_valid_phone(&request.phone));
        assert!(UserValidator::is_valid_password(&request.password));
    }

    #[test]
    fn test_auction_windows_surround_now() {
        let now = TemporalFixtures::now();
        let (start, end) = TemporalFixtures::running_auction_window();
        assert!(start < now && now < end);
        let (_, ended) = TemporalFixtures::ended_auction_window();
        assert!(ended < now);
    }

    #[test]
    fn test_borrow_fixture_spans_three_months() {
        assert_eq!(TemporalFixtures::three_month_borrow().months_spanned(), 3);
    }
}
