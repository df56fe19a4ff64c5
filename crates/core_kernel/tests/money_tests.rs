//! Unit tests for Money and Rate
//!
//! Covers creation, arithmetic, comparisons and the rate applications used
//! by basket discounts and the warranty tax.

use core_kernel::{Currency, Money, MoneyError, Rate};
use rust_decimal_macros::dec;

mod creation {
    use super::*;

    #[test]
    fn test_new_rounds_to_four_decimal_places() {
        let m = Money::new(dec!(100.123456789), Currency::USD);
        assert_eq!(m.amount(), dec!(100.1235));
    }

    #[test]
    fn test_usd_defaults_currency() {
        assert_eq!(Money::usd(dec!(1)).currency(), Currency::USD);
        assert_eq!(Currency::default(), Currency::USD);
    }

    #[test]
    fn test_from_minor_converts_cents() {
        assert_eq!(Money::from_minor(1399, Currency::USD).amount(), dec!(13.99));
    }
}

mod predicates {
    use super::*;

    #[test]
    fn test_zero_is_neither_positive_nor_negative() {
        let zero = Money::zero(Currency::USD);
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());
    }

    #[test]
    fn test_sign_predicates() {
        assert!(Money::usd(dec!(0.01)).is_positive());
        assert!(Money::usd(dec!(-0.01)).is_negative());
    }
}

mod arithmetic {
    use super::*;

    #[test]
    fn test_checked_sub_allows_negative_result() {
        let balance = Money::usd(dec!(10));
        let bid = Money::usd(dec!(25));
        assert_eq!(balance.checked_sub(&bid).unwrap().amount(), dec!(-15));
    }

    #[test]
    fn test_checked_max_picks_larger() {
        let a = Money::usd(dec!(10));
        let b = Money::usd(dec!(12.5));
        assert_eq!(a.checked_max(b).unwrap(), b);
        assert_eq!(b.checked_max(a).unwrap(), b);
    }

    #[test]
    fn test_checked_max_rejects_mixed_currency() {
        let a = Money::usd(dec!(10));
        let b = Money::new(dec!(10), Currency::RON);
        assert!(matches!(a.checked_max(b), Err(MoneyError::CurrencyMismatch(_, _))));
    }

    #[test]
    fn test_sum_of_empty_is_zero() {
        let total = Money::sum(Currency::USD, &[]).unwrap();
        assert!(total.is_zero());
    }

    #[test]
    fn test_round_to_currency() {
        let m = Money::usd(dec!(10.005));
        assert_eq!(m.round_to_currency().amount(), dec!(10.00));
    }
}

mod rates {
    use super::*;

    #[test]
    fn test_promo_rate_discount() {
        let rate = Rate::new(dec!(0.30));
        let subtotal = Money::usd(dec!(80));
        assert_eq!(rate.apply(&subtotal).amount(), dec!(24));
        assert_eq!(rate.as_percentage(), dec!(30));
    }

    #[test]
    fn test_zero_rate() {
        assert!(Rate::zero().apply(&Money::usd(dec!(99))).is_zero());
    }
}
