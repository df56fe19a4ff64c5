//! Tests for core_kernel error types

use core_kernel::error::{ensure_id, CoreError};
use core_kernel::money::MoneyError;
use core_kernel::temporal::TemporalError;
use core_kernel::{ProductId, UserId};

#[test]
fn test_core_error_validation_displays_message_verbatim() {
    let error = CoreError::validation("Quantity cannot be negative");
    assert_eq!(error.to_string(), "Quantity cannot be negative");
}

#[test]
fn test_core_error_invalid_state() {
    let error = CoreError::invalid_state("Cannot revert further");

    match error {
        CoreError::InvalidStateTransition(msg) => assert!(msg.contains("Cannot revert")),
        _ => panic!("Expected InvalidStateTransition error"),
    }
}

#[test]
fn test_core_error_from_money_error() {
    let money_error = MoneyError::CurrencyMismatch("USD".to_string(), "EUR".to_string());
    let core_error: CoreError = money_error.into();

    assert!(matches!(core_error, CoreError::Money(_)));
}

#[test]
fn test_core_error_from_temporal_error() {
    let temporal = TemporalError::NotInFuture("2020-01-01".to_string());
    let core_error: CoreError = temporal.into();

    assert!(matches!(core_error, CoreError::Temporal(_)));
}

#[test]
fn test_ensure_id_accepts_real_ids() {
    assert!(ensure_id(UserId::new().is_nil(), "user").is_ok());
    assert!(ensure_id(ProductId::new_v7().is_nil(), "product").is_ok());
}

#[test]
fn test_ensure_id_names_the_rejected_kind() {
    let error = ensure_id(ProductId::nil().is_nil(), "product").unwrap_err();

    assert!(matches!(error, CoreError::InvalidIdentifier("product")));
    assert_eq!(error.to_string(), "Invalid product ID");
}
