//! Rental listings charged per day

use chrono::{DateTime, Duration, Utc};
use core_kernel::{DateRange, Money, UserId};
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::product::{Listed, ListingCore, ListingKind};

/// Default rental window when dates are missing or inconsistent
pub const DEFAULT_BORROW_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorrowProduct {
    #[serde(flatten)]
    pub core: ListingCore,
    pub daily_rate: Money,
    /// Latest date the product may be kept until
    pub time_limit: Option<DateTime<Utc>>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_borrowed: bool,
    pub borrower_id: Option<UserId>,
}

impl BorrowProduct {
    pub fn new(core: ListingCore, daily_rate: Money) -> Self {
        Self {
            core,
            daily_rate,
            time_limit: None,
            start_date: None,
            end_date: None,
            is_borrowed: false,
            borrower_id: None,
        }
    }

    /// Every validation failure, keyed by field
    pub fn validation_errors(&self) -> Vec<(&'static str, &'static str)> {
        let mut errors = Vec::new();
        if self.core.title.trim().is_empty() {
            errors.push(("title", "Title is required"));
        }
        if self.core.seller_id.is_nil() {
            errors.push(("seller_id", "Valid seller ID is required"));
        }
        if self.daily_rate.is_negative() {
            errors.push(("daily_rate", "Daily rate cannot be negative"));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                errors.push(("end_date", "End date cannot be before start date"));
            }
        }
        errors
    }

    /// Fails with the first validation error
    pub fn validate(&self) -> Result<(), CatalogError> {
        match self.validation_errors().first() {
            Some((field, message)) => Err(CatalogError::invalid_field(*field, *message)),
            None => Ok(()),
        }
    }

    /// Fills in missing dates before the listing is stored
    pub fn apply_creation_defaults(&mut self, now: DateTime<Utc>) {
        let default_window = Duration::days(DEFAULT_BORROW_DAYS);
        let start = *self.start_date.get_or_insert(now);
        let end = *self.end_date.get_or_insert(now + default_window);
        self.time_limit.get_or_insert(now + default_window);
        if end < start {
            self.end_date = Some(start + default_window);
        }
    }

    /// Rental period, falling back to the default window
    pub fn rental_period(&self, now: DateTime<Utc>) -> DateRange {
        let start = self.start_date.unwrap_or(now);
        match self.end_date {
            Some(end) if end >= start => DateRange { start, end },
            _ => DateRange::days_from(start, DEFAULT_BORROW_DAYS),
        }
    }

    /// Marks the product as borrowed by a user
    pub fn lend_to(&mut self, borrower_id: UserId) {
        self.is_borrowed = true;
        self.borrower_id = Some(borrower_id);
    }

    /// Marks the product as returned
    pub fn mark_returned(&mut self) {
        self.is_borrowed = false;
        self.borrower_id = None;
    }
}

impl Listed for BorrowProduct {
    fn core(&self) -> &ListingCore {
        &self.core
    }

    fn kind(&self) -> ListingKind {
        ListingKind::Borrow
    }

    fn listed_price(&self) -> Money {
        self.daily_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn product() -> BorrowProduct {
        BorrowProduct::new(
            ListingCore::new("Camping tent", "Four person", UserId::new()),
            Money::usd(dec!(3.50)),
        )
    }

    #[test]
    fn test_defaults_fill_missing_dates() {
        let now = Utc::now();
        let mut p = product();
        p.apply_creation_defaults(now);
        assert_eq!(p.start_date, Some(now));
        assert_eq!(p.end_date, Some(now + Duration::days(7)));
        assert_eq!(p.time_limit, Some(now + Duration::days(7)));
    }

    #[test]
    fn test_end_before_start_is_pushed_out() {
        let now = Utc::now();
        let mut p = product();
        p.start_date = Some(now + Duration::days(10));
        p.end_date = Some(now);
        assert_eq!(
            p.validate().unwrap_err().to_string(),
            "End date cannot be before start date"
        );

        p.apply_creation_defaults(now);
        assert_eq!(p.end_date, Some(now + Duration::days(17)));
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut p = product();
        p.core.title.clear();
        p.daily_rate = Money::usd(dec!(-1));
        let fields: Vec<_> = p.validation_errors().into_iter().map(|(f, _)| f).collect();
        assert_eq!(fields, vec!["title", "daily_rate"]);
    }
}
