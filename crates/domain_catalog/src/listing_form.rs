//! Validation of the "create listing" form
//!
//! The form is checked top to bottom and the first failure is reported
//! together with the field it belongs to, so the caller can highlight it.

use chrono::{DateTime, Utc};
use core_kernel::{CategoryId, ConditionId, Money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::CatalogError;

/// Kind-specific part of the form, with numbers still as typed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ListingFormDetails {
    Buy {
        price: String,
    },
    Borrow {
        daily_rate: String,
        time_limit: Option<DateTime<Utc>>,
    },
    Auction {
        starting_price: String,
        end_date: Option<DateTime<Utc>>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingForm {
    pub title: String,
    pub category_id: Option<CategoryId>,
    pub description: String,
    pub tags: Vec<String>,
    pub condition_id: Option<ConditionId>,
    pub details: ListingFormDetails,
}

/// Numbers parsed out of a valid form
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValidatedDetails {
    Buy { price: Money },
    Borrow { daily_rate: Money, time_limit: DateTime<Utc> },
    Auction { starting_price: Money, end_date: DateTime<Utc> },
}

impl ListingForm {
    /// Checks the fields shared by every listing kind
    pub fn validate_common(&self) -> Result<(), CatalogError> {
        if self.title.trim().is_empty() {
            return Err(CatalogError::invalid_field("Title", "Title cannot be empty."));
        }
        if self.category_id.is_none() {
            return Err(CatalogError::invalid_field("Category", "Please select a category."));
        }
        if self.description.trim().is_empty() {
            return Err(CatalogError::invalid_field("Description", "Description cannot be empty."));
        }
        if self.tags.iter().all(|t| t.trim().is_empty()) {
            return Err(CatalogError::invalid_field("Tags", "Please add at least one tag."));
        }
        if self.condition_id.is_none() {
            return Err(CatalogError::invalid_field("Condition", "Please select a condition."));
        }
        Ok(())
    }

    /// Validates the whole form, returning the parsed numbers
    pub fn validate(&self, now: DateTime<Utc>) -> Result<ValidatedDetails, CatalogError> {
        self.validate_common()?;

        match &self.details {
            ListingFormDetails::Buy { price } => {
                let price = parse_amount(price)
                    .filter(|p| !p.is_sign_negative())
                    .ok_or_else(|| CatalogError::invalid_field("Price", "Please enter a valid price."))?;
                Ok(ValidatedDetails::Buy { price: Money::usd(price) })
            }
            ListingFormDetails::Borrow { daily_rate, time_limit } => {
                let rate = parse_amount(daily_rate).filter(|r| *r > Decimal::ZERO).ok_or_else(|| {
                    CatalogError::invalid_field(
                        "DailyRate",
                        "Please enter a valid daily rate (must be greater than 0).",
                    )
                })?;
                let time_limit = time_limit.filter(|t| *t > now).ok_or_else(|| {
                    CatalogError::invalid_field("TimeLimit", "Time limit must be in the future.")
                })?;
                Ok(ValidatedDetails::Borrow {
                    daily_rate: Money::usd(rate),
                    time_limit,
                })
            }
            ListingFormDetails::Auction { starting_price, end_date } => {
                let price = parse_amount(starting_price).filter(|p| *p > Decimal::ZERO).ok_or_else(|| {
                    CatalogError::invalid_field(
                        "StartingPrice",
                        "Please enter a valid starting price (must be greater than 0).",
                    )
                })?;
                let end_date = end_date.filter(|e| *e > now).ok_or_else(|| {
                    CatalogError::invalid_field("EndDate", "Auction end date must be in the future.")
                })?;
                Ok(ValidatedDetails::Auction {
                    starting_price: Money::usd(price),
                    end_date,
                })
            }
        }
    }
}

fn parse_amount(text: &str) -> Option<Decimal> {
    Decimal::from_str(text.trim()).ok()
}
