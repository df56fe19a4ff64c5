//! The contract aggregate and its renewal rules
//!
//! A renewal never modifies the original contract. It produces a new
//! contract in the RENEWED state that points back through `renewed_from`,
//! so the chain of renewals can be walked from the newest contract.

use chrono::{DateTime, Duration, Months, Utc};
use core_kernel::{ContractId, OrderId, PdfId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ContractError;
use crate::template::PredefinedContractType;

pub const DEFAULT_RENEWAL_TERMS: &str = "Standard renewal terms apply";
pub const MAX_RENEWALS: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractStatus {
    Active,
    Renewed,
    Expired,
}

impl ContractStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::Active => "ACTIVE",
            ContractStatus::Renewed => "RENEWED",
            ContractStatus::Expired => "EXPIRED",
        }
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContractStatus {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(ContractStatus::Active),
            "RENEWED" => Ok(ContractStatus::Renewed),
            "EXPIRED" => Ok(ContractStatus::Expired),
            other => Err(ContractError::invalid_field("status", format!("Unknown contract status '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub id: ContractId,
    pub order_id: OrderId,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub status: ContractStatus,
    pub content: String,
    pub renewal_count: u32,
    pub template: PredefinedContractType,
    pub pdf_id: Option<PdfId>,
    pub renewed_from: Option<ContractId>,
    pub additional_terms: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl Contract {
    pub fn new(
        order_id: OrderId,
        buyer_id: UserId,
        seller_id: UserId,
        template: PredefinedContractType,
        content: impl Into<String>,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ContractId::new_v7(),
            order_id,
            buyer_id,
            seller_id,
            status: ContractStatus::Active,
            content: content.into(),
            renewal_count: 0,
            template,
            pdf_id: None,
            renewed_from: None,
            additional_terms: None,
            start_date,
            end_date,
        }
    }

    pub fn with_additional_terms(mut self, terms: impl Into<String>) -> Self {
        self.additional_terms = Some(terms.into());
        self
    }

    pub fn validate(&self) -> Result<(), ContractError> {
        if self.order_id.is_nil() {
            return Err(ContractError::invalid_field("order_id", "Order is required"));
        }
        if self.content.trim().is_empty() {
            return Err(ContractError::invalid_field("content", "Contract content is required"));
        }
        if self.end_date < self.start_date {
            return Err(ContractError::invalid_field("end_date", "End date cannot be before start date"));
        }
        Ok(())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.end_date < now
    }

    /// True when the contract ends within `days` of `now` and has not ended yet
    pub fn expires_within(&self, days: i64, now: DateTime<Utc>) -> bool {
        !self.is_expired_at(now) && self.end_date <= now + Duration::days(days)
    }

    /// End date a renewal gets when none is requested: one year later
    pub fn default_renewal_end(&self) -> DateTime<Utc> {
        self.end_date
            .checked_add_months(Months::new(12))
            .unwrap_or(self.end_date + Duration::days(365))
    }

    /// Checks every renewal rule in the order they are reported
    pub fn check_renewal(&self, already_renewed: bool, new_end: DateTime<Utc>) -> Result<(), ContractError> {
        if self.status != ContractStatus::Active {
            return Err(ContractError::NotActive(self.status.to_string()));
        }
        if already_renewed {
            return Err(ContractError::AlreadyRenewed);
        }
        if new_end <= self.end_date {
            return Err(ContractError::EndDateNotAfter);
        }
        if self.renewal_count >= MAX_RENEWALS {
            return Err(ContractError::RenewalLimitExceeded);
        }
        Ok(())
    }

    /// Builds the renewed contract; the original is left untouched
    pub fn renewal(&self, already_renewed: bool, new_end: Option<DateTime<Utc>>) -> Result<Contract, ContractError> {
        let new_end = new_end.unwrap_or_else(|| self.default_renewal_end());
        self.check_renewal(already_renewed, new_end)?;

        let content = format!(
            "Renewed Contract for Order {}.\nOriginal Contract ID: {}.\nNew End Date: {}",
            self.order_id,
            self.id,
            new_end.format("%d/%m/%Y")
        );
        let additional_terms = self
            .additional_terms
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_RENEWAL_TERMS.to_string());

        Ok(Contract {
            id: ContractId::new_v7(),
            status: ContractStatus::Renewed,
            content,
            renewal_count: self.renewal_count + 1,
            pdf_id: None,
            renewed_from: Some(self.id),
            additional_terms: Some(additional_terms),
            start_date: self.end_date,
            end_date: new_end,
            ..self.clone()
        })
    }
}
