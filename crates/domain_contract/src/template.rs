//! Predefined contract templates and placeholder filling

use chrono::{DateTime, Utc};
use core_kernel::{Money, PredefinedContractId};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PredefinedContractType {
    #[serde(rename = "BorrowingContract")]
    Borrowing,
    #[serde(rename = "BuyingContract")]
    Buying,
    #[serde(rename = "SellingContract")]
    Selling,
}

impl PredefinedContractType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredefinedContractType::Borrowing => "BorrowingContract",
            PredefinedContractType::Buying => "BuyingContract",
            PredefinedContractType::Selling => "SellingContract",
        }
    }

    fn agreement_name(&self) -> &'static str {
        match self {
            PredefinedContractType::Borrowing => "BORROWING",
            PredefinedContractType::Buying => "BUYING",
            PredefinedContractType::Selling => "SELLING",
        }
    }
}

impl fmt::Display for PredefinedContractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredefinedContract {
    pub id: PredefinedContractId,
    pub contract_type: PredefinedContractType,
    pub content: String,
}

impl PredefinedContract {
    /// Template used when none is stored for the type
    pub fn fallback(contract_type: PredefinedContractType) -> Self {
        let name = contract_type.agreement_name();
        let content = format!(
            "DEFAULT {name} AGREEMENT\n\n\
             THIS {name} AGREEMENT is made between {{SellerName}} (\"Seller\") and \
             {{BuyerName}} (\"Buyer\"), both registered users of the MarketMinds marketplace.\n\n\
             PRODUCT DETAILS:\n\
             Description: {{ProductDescription}}\n\
             Price: {{Price}}\n\
             Period: {{StartDate}} to {{EndDate}}\n\n\
             1. TERMS AND CONDITIONS\n\
             \x20  1.1 This is a default contract template.\n\n\
             2. PAYMENT\n\
             \x20  2.1 The Buyer agrees to pay the price stated above through the MarketMinds payment system.\n\n\
             3. DELIVERY\n\
             \x20  3.1 The Seller agrees to deliver the product according to the agreed delivery terms."
        );
        Self {
            id: PredefinedContractId::nil(),
            contract_type,
            content,
        }
    }
}

/// Values substituted into a template
#[derive(Debug, Clone)]
pub struct ContractPlaceholders {
    pub product_description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub price: Money,
    pub buyer_name: String,
    pub seller_name: String,
}

impl ContractPlaceholders {
    /// Replaces every known `{Placeholder}`; unknown ones stay as written
    pub fn fill(&self, template: &str) -> String {
        let replacements = [
            ("{ProductDescription}", self.product_description.clone()),
            ("{StartDate}", self.start_date.format("%d/%m/%Y").to_string()),
            ("{EndDate}", self.end_date.format("%d/%m/%Y").to_string()),
            ("{Price}", self.price.to_string()),
            ("{BuyerName}", self.buyer_name.clone()),
            ("{SellerName}", self.seller_name.clone()),
        ];
        replacements
            .iter()
            .fold(template.to_string(), |text, (key, value)| text.replace(key, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_fill_replaces_known_placeholders() {
        let placeholders = ContractPlaceholders {
            product_description: "Camping tent".to_string(),
            start_date: Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2025, 5, 15, 0, 0, 0).unwrap(),
            price: Money::usd(dec!(56)),
            buyer_name: "Ana Pop".to_string(),
            seller_name: "Outdoor Shop".to_string(),
        };
        let filled = placeholders.fill("{BuyerName} borrows {ProductDescription} for {Price} until {EndDate} {Other}");
        assert_eq!(filled, "Ana Pop borrows Camping tent for $56.00 until 15/05/2025 {Other}");
    }

    #[test]
    fn test_fallback_template_mentions_type() {
        let template = PredefinedContract::fallback(PredefinedContractType::Selling);
        assert!(template.content.starts_with("DEFAULT SELLING AGREEMENT"));
        assert!(template.content.contains("{SellerName}"));
        assert!(template.id.is_nil());
    }
}
