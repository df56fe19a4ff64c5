//! Orders
//!
//! One order is created per basket line at checkout. Every order points at
//! the summary holding the money and contact details and at the history
//! entry grouping the whole checkout.

use chrono::{DateTime, Utc};
use core_kernel::{OrderHistoryId, OrderId, OrderSummaryId, ProductId, UserId};
use domain_basket::ProductType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::OrderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    Wallet,
    Cash,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Wallet => "wallet",
            PaymentMethod::Cash => "cash",
        }
    }

    /// Parses the method picked at checkout; blank input is rejected
    pub fn parse(text: &str) -> Result<Self, OrderError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(OrderError::invalid_field("payment_method", "Payment method is required"));
        }
        text.parse()
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "card" => Ok(PaymentMethod::Card),
            "wallet" => Ok(PaymentMethod::Wallet),
            "cash" => Ok(PaymentMethod::Cash),
            other => Err(OrderError::invalid_field(
                "payment_method",
                format!("Unsupported payment method '{}'", other),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub product_id: ProductId,
    pub product_title: String,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub product_type: ProductType,
    pub quantity: u32,
    pub payment_method: PaymentMethod,
    pub summary_id: OrderSummaryId,
    pub history_id: OrderHistoryId,
    pub order_date: DateTime<Utc>,
}

impl Order {
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.product_id.is_nil() {
            return Err(OrderError::invalid_field("product_id", "Product is required"));
        }
        if self.buyer_id.is_nil() {
            return Err(OrderError::invalid_field("buyer_id", "Buyer is required"));
        }
        if self.summary_id.is_nil() {
            return Err(OrderError::invalid_field("summary_id", "Order summary is required"));
        }
        if self.quantity == 0 {
            return Err(OrderError::invalid_field("quantity", "Quantity must be at least 1"));
        }
        Ok(())
    }

    pub fn matches_name(&self, search: &str) -> bool {
        let search = search.trim();
        search.is_empty() || self.product_title.to_lowercase().contains(&search.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> Order {
        Order {
            id: OrderId::new(),
            product_id: ProductId::new(),
            product_title: "Garden Hose".to_string(),
            buyer_id: UserId::new(),
            seller_id: UserId::new(),
            product_type: ProductType::New,
            quantity: 1,
            payment_method: PaymentMethod::Card,
            summary_id: OrderSummaryId::new(),
            history_id: OrderHistoryId::new(),
            order_date: Utc::now(),
        }
    }

    #[test]
    fn test_payment_method_parsing() {
        assert_eq!(PaymentMethod::parse(" Wallet ").unwrap(), PaymentMethod::Wallet);
        assert_eq!(
            PaymentMethod::parse("").unwrap_err().to_string(),
            "Invalid payment_method: Payment method is required"
        );
        assert!(PaymentMethod::parse("crypto").is_err());
    }

    #[test]
    fn test_nil_references_are_rejected() {
        assert!(order().validate().is_ok());
        let missing_product = Order { product_id: ProductId::nil(), ..order() };
        assert!(missing_product.validate().is_err());
        let missing_summary = Order { summary_id: OrderSummaryId::nil(), ..order() };
        assert!(missing_summary.validate().is_err());
    }

    #[test]
    fn test_name_search_ignores_case() {
        let order = order();
        assert!(order.matches_name("hose"));
        assert!(order.matches_name("  "));
        assert!(!order.matches_name("rake"));
    }
}
