//! In-app notifications
//!
//! Each [`NotificationKind`] renders its own title, subtitle and body, so
//! producers (auctions, waitlists, contracts, orders) only supply the ids.

use chrono::{DateTime, Utc};
use core_kernel::{ContractId, NotificationId, OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};

/// What a notification is about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum NotificationKind {
    /// Free text, e.g. a seller's follower update
    Message { text: String },
    ContractRenewalAnswer { contract_id: ContractId, accepted: bool },
    ContractRenewalWaitlist { product_id: ProductId },
    ContractRenewalRequest { contract_id: ContractId, requester_id: UserId },
    ContractExpiration { contract_id: ContractId },
    Outbid { product_id: ProductId },
    OrderShipping { order_id: OrderId },
    PaymentConfirmation { order_id: OrderId, product_id: ProductId },
    ProductRemoved { product_id: ProductId },
    ProductAvailable { product_id: ProductId },
}

impl NotificationKind {
    pub fn title(&self) -> &'static str {
        match self {
            NotificationKind::Message { .. } => "Store Update",
            NotificationKind::ContractRenewalAnswer { .. } => "Contract Renewal Answer",
            NotificationKind::ContractRenewalWaitlist { .. } => "Contract Renewal in Waitlist",
            NotificationKind::ContractRenewalRequest { .. } => "Contract Renewal Request",
            NotificationKind::ContractExpiration { .. } => "Contract Expiration",
            NotificationKind::Outbid { .. } => "Outbid",
            NotificationKind::OrderShipping { .. } => "Order Shipping Progress",
            NotificationKind::PaymentConfirmation { .. } => "Payment Confirmation",
            NotificationKind::ProductRemoved { .. } => "Product Removed",
            NotificationKind::ProductAvailable { .. } => "Product Available",
        }
    }

    pub fn subtitle(&self) -> String {
        match self {
            NotificationKind::Message { text } => text.clone(),
            NotificationKind::ContractRenewalAnswer { contract_id, .. } => format!(
                "You have received an answer on the renewal request for contract with ID {}.",
                contract_id
            ),
            NotificationKind::ContractRenewalWaitlist { product_id } => format!(
                "Product with ID {} will not be available yet.",
                product_id
            ),
            NotificationKind::ContractRenewalRequest { contract_id, requester_id } => format!(
                "User with ID {} wants to renew contract with ID {}.",
                requester_id, contract_id
            ),
            NotificationKind::ContractExpiration { contract_id } => {
                format!("Contract with ID: {} is about to expire!", contract_id)
            }
            NotificationKind::Outbid { product_id } => {
                format!("You've been outbidded on product with ID {}.", product_id)
            }
            NotificationKind::OrderShipping { order_id } => {
                format!("New info on order with ID {} is available.", order_id)
            }
            NotificationKind::PaymentConfirmation { order_id, .. } => {
                format!("Order with ID {} has been processed successfully!", order_id)
            }
            NotificationKind::ProductRemoved { product_id } => {
                format!("Product with ID {} was removed from the marketplace!", product_id)
            }
            NotificationKind::ProductAvailable { product_id } => {
                format!("Product with ID {} is available now!", product_id)
            }
        }
    }

    pub fn content(&self) -> String {
        match self {
            NotificationKind::Message { text } => text.clone(),
            NotificationKind::ContractRenewalAnswer { contract_id, accepted: true } => format!(
                "Contract with ID {} has been renewed!\n You can download it from below!",
                contract_id
            ),
            NotificationKind::ContractRenewalAnswer { contract_id, accepted: false } => format!(
                "Unfortunately, contract: {} has not been renewed!\nThe owner refused the renewal request :(",
                contract_id
            ),
            NotificationKind::ContractRenewalWaitlist { product_id } => format!(
                "The user that borrowed product with ID {} that you are part of the waitlist for, has renewed its contract.",
                product_id
            ),
            NotificationKind::ContractRenewalRequest { contract_id, requester_id } => format!(
                "User with ID {} would like to renew contract with ID {}. Please respond promptly.",
                requester_id, contract_id
            ),
            NotificationKind::ContractExpiration { contract_id } => {
                format!("Contract with ID: {} is set to expire soon.", contract_id)
            }
            NotificationKind::Outbid { product_id } => format!(
                "You've been outbid! Another buyer has placed a higher bid on product with ID {}. Place a new bid now!",
                product_id
            ),
            NotificationKind::OrderShipping { order_id } => {
                format!("Your order with ID {} has reached a new state.", order_id)
            }
            NotificationKind::PaymentConfirmation { order_id, product_id } => format!(
                "Thank you for your purchase! Your order with ID {} for product with ID {} has been successfully processed.",
                order_id, product_id
            ),
            NotificationKind::ProductRemoved { product_id } => format!(
                "Unfortunately, the product with ID {} that you were waiting for was removed from the marketplace.",
                product_id
            ),
            NotificationKind::ProductAvailable { product_id } => format!(
                "Good news! The product with ID {} that you were waiting for is now back in stock.",
                product_id
            ),
        }
    }
}

/// A notification delivered to a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient_id: UserId,
    pub kind: NotificationKind,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(recipient_id: UserId, kind: NotificationKind) -> Self {
        Self {
            id: NotificationId::new_v7(),
            recipient_id,
            kind,
            is_read: false,
            created_at: Utc::now(),
        }
    }

    pub fn content(&self) -> String {
        self.kind.content()
    }
}

/// Header text for the unread badge, e.g. "3 unread notifications"
pub fn unread_count_text(unread: usize) -> String {
    format!(
        "{} unread notification{}",
        unread,
        if unread == 1 { "" } else { "s" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unread_count_text() {
        assert_eq!(unread_count_text(1), "1 unread notification");
        assert_eq!(unread_count_text(0), "0 unread notifications");
    }

    #[test]
    fn test_outbid_content_mentions_product() {
        let product_id = ProductId::new();
        let kind = NotificationKind::Outbid { product_id };
        assert!(kind.content().contains(&product_id.to_string()));
        assert_eq!(kind.title(), "Outbid");
    }

    #[test]
    fn test_renewal_answer_variants() {
        let contract_id = ContractId::new();
        let yes = NotificationKind::ContractRenewalAnswer { contract_id, accepted: true };
        let no = NotificationKind::ContractRenewalAnswer { contract_id, accepted: false };
        assert!(yes.content().contains("has been renewed"));
        assert!(no.content().contains("has not been renewed"));
    }
}
