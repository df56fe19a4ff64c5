//! Order summaries: what was paid and where it ships

use core_kernel::{Money, OrderSummaryId};
use serde::{Deserialize, Serialize};

use crate::error::OrderError;

/// Contact and delivery details entered at checkout
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub postal_code: String,
}

impl ContactDetails {
    /// Fails on the first blank field
    pub fn validate(&self) -> Result<(), OrderError> {
        let fields = [
            ("full_name", &self.full_name, "Full name is required"),
            ("email", &self.email, "Email is required"),
            ("phone", &self.phone, "Phone number is required"),
            ("address", &self.address, "Address is required"),
            ("postal_code", &self.postal_code, "Postal code is required"),
        ];
        match fields.iter().find(|(_, value, _)| value.trim().is_empty()) {
            Some((field, _, message)) => Err(OrderError::invalid_field(*field, *message)),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: OrderSummaryId,
    pub subtotal: Money,
    pub warranty_tax: Money,
    pub delivery_fee: Money,
    pub final_total: Money,
    #[serde(flatten)]
    pub contact: ContactDetails,
    pub additional_info: Option<String>,
    pub contract_details: Option<String>,
}

impl OrderSummary {
    pub fn validate(&self) -> Result<(), OrderError> {
        let amounts = [
            ("subtotal", &self.subtotal),
            ("warranty_tax", &self.warranty_tax),
            ("delivery_fee", &self.delivery_fee),
            ("final_total", &self.final_total),
        ];
        if let Some((field, _)) = amounts.iter().find(|(_, amount)| amount.is_negative()) {
            return Err(OrderError::invalid_field(*field, "Amount cannot be negative"));
        }
        self.contact.validate()
    }
}
