//! Checkout DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domain_order::{CheckoutTotals, ContactDetails};

#[derive(Debug, Deserialize)]
pub struct ContactBody {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub postal_code: String,
}

impl From<ContactBody> for ContactDetails {
    fn from(body: ContactBody) -> Self {
        ContactDetails {
            full_name: body.full_name,
            email: body.email,
            phone: body.phone,
            address: body.address,
            postal_code: body.postal_code,
        }
    }
}

/// Rental window for one borrowed product
#[derive(Debug, Deserialize)]
pub struct RentalPeriod {
    pub product_id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutBody {
    pub payment_method: String,
    pub contact: ContactBody,
    pub additional_info: Option<String>,
    #[serde(default)]
    pub rentals: Vec<RentalPeriod>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub history_id: Uuid,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub warranty_tax: Decimal,
    pub delivery_fee: Decimal,
    pub final_total: Decimal,
}

impl CheckoutResponse {
    pub fn new(history_id: Uuid, totals: &CheckoutTotals) -> Self {
        Self {
            history_id,
            subtotal: totals.subtotal.round_to_currency().amount(),
            discount: totals.discount.round_to_currency().amount(),
            warranty_tax: totals.warranty_tax.round_to_currency().amount(),
            delivery_fee: totals.delivery_fee.round_to_currency().amount(),
            final_total: totals.final_total.round_to_currency().amount(),
        }
    }
}
