//! Basket DTOs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain_basket::{Basket, BasketItem, BasketTotals, ProductType};

#[derive(Debug, Deserialize, Validate)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i64,
}

/// A quantity of zero removes the line
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct TotalsQuery {
    pub promo_code: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BasketItemResponse {
    pub product_id: Uuid,
    pub title: String,
    pub product_type: ProductType,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub line_total: Decimal,
}

impl From<&BasketItem> for BasketItemResponse {
    fn from(item: &BasketItem) -> Self {
        Self {
            product_id: *item.product_id.as_uuid(),
            title: item.title.clone(),
            product_type: item.product_type,
            unit_price: item.unit_price.amount(),
            quantity: item.quantity,
            line_total: item.line_total().amount(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BasketResponse {
    pub id: Uuid,
    pub items: Vec<BasketItemResponse>,
    pub promo_code: Option<String>,
}

impl From<&Basket> for BasketResponse {
    fn from(basket: &Basket) -> Self {
        Self {
            id: *basket.id.as_uuid(),
            items: basket.items.iter().map(BasketItemResponse::from).collect(),
            promo_code: basket.promo_code.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TotalsResponse {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub currency: String,
}

impl From<BasketTotals> for TotalsResponse {
    fn from(totals: BasketTotals) -> Self {
        Self {
            subtotal: totals.subtotal.round_to_currency().amount(),
            discount: totals.discount.round_to_currency().amount(),
            total: totals.total.round_to_currency().amount(),
            currency: totals.total.currency().code().to_string(),
        }
    }
}
