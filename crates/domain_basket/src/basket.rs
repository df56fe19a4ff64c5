//! Baskets and their items
//!
//! Each buyer owns one basket. Quantities are capped at
//! [`MAXIMUM_QUANTITY_PER_ITEM`]; asking for more silently takes the cap.

use core_kernel::{BasketId, BasketItemId, Currency, Money, MoneyError, ProductId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BasketError;
use crate::promo;

pub const MAXIMUM_QUANTITY_PER_ITEM: u32 = 10;

/// How a product was acquired, which drives delivery and warranty pricing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    #[default]
    New,
    Used,
    Borrowed,
    Refill,
    Bid,
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::New => "new",
            ProductType::Used => "used",
            ProductType::Borrowed => "borrowed",
            ProductType::Refill => "refill",
            ProductType::Bid => "bid",
        }
    }

    /// Refills and won auctions ship without a delivery fee
    pub fn ships_free(&self) -> bool {
        matches!(self, ProductType::Refill | ProductType::Bid)
    }

    /// Lines backed by a buy listing's stock count
    pub fn draws_stock(&self) -> bool {
        matches!(self, ProductType::New | ProductType::Used)
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(ProductType::New),
            "used" => Ok(ProductType::Used),
            "borrowed" => Ok(ProductType::Borrowed),
            "refill" => Ok(ProductType::Refill),
            "bid" => Ok(ProductType::Bid),
            other => Err(format!("Unknown product type: {}", other)),
        }
    }
}

/// Caps a requested quantity at the per-item maximum
pub fn limited_quantity(quantity: u32) -> u32 {
    quantity.min(MAXIMUM_QUANTITY_PER_ITEM)
}

/// Parses a quantity typed by the buyer
pub fn parse_quantity(text: &str) -> Result<u32, BasketError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(BasketError::InvalidQuantityText);
    }
    let value: i64 = text.parse().map_err(|_| BasketError::InvalidQuantityText)?;
    if value < 0 {
        return Err(BasketError::NegativeQuantity);
    }
    u32::try_from(value).map_err(|_| BasketError::InvalidQuantityText)
}

/// Converts a signed quantity, rejecting negatives
pub fn checked_quantity(quantity: i64) -> Result<u32, BasketError> {
    if quantity < 0 {
        return Err(BasketError::NegativeQuantity);
    }
    Ok(limited_quantity(u32::try_from(quantity).unwrap_or(u32::MAX)))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasketItem {
    pub id: BasketItemId,
    pub product_id: ProductId,
    pub seller_id: UserId,
    pub title: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub product_type: ProductType,
}

impl BasketItem {
    pub fn new(
        product_id: ProductId,
        seller_id: UserId,
        title: impl Into<String>,
        unit_price: Money,
        quantity: u32,
        product_type: ProductType,
    ) -> Self {
        Self {
            id: BasketItemId::new_v7(),
            product_id,
            seller_id,
            title: title.into(),
            unit_price,
            quantity: limited_quantity(quantity),
            product_type,
        }
    }

    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

/// Subtotal, promo discount and amount due for a basket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BasketTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Basket {
    pub id: BasketId,
    pub buyer_id: UserId,
    pub items: Vec<BasketItem>,
    pub promo_code: Option<String>,
}

impl Basket {
    pub fn new(buyer_id: UserId) -> Self {
        Self {
            id: BasketId::new_v7(),
            buyer_id,
            items: Vec::new(),
            promo_code: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, product_id: ProductId) -> Option<&BasketItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }

    fn item_mut(&mut self, product_id: ProductId) -> Result<&mut BasketItem, BasketError> {
        self.items
            .iter_mut()
            .find(|i| i.product_id == product_id)
            .ok_or(BasketError::ItemNotFound)
    }

    /// Adds an item, merging with an existing line for the same product
    pub fn add_item(&mut self, item: BasketItem) {
        match self.items.iter_mut().find(|i| i.product_id == item.product_id) {
            Some(existing) => {
                existing.quantity = limited_quantity(existing.quantity.saturating_add(item.quantity));
                existing.unit_price = item.unit_price;
            }
            None if item.quantity > 0 => self.items.push(item),
            None => {}
        }
    }

    /// Sets a line's quantity; zero removes the line
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: u32) -> Result<(), BasketError> {
        if quantity == 0 {
            return self.remove(product_id);
        }
        self.item_mut(product_id)?.quantity = limited_quantity(quantity);
        Ok(())
    }

    /// Lowers a quantity by one, dropping the line at one
    pub fn decrease(&mut self, product_id: ProductId) -> Result<(), BasketError> {
        let item = self.item_mut(product_id)?;
        if item.quantity > 1 {
            item.quantity -= 1;
            Ok(())
        } else {
            self.remove(product_id)
        }
    }

    /// Raises a quantity by one, up to the maximum
    pub fn increase(&mut self, product_id: ProductId) -> Result<(), BasketError> {
        let item = self.item_mut(product_id)?;
        item.quantity = limited_quantity(item.quantity + 1);
        Ok(())
    }

    pub fn remove(&mut self, product_id: ProductId) -> Result<(), BasketError> {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        if self.items.len() == before {
            return Err(BasketError::ItemNotFound);
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.promo_code = None;
    }

    /// Checks the basket can be turned into an order
    pub fn validate_before_checkout(&self) -> Result<(), BasketError> {
        if self.items.is_empty() {
            return Err(BasketError::NotCheckoutReady("basket is empty".to_string()));
        }
        if let Some(item) = self
            .items
            .iter()
            .find(|i| i.quantity == 0 || !i.unit_price.is_positive())
        {
            return Err(BasketError::NotCheckoutReady(format!(
                "item '{}' has an invalid quantity or price",
                item.title
            )));
        }
        Ok(())
    }

    pub fn subtotal(&self) -> Result<Money, MoneyError> {
        let lines: Vec<Money> = self.items.iter().map(BasketItem::line_total).collect();
        Money::sum(Currency::USD, lines.iter())
    }

    /// Totals with the given promo code, or the stored one when `None`
    pub fn totals(&self, promo_code: Option<&str>) -> Result<BasketTotals, MoneyError> {
        let subtotal = self.subtotal()?;
        let code = promo_code.or(self.promo_code.as_deref());
        let discount = promo::discount_for(code, &subtotal);
        let total = subtotal.checked_sub(&discount)?;
        Ok(BasketTotals {
            subtotal,
            discount,
            total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(price: rust_decimal::Decimal, quantity: u32) -> BasketItem {
        BasketItem::new(
            ProductId::new(),
            UserId::new(),
            "Notebook",
            Money::usd(price),
            quantity,
            ProductType::New,
        )
    }

    #[test]
    fn test_merge_is_clamped() {
        let mut basket = Basket::new(UserId::new());
        let first = item(dec!(2), 6);
        let product = first.product_id;
        basket.add_item(first);
        basket.add_item(item(dec!(2), 7).with_product(product));
        assert_eq!(basket.items.len(), 1);
        assert_eq!(basket.item(product).unwrap().quantity, MAXIMUM_QUANTITY_PER_ITEM);
    }

    #[test]
    fn test_decrease_at_one_removes() {
        let mut basket = Basket::new(UserId::new());
        let line = item(dec!(5), 1);
        let product = line.product_id;
        basket.add_item(line);
        basket.decrease(product).unwrap();
        assert!(basket.is_empty());
        assert!(matches!(basket.decrease(product), Err(BasketError::ItemNotFound)));
    }

    #[test]
    fn test_set_zero_removes_and_increase_caps() {
        let mut basket = Basket::new(UserId::new());
        let line = item(dec!(5), 10);
        let product = line.product_id;
        basket.add_item(line);
        basket.increase(product).unwrap();
        assert_eq!(basket.item(product).unwrap().quantity, 10);
        basket.set_quantity(product, 0).unwrap();
        assert!(basket.is_empty());
    }

    #[test]
    fn test_totals_with_promo() {
        let mut basket = Basket::new(UserId::new());
        basket.add_item(item(dec!(25), 2));
        basket.add_item(item(dec!(50), 1));
        let totals = basket.totals(Some("welcome20")).unwrap();
        assert_eq!(totals.subtotal.amount(), dec!(100));
        assert_eq!(totals.discount.amount(), dec!(20));
        assert_eq!(totals.total.amount(), dec!(80));
    }

    #[test]
    fn test_checkout_validation() {
        let mut basket = Basket::new(UserId::new());
        assert!(basket.validate_before_checkout().is_err());
        basket.add_item(item(dec!(0), 1));
        assert!(basket.validate_before_checkout().is_err());
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity(" 3 ").unwrap(), 3);
        assert!(matches!(parse_quantity("-1"), Err(BasketError::NegativeQuantity)));
        assert!(matches!(parse_quantity("x"), Err(BasketError::InvalidQuantityText)));
        assert!(matches!(checked_quantity(-2), Err(BasketError::NegativeQuantity)));
        assert_eq!(checked_quantity(25).unwrap(), 10);
    }

    impl BasketItem {
        fn with_product(mut self, product_id: ProductId) -> Self {
            self.product_id = product_id;
            self
        }
    }
}
