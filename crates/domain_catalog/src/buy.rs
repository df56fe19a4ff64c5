//! Fixed-price listings

use core_kernel::Money;
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::product::{Listed, ListingCore, ListingKind};

pub const DEFAULT_STOCK: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuyProduct {
    #[serde(flatten)]
    pub core: ListingCore,
    pub price: Money,
    pub stock: u32,
}

impl BuyProduct {
    pub fn new(core: ListingCore, price: Money) -> Self {
        Self {
            core,
            price,
            stock: DEFAULT_STOCK,
        }
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.core.title.trim().is_empty() {
            return Err(CatalogError::invalid_field("title", "Title is required"));
        }
        if self.core.seller_id.is_nil() {
            return Err(CatalogError::invalid_field("seller_id", "Valid seller ID is required"));
        }
        if self.price.is_negative() {
            return Err(CatalogError::invalid_field("price", "Price cannot be negative"));
        }
        Ok(())
    }

    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Takes `quantity` units out of stock
    pub fn take_stock(&mut self, quantity: u32) -> Result<(), CatalogError> {
        self.stock = self.stock.checked_sub(quantity).ok_or_else(|| {
            CatalogError::invalid_field("stock", format!("Only {} left in stock", self.stock))
        })?;
        Ok(())
    }
}

impl Listed for BuyProduct {
    fn core(&self) -> &ListingCore {
        &self.core
    }

    fn kind(&self) -> ListingKind {
        ListingKind::Buy
    }

    fn listed_price(&self) -> Money {
        self.price
    }
}
