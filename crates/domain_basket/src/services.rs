//! Basket service
//!
//! Loads the buyer's basket, applies one change and saves it back. Prices
//! and titles come from the catalog at the moment an item is added.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use core_kernel::{ensure_id, ProductId, UserId};
use domain_catalog::{AuctionOutcome, AuctionProduct, BuyProduct, CatalogService};

use crate::basket::{checked_quantity, Basket, BasketItem, BasketTotals, ProductType};
use crate::error::BasketError;
use crate::ports::{BasketPort, BasketPortExt};
use crate::promo;

#[derive(Clone)]
pub struct BasketService {
    port: Arc<dyn BasketPort>,
    catalog: CatalogService,
}

/// Product type of a buy listing, read from its condition
pub fn product_type_of(product: &BuyProduct) -> ProductType {
    match product.core.condition.as_ref() {
        Some(condition) if !condition.title.trim().eq_ignore_ascii_case("new") => ProductType::Used,
        _ => ProductType::New,
    }
}

impl BasketService {
    pub fn new(port: Arc<dyn BasketPort>, catalog: CatalogService) -> Self {
        Self { port, catalog }
    }

    pub async fn get_basket(&self, buyer_id: UserId) -> Result<Basket, BasketError> {
        ensure_id(buyer_id.is_nil(), "buyer")?;
        Ok(self.port.basket_of(buyer_id).await?)
    }

    async fn modify<F>(&self, buyer_id: UserId, change: F) -> Result<Basket, BasketError>
    where
        F: FnOnce(&mut Basket) -> Result<(), BasketError> + Send,
    {
        let mut basket = self.get_basket(buyer_id).await?;
        change(&mut basket)?;
        Ok(self.port.save_basket(basket, None).await?)
    }

    /// Adds a buy listing; the quantity is clamped to the per-item maximum
    #[instrument(skip(self), fields(buyer_id = %buyer_id, product_id = %product_id))]
    pub async fn add_product(&self, buyer_id: UserId, product_id: ProductId, quantity: i64) -> Result<Basket, BasketError> {
        ensure_id(product_id.is_nil(), "product")?;
        let quantity = checked_quantity(quantity)?;
        let product = self.catalog.get_buy_product(product_id).await?;
        if !product.in_stock() {
            return Err(BasketError::OutOfStock {
                title: product.core.title,
            });
        }
        let item = BasketItem::new(
            product.core.id,
            product.core.seller_id,
            product.core.title.clone(),
            product.price,
            quantity,
            product_type_of(&product),
        );
        let basket = self.modify(buyer_id, |b| {
            b.add_item(item);
            Ok(())
        })
        .await?;
        info!(items = basket.items.len(), "Product added to basket");
        Ok(basket)
    }

    /// Adds a borrow listing at its daily rate
    #[instrument(skip(self), fields(buyer_id = %buyer_id, product_id = %product_id))]
    pub async fn add_borrowed_product(&self, buyer_id: UserId, product_id: ProductId) -> Result<Basket, BasketError> {
        ensure_id(product_id.is_nil(), "product")?;
        let product = self.catalog.get_borrow_product(product_id).await?;
        let item = BasketItem::new(
            product.core.id,
            product.core.seller_id,
            product.core.title.clone(),
            product.daily_rate,
            1,
            ProductType::Borrowed,
        );
        self.modify(buyer_id, |b| {
            b.add_item(item);
            Ok(())
        })
        .await
    }

    /// Puts a won auction into the winner's basket at the final price
    ///
    /// Does nothing when the auction closed without bids.
    #[instrument(skip(self, auction, outcome), fields(product_id = %outcome.product_id))]
    pub async fn add_won_auction(
        &self,
        auction: &AuctionProduct,
        outcome: &AuctionOutcome,
    ) -> Result<Option<Basket>, BasketError> {
        let Some(winner) = outcome.winner_id else {
            debug!("Auction closed without a winner");
            return Ok(None);
        };
        let item = BasketItem::new(
            outcome.product_id,
            auction.core.seller_id,
            auction.core.title.clone(),
            outcome.final_price,
            1,
            ProductType::Bid,
        );
        let basket = self
            .modify(winner, |b| {
                b.add_item(item);
                Ok(())
            })
            .await?;
        Ok(Some(basket))
    }

    /// Checks every stocked line against the listing's current stock
    pub async fn ensure_in_stock(&self, basket: &Basket) -> Result<(), BasketError> {
        for item in basket.items.iter().filter(|i| i.product_type.draws_stock()) {
            let product = self.catalog.get_buy_product(item.product_id).await?;
            if product.stock < item.quantity {
                return Err(BasketError::InsufficientStock {
                    title: item.title.clone(),
                    available: product.stock,
                });
            }
        }
        Ok(())
    }

    /// Removes the basket's stocked lines from catalog stock
    ///
    /// Every line is attempted; the last failure, if any, is returned.
    #[instrument(skip(self, basket), fields(buyer_id = %basket.buyer_id))]
    pub async fn take_stock(&self, basket: &Basket) -> Result<(), BasketError> {
        let mut outcome = Ok(());
        for item in basket.items.iter().filter(|i| i.product_type.draws_stock()) {
            if let Err(e) = self.catalog.take_stock(item.product_id, item.quantity).await {
                warn!(product_id = %item.product_id, error = %e, "Stock not decremented");
                outcome = Err(e.into());
            }
        }
        outcome
    }

    pub async fn update_quantity(
        &self,
        buyer_id: UserId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Basket, BasketError> {
        ensure_id(product_id.is_nil(), "product")?;
        let quantity = checked_quantity(quantity)?;
        self.modify(buyer_id, |b| b.set_quantity(product_id, quantity)).await
    }

    pub async fn decrease_quantity(&self, buyer_id: UserId, product_id: ProductId) -> Result<Basket, BasketError> {
        self.modify(buyer_id, |b| b.decrease(product_id)).await
    }

    pub async fn increase_quantity(&self, buyer_id: UserId, product_id: ProductId) -> Result<Basket, BasketError> {
        self.modify(buyer_id, |b| b.increase(product_id)).await
    }

    pub async fn remove_product(&self, buyer_id: UserId, product_id: ProductId) -> Result<Basket, BasketError> {
        ensure_id(product_id.is_nil(), "product")?;
        self.modify(buyer_id, |b| b.remove(product_id)).await
    }

    #[instrument(skip(self), fields(buyer_id = %buyer_id))]
    pub async fn clear(&self, buyer_id: UserId) -> Result<(), BasketError> {
        self.modify(buyer_id, |b| {
            b.clear();
            Ok(())
        })
        .await?;
        info!("Basket cleared");
        Ok(())
    }

    /// Validates and stores a promo code on the basket
    pub async fn apply_promo_code(&self, buyer_id: UserId, code: &str) -> Result<Basket, BasketError> {
        promo::discount_rate(code)?;
        let code = promo::normalize(code);
        self.modify(buyer_id, |b| {
            b.promo_code = Some(code);
            Ok(())
        })
        .await
    }

    pub async fn totals(&self, buyer_id: UserId, promo_code: Option<&str>) -> Result<BasketTotals, BasketError> {
        let basket = self.get_basket(buyer_id).await?;
        Ok(basket.totals(promo_code)?)
    }

    pub async fn validate_before_checkout(&self, buyer_id: UserId) -> Result<Basket, BasketError> {
        let basket = self.get_basket(buyer_id).await?;
        basket.validate_before_checkout()?;
        Ok(basket)
    }
}
