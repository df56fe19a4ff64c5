//! Checkout: pricing a basket and turning it into orders
//!
//! Pricing rules:
//!
//! - Borrowed lines cost the rate times the months the rental spans (at
//!   least one), plus a 20% warranty tax on that amount
//! - Delivery costs 13.99 unless the discounted subtotal reaches 200 or
//!   every line is a refill or a won auction
//! - `final_total = subtotal + warranty_tax + delivery_fee`, where the
//!   subtotal already has the promo discount taken off

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{error, info, instrument, warn};

use core_kernel::{
    ensure_id, Currency, DateRange, Money, MoneyError, OrderHistoryId, OrderId, OrderSummaryId, ProductId, Rate,
    UserId,
};
use domain_account::{AccountService, NotificationKind};
use domain_basket::{promo, Basket, BasketItem, BasketService, ProductType};

use crate::error::OrderError;
use crate::history::OrderHistory;
use crate::order::{Order, PaymentMethod};
use crate::ports::OrderPort;
use crate::summary::{ContactDetails, OrderSummary};

pub const DELIVERY_FEE: Decimal = dec!(13.99);
pub const FREE_DELIVERY_THRESHOLD: Decimal = dec!(200);
pub const WARRANTY_TAX_PERCENT: Decimal = dec!(20);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckoutTotals {
    pub discount: Money,
    pub subtotal: Money,
    pub warranty_tax: Money,
    pub delivery_fee: Money,
    pub final_total: Money,
}

/// Cost of one basket line; borrowed lines are charged per month
pub fn line_cost(item: &BasketItem, rental: Option<&DateRange>) -> Money {
    let cost = item.line_total();
    match item.product_type {
        ProductType::Borrowed => {
            let months = rental.map_or(1, DateRange::months_spanned);
            cost.multiply(Decimal::from(months))
        }
        _ => cost,
    }
}

/// Prices a basket with its promo code and rental periods
pub fn price_checkout(basket: &Basket, rentals: &HashMap<ProductId, DateRange>) -> Result<CheckoutTotals, MoneyError> {
    let zero = Money::zero(Currency::USD);
    let mut gross = zero;
    let mut borrowed = zero;
    for item in &basket.items {
        let cost = line_cost(item, rentals.get(&item.product_id));
        gross = gross.checked_add(&cost)?;
        if item.product_type == ProductType::Borrowed {
            borrowed = borrowed.checked_add(&cost)?;
        }
    }

    let discount = promo::discount_for(basket.promo_code.as_deref(), &gross);
    let subtotal = gross.checked_sub(&discount)?;
    let warranty_tax = Rate::from_percentage(WARRANTY_TAX_PERCENT).apply(&borrowed).round_to_currency();

    let ships_free = !basket.items.is_empty() && basket.items.iter().all(|i| i.product_type.ships_free());
    let delivery_fee = if ships_free || subtotal.amount() >= FREE_DELIVERY_THRESHOLD {
        zero
    } else {
        Money::usd(DELIVERY_FEE)
    };

    let final_total = subtotal.checked_add(&warranty_tax)?.checked_add(&delivery_fee)?;
    Ok(CheckoutTotals {
        discount,
        subtotal,
        warranty_tax,
        delivery_fee,
        final_total,
    })
}

/// Everything the buyer submits on the checkout page
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub buyer_id: UserId,
    pub payment_method: PaymentMethod,
    pub contact: ContactDetails,
    pub additional_info: Option<String>,
    /// Rental window per borrowed product
    pub rentals: HashMap<ProductId, DateRange>,
}

fn contract_details(basket: &Basket, rentals: &HashMap<ProductId, DateRange>) -> Option<String> {
    let lines: Vec<String> = basket
        .items
        .iter()
        .filter(|i| i.product_type == ProductType::Borrowed)
        .map(|i| match rentals.get(&i.product_id) {
            Some(range) => format!(
                "Borrowing {} from {} to {}",
                i.title,
                range.start.format("%d/%m/%Y"),
                range.end.format("%d/%m/%Y")
            ),
            None => format!("Borrowing {} for one month", i.title),
        })
        .collect();
    (!lines.is_empty()).then(|| lines.join("\n"))
}

#[derive(Clone)]
pub struct CheckoutService {
    orders: Arc<dyn OrderPort>,
    accounts: AccountService,
    baskets: BasketService,
}

impl CheckoutService {
    pub fn new(orders: Arc<dyn OrderPort>, accounts: AccountService, baskets: BasketService) -> Self {
        Self {
            orders,
            accounts,
            baskets,
        }
    }

    /// Prices the buyer's current basket without placing anything
    pub async fn preview(
        &self,
        buyer_id: UserId,
        rentals: &HashMap<ProductId, DateRange>,
    ) -> Result<CheckoutTotals, OrderError> {
        let basket = self.baskets.get_basket(buyer_id).await?;
        Ok(price_checkout(&basket, rentals)?)
    }

    pub async fn create_order_from_cart(&self, request: CheckoutRequest) -> Result<OrderHistoryId, OrderError> {
        self.create_order_from_cart_at(request, Utc::now()).await
    }

    /// Places one order per basket line and empties the basket
    ///
    /// Stocked lines must be available in the requested quantity. Wallet
    /// payments are debited before anything is stored and refunded if
    /// storing fails. Once the orders are stored, stock, buyer stats, the
    /// basket and notifications are updated on a best-effort basis.
    #[instrument(skip(self, request, now), fields(buyer_id = %request.buyer_id, method = %request.payment_method))]
    pub async fn create_order_from_cart_at(
        &self,
        request: CheckoutRequest,
        now: DateTime<Utc>,
    ) -> Result<OrderHistoryId, OrderError> {
        ensure_id(request.buyer_id.is_nil(), "buyer")?;
        self.accounts.get_buyer(request.buyer_id).await?;

        let basket = self.baskets.get_basket(request.buyer_id).await?;
        if basket.is_empty() {
            return Err(OrderError::EmptyCart);
        }
        basket.validate_before_checkout()?;
        request.contact.validate()?;
        self.baskets.ensure_in_stock(&basket).await?;

        let totals = price_checkout(&basket, &request.rentals)?;
        if request.payment_method == PaymentMethod::Wallet {
            self.accounts.debit(request.buyer_id, &totals.final_total).await?;
        }

        let (history_id, orders) = match self.store_orders(&request, &basket, &totals, now).await {
            Ok(stored) => stored,
            Err(e) => {
                if request.payment_method == PaymentMethod::Wallet {
                    if let Err(refund) = self.accounts.credit(request.buyer_id, &totals.final_total).await {
                        error!(error = %refund, "Failed to refund wallet after checkout failure");
                    }
                }
                return Err(e);
            }
        };

        // Orders are stored and paid for; nothing below undoes the checkout
        if let Err(e) = self.baskets.take_stock(&basket).await {
            warn!(error = %e, "Orders placed but stock could not be updated");
        }
        if let Err(e) = self
            .accounts
            .update_after_purchase(request.buyer_id, &totals.final_total)
            .await
        {
            warn!(error = %e, "Orders placed but buyer purchase stats not updated");
        }
        if let Err(e) = self.baskets.clear(request.buyer_id).await {
            warn!(error = %e, "Orders placed but basket could not be cleared");
        }
        for order in &orders {
            let kind = NotificationKind::PaymentConfirmation {
                order_id: order.id,
                product_id: order.product_id,
            };
            if let Err(e) = self.accounts.notify(request.buyer_id, kind).await {
                warn!(order_id = %order.id, error = %e, "Payment confirmation not delivered");
            }
        }

        info!(
            history_id = %history_id,
            lines = basket.items.len(),
            total = %totals.final_total,
            "Checkout completed"
        );
        Ok(history_id)
    }

    async fn store_orders(
        &self,
        request: &CheckoutRequest,
        basket: &Basket,
        totals: &CheckoutTotals,
        now: DateTime<Utc>,
    ) -> Result<(OrderHistoryId, Vec<Order>), OrderError> {
        let history = self
            .orders
            .save_history(OrderHistory::new(request.buyer_id, now), None)
            .await?;

        let summary = OrderSummary {
            id: OrderSummaryId::new_v7(),
            subtotal: totals.subtotal,
            warranty_tax: totals.warranty_tax,
            delivery_fee: totals.delivery_fee,
            final_total: totals.final_total,
            contact: request.contact.clone(),
            additional_info: request.additional_info.clone().filter(|s| !s.trim().is_empty()),
            contract_details: contract_details(basket, &request.rentals),
        };
        summary.validate()?;
        let summary = self.orders.save_summary(summary, None).await?;

        let mut orders = Vec::with_capacity(basket.items.len());
        for item in &basket.items {
            let order = Order {
                id: OrderId::new_v7(),
                product_id: item.product_id,
                product_title: item.title.clone(),
                buyer_id: request.buyer_id,
                seller_id: item.seller_id,
                product_type: item.product_type,
                quantity: item.quantity,
                payment_method: request.payment_method,
                summary_id: summary.id,
                history_id: history.id,
                order_date: now,
            };
            order.validate()?;
            orders.push(self.orders.save_order(order, None).await?);
        }
        Ok((history.id, orders))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(price: Decimal, quantity: u32, product_type: ProductType) -> BasketItem {
        BasketItem::new(
            ProductId::new(),
            UserId::new(),
            "Item",
            Money::usd(price),
            quantity,
            product_type,
        )
    }

    fn basket(items: Vec<BasketItem>) -> Basket {
        let mut basket = Basket::new(UserId::new());
        items.into_iter().for_each(|i| basket.add_item(i));
        basket
    }

    #[test]
    fn test_small_order_pays_delivery() {
        let totals = price_checkout(&basket(vec![item(dec!(20), 2, ProductType::New)]), &HashMap::new()).unwrap();
        assert_eq!(totals.subtotal.amount(), dec!(40));
        assert_eq!(totals.delivery_fee.amount(), dec!(13.99));
        assert_eq!(totals.final_total.amount(), dec!(53.99));
    }

    #[test]
    fn test_free_delivery_threshold_and_ship_free_types() {
        let big = price_checkout(&basket(vec![item(dec!(100), 2, ProductType::Used)]), &HashMap::new()).unwrap();
        assert!(big.delivery_fee.is_zero());

        let refill = price_checkout(&basket(vec![item(dec!(5), 1, ProductType::Refill)]), &HashMap::new()).unwrap();
        assert!(refill.delivery_fee.is_zero());

        let mixed = price_checkout(
            &basket(vec![item(dec!(5), 1, ProductType::Bid), item(dec!(5), 1, ProductType::New)]),
            &HashMap::new(),
        )
        .unwrap();
        assert_eq!(mixed.delivery_fee.amount(), dec!(13.99));
    }

    #[test]
    fn test_borrowed_line_is_charged_per_month_with_warranty() {
        let drill = item(dec!(10), 1, ProductType::Borrowed);
        let mut rentals = HashMap::new();
        rentals.insert(
            drill.product_id,
            DateRange {
                start: Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap(),
                end: Utc.with_ymd_and_hms(2025, 4, 10, 0, 0, 0).unwrap(),
            },
        );
        let totals = price_checkout(&basket(vec![drill]), &rentals).unwrap();
        assert_eq!(totals.subtotal.amount(), dec!(30));
        assert_eq!(totals.warranty_tax.amount(), dec!(6));
        assert_eq!(totals.final_total.amount(), dec!(49.99));
    }

    #[test]
    fn test_promo_discount_is_taken_off_subtotal() {
        let mut b = basket(vec![item(dec!(250), 1, ProductType::New)]);
        b.promo_code = Some("DISCOUNT10".to_string());
        let totals = price_checkout(&b, &HashMap::new()).unwrap();
        assert_eq!(totals.discount.amount(), dec!(25));
        assert_eq!(totals.subtotal.amount(), dec!(225));
        assert_eq!(totals.final_total.amount(), dec!(225));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn line_strategy() -> impl Strategy<Value = BasketItem> {
        (
            1i64..50_000i64,
            1u32..5u32,
            prop_oneof![Just(ProductType::New), Just(ProductType::Used), Just(ProductType::Refill), Just(ProductType::Bid)],
        )
            .prop_map(|(cents, quantity, product_type)| {
                BasketItem::new(
                    ProductId::new(),
                    UserId::new(),
                    "Item",
                    Money::from_minor(cents, Currency::USD),
                    quantity,
                    product_type,
                )
            })
    }

    proptest! {
        #[test]
        fn final_total_is_the_sum_of_its_parts(
            lines in proptest::collection::vec(line_strategy(), 1..6),
            code in prop_oneof![Just(None), Just(Some("DISCOUNT10")), Just(Some("welcome20"))]
        ) {
            let mut basket = Basket::new(UserId::new());
            lines.into_iter().for_each(|i| basket.add_item(i));
            basket.promo_code = code.map(str::to_string);

            let totals = price_checkout(&basket, &HashMap::new()).unwrap();
            let parts = totals.subtotal + totals.warranty_tax + totals.delivery_fee;
            prop_assert_eq!(totals.final_total, parts);
            prop_assert!(totals.warranty_tax.is_zero());
            prop_assert!(!totals.discount.is_negative());
            prop_assert!(!totals.subtotal.is_negative());
            if totals.subtotal.amount() >= FREE_DELIVERY_THRESHOLD {
                prop_assert!(totals.delivery_fee.is_zero());
            }
        }
    }
}
