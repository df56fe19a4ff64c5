//! Buyer profiles, loyalty badges and wishlists

use core_kernel::{Currency, Money, MoneyError, ProductId, Rate, UserId};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Total spending needed for each badge tier
pub const SILVER_THRESHOLD: Decimal = dec!(100);
pub const GOLD_THRESHOLD: Decimal = dec!(500);
pub const PLATINUM_THRESHOLD: Decimal = dec!(1000);

const SPENDING_WEIGHT: Decimal = dec!(0.8);
const PURCHASES_WEIGHT: Decimal = dec!(0.2);
const SPENDING_BASE: Decimal = dec!(1000);
const PURCHASES_BASE: Decimal = dec!(100);
const MIN_BADGE_PROGRESS: u32 = 1;
const MAX_BADGE_PROGRESS: u32 = 100;

/// Loyalty tier earned through total spending
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuyerBadge {
    #[default]
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl BuyerBadge {
    /// Badge for a given total spending
    pub fn for_spending(total: Decimal) -> Self {
        if total >= PLATINUM_THRESHOLD {
            BuyerBadge::Platinum
        } else if total >= GOLD_THRESHOLD {
            BuyerBadge::Gold
        } else if total >= SILVER_THRESHOLD {
            BuyerBadge::Silver
        } else {
            BuyerBadge::Bronze
        }
    }

    /// Loyalty discount attached to the badge
    pub fn discount(&self) -> Rate {
        match self {
            BuyerBadge::Bronze => Rate::zero(),
            BuyerBadge::Silver => Rate::from_percentage(dec!(5)),
            BuyerBadge::Gold => Rate::from_percentage(dec!(10)),
            BuyerBadge::Platinum => Rate::from_percentage(dec!(15)),
        }
    }
}

impl fmt::Display for BuyerBadge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuyerBadge::Bronze => "BRONZE",
            BuyerBadge::Silver => "SILVER",
            BuyerBadge::Gold => "GOLD",
            BuyerBadge::Platinum => "PLATINUM",
        };
        f.write_str(name)
    }
}

/// Postal address used for shipping and billing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub country: String,
    pub postal_code: String,
}

impl Address {
    pub fn is_empty(&self) -> bool {
        self.street.trim().is_empty() && self.city.trim().is_empty()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {} {}, {}", self.street, self.postal_code, self.city, self.country)
    }
}

/// Buyer profile attached to a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Buyer {
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub badge: BuyerBadge,
    pub total_spending: Money,
    pub number_of_purchases: u32,
    pub discount: Rate,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub use_same_address: bool,
    pub wishlist: Vec<ProductId>,
    /// Sellers this buyer follows
    pub following: Vec<UserId>,
}

impl Buyer {
    /// Creates a fresh Bronze buyer profile
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            first_name: String::new(),
            last_name: String::new(),
            badge: BuyerBadge::Bronze,
            total_spending: Money::zero(Currency::USD),
            number_of_purchases: 0,
            discount: Rate::zero(),
            shipping_address: Address::default(),
            billing_address: Address::default(),
            use_same_address: true,
            wishlist: Vec::new(),
            following: Vec::new(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    /// Address used for billing, honouring `use_same_address`
    pub fn effective_billing_address(&self) -> &Address {
        if self.use_same_address {
            &self.shipping_address
        } else {
            &self.billing_address
        }
    }

    /// Records a completed purchase and recomputes badge and discount
    pub fn update_after_purchase(&mut self, amount: &Money) -> Result<(), MoneyError> {
        self.total_spending = self.total_spending.checked_add(amount)?;
        self.number_of_purchases += 1;
        self.badge = BuyerBadge::for_spending(self.total_spending.amount());
        self.discount = self.badge.discount();
        Ok(())
    }

    /// Progress towards the top badge, as a percentage in [1, 100]
    ///
    /// Spending weighs 80% (saturating at 1000) and purchase count 20%
    /// (saturating at 100 purchases).
    pub fn badge_progress(&self) -> u32 {
        let spending = (self.total_spending.amount() / SPENDING_BASE).min(Decimal::ONE) * SPENDING_WEIGHT;
        let purchases =
            (Decimal::from(self.number_of_purchases) / PURCHASES_BASE).min(Decimal::ONE) * PURCHASES_WEIGHT;
        let percent = ((spending + purchases) * dec!(100))
            .floor()
            .to_u32()
            .unwrap_or(MAX_BADGE_PROGRESS);
        percent.clamp(MIN_BADGE_PROGRESS, MAX_BADGE_PROGRESS)
    }

    /// Adds a product to the wishlist, ignoring duplicates
    pub fn add_to_wishlist(&mut self, product_id: ProductId) -> bool {
        if self.wishlist.contains(&product_id) {
            return false;
        }
        self.wishlist.push(product_id);
        true
    }

    /// Removes a product from the wishlist, returning whether it was present
    pub fn remove_from_wishlist(&mut self, product_id: ProductId) -> bool {
        let before = self.wishlist.len();
        self.wishlist.retain(|p| *p != product_id);
        before != self.wishlist.len()
    }

    pub fn is_following(&self, seller_id: UserId) -> bool {
        self.following.contains(&seller_id)
    }
}
