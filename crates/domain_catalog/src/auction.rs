//! Timed auctions and their bids
//!
//! An auction accepts bids between `start_time` and `end_time`. The first bid
//! must reach the start price, later ones must beat the current price by at
//! least one unit. A bid landing in the last five minutes pushes the end out
//! so that other bidders get a chance to answer.

use chrono::{DateTime, Datelike, Duration, Utc};
use core_kernel::{BidId, Money, ProductId, TimeLeft, UserId};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::BidError;
use crate::product::{Listed, ListingCore, ListingKind};

/// Length of an auction created without an end time
pub const DEFAULT_AUCTION_DAYS: i64 = 7;

/// Anti-sniping window: bids inside it extend the auction to now + this
pub const EXTENSION_WINDOW_MINUTES: i64 = 5;

/// Step above the current price required after the first bid
pub const MINIMUM_BID_INCREMENT: rust_decimal::Decimal = dec!(1);

/// Start price used when neither start nor current price is positive
pub const DEFAULT_MINIMUM_PRICE: rust_decimal::Decimal = dec!(1.00);

/// Timestamps before this year are treated as unset
const EARLIEST_VALID_YEAR: i32 = 2000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    pub id: BidId,
    pub product_id: ProductId,
    pub bidder_id: UserId,
    pub price: Money,
    pub timestamp: DateTime<Utc>,
}

impl Bid {
    pub fn new(product_id: ProductId, bidder_id: UserId, price: Money, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: BidId::new_v7(),
            product_id,
            bidder_id,
            price,
            timestamp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuctionProduct {
    #[serde(flatten)]
    pub core: ListingCore,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub start_price: Money,
    pub current_price: Money,
    pub bids: Vec<Bid>,
}

impl AuctionProduct {
    pub fn new(
        core: ListingCore,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        start_price: Money,
    ) -> Self {
        Self {
            core,
            start_time,
            end_time,
            start_price,
            current_price: start_price,
            bids: Vec::new(),
        }
    }

    /// Normalises times and prices before the auction is stored
    pub fn apply_creation_defaults(&mut self, now: DateTime<Utc>) {
        if self.start_time.year() < EARLIEST_VALID_YEAR {
            self.start_time = now;
        }
        if self.end_time.year() < EARLIEST_VALID_YEAR || self.end_time <= now {
            self.end_time = now + Duration::days(DEFAULT_AUCTION_DAYS);
        }

        if !self.start_price.is_positive() {
            self.start_price = if self.current_price.is_positive() {
                self.current_price
            } else {
                Money::new(DEFAULT_MINIMUM_PRICE, self.start_price.currency())
            };
        }
        if !self.current_price.is_positive() {
            self.current_price = self.start_price;
        }
    }

    pub fn time_left(&self, now: DateTime<Utc>) -> TimeLeft {
        TimeLeft::until(self.end_time, now)
    }

    pub fn is_ended(&self, now: DateTime<Utc>) -> bool {
        now >= self.end_time
    }

    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        now >= self.start_time
    }

    /// Smallest acceptable next bid
    pub fn minimum_bid(&self) -> Money {
        if self.bids.is_empty() {
            self.start_price
        } else {
            Money::new(
                self.current_price.amount() + MINIMUM_BID_INCREMENT,
                self.current_price.currency(),
            )
        }
    }

    /// The leading bid, if any
    pub fn highest_bid(&self) -> Option<&Bid> {
        self.bids.iter().max_by(|a, b| {
            a.price
                .amount()
                .cmp(&b.price.amount())
                .then(b.timestamp.cmp(&a.timestamp))
        })
    }

    /// Checks a bid against the auction state and the bidder's wallet
    ///
    /// The bidder's existence is checked by the caller, between the saved
    /// auction check and the seller check.
    pub fn validate_bid(
        &self,
        bidder_id: UserId,
        amount: &Money,
        bidder_balance: &Money,
        now: DateTime<Utc>,
    ) -> Result<(), BidError> {
        if !self.core.is_saved() {
            return Err(BidError::UnsavedAuction);
        }
        if bidder_id.is_nil() {
            return Err(BidError::UnknownBidder);
        }
        if bidder_id == self.core.seller_id {
            return Err(BidError::OwnAuction);
        }
        if self.is_ended(now) {
            return Err(BidError::AuctionEnded);
        }
        if !self.has_started(now) {
            return Err(BidError::NotStarted);
        }
        let minimum = self.minimum_bid();
        if amount.amount() < minimum.amount() {
            return Err(BidError::BelowMinimum(minimum));
        }
        if amount.amount() > bidder_balance.amount() {
            return Err(BidError::InsufficientBalance);
        }
        Ok(())
    }

    /// Records an accepted bid, raising the price and extending a closing auction
    pub fn record_bid(&mut self, bid: Bid, now: DateTime<Utc>) {
        if bid.price.amount() > self.current_price.amount() || self.bids.is_empty() {
            self.current_price = bid.price;
        }
        self.bids.push(bid);
        self.extend_if_closing(now);
    }

    /// Pushes the end to now + 5 minutes when less than that remains
    pub fn extend_if_closing(&mut self, now: DateTime<Utc>) -> bool {
        let window = Duration::minutes(EXTENSION_WINDOW_MINUTES);
        if self.end_time - now < window {
            self.end_time = now + window;
            true
        } else {
            false
        }
    }
}

impl Listed for AuctionProduct {
    fn core(&self) -> &ListingCore {
        &self.core
    }

    fn kind(&self) -> ListingKind {
        ListingKind::Auction
    }

    fn listed_price(&self) -> Money {
        self.current_price
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn accepted_bids_raise_the_price_by_at_least_the_increment(
            raises in proptest::collection::vec(0i64..5_000i64, 1..12)
        ) {
            let now = Utc::now();
            let mut core = ListingCore::new("Vintage watch", "1960s", UserId::new());
            core.id = ProductId::new();
            let mut auction = AuctionProduct::new(core, now - Duration::hours(1), now + Duration::days(1), Money::usd(dec!(50)));
            let wallet = Money::usd(dec!(1000000));

            for cents in raises {
                let minimum = auction.minimum_bid();
                let amount = Money::new(minimum.amount() + rust_decimal::Decimal::new(cents, 2), minimum.currency());
                prop_assert!(auction.validate_bid(UserId::new(), &amount, &wallet, now).is_ok());

                let previous = auction.current_price;
                auction.record_bid(Bid::new(auction.core.id, UserId::new(), amount, now), now);
                prop_assert_eq!(auction.current_price, amount);
                prop_assert!(auction.current_price.amount() >= previous.amount());
                prop_assert_eq!(auction.minimum_bid().amount(), amount.amount() + MINIMUM_BID_INCREMENT);
            }
        }
    }
}
