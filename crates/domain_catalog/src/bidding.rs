//! Bid placement and auction settlement
//!
//! Placing a bid moves money: the bidder's wallet is debited when the bid is
//! accepted and the previous leader gets their bid back. If storing the bid
//! fails the debit is reversed before the error is returned. Concluding an
//! auction releases the winner's held bid; the won item is then paid for at
//! checkout like any other basket line.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use core_kernel::{Money, ProductId, UserId};
use domain_account::{AccountError, AccountService, NotificationKind};

use crate::auction::{AuctionProduct, Bid};
use crate::error::{BidError, CatalogError};
use crate::ports::CatalogPort;

/// Parses the amount typed into the bid box
pub fn parse_bid_amount(text: &str) -> Result<Money, BidError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(BidError::EmptyAmount);
    }
    let amount = Decimal::from_str(text).map_err(|_| BidError::InvalidFormat)?;
    if amount <= Decimal::ZERO {
        return Err(BidError::NotPositive);
    }
    Ok(Money::usd(amount))
}

/// Result of closing an auction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuctionOutcome {
    pub product_id: ProductId,
    pub winner_id: Option<UserId>,
    pub final_price: Money,
}

#[derive(Clone)]
pub struct AuctionService {
    port: Arc<dyn CatalogPort>,
    accounts: AccountService,
}

impl AuctionService {
    pub fn new(port: Arc<dyn CatalogPort>, accounts: AccountService) -> Self {
        Self { port, accounts }
    }

    pub async fn place_bid(
        &self,
        product_id: ProductId,
        bidder_id: UserId,
        amount: Money,
    ) -> Result<AuctionProduct, CatalogError> {
        self.place_bid_at(product_id, bidder_id, amount, Utc::now()).await
    }

    #[instrument(skip(self, now), fields(product_id = %product_id, bidder_id = %bidder_id, amount = %amount))]
    pub async fn place_bid_at(
        &self,
        product_id: ProductId,
        bidder_id: UserId,
        amount: Money,
        now: DateTime<Utc>,
    ) -> Result<AuctionProduct, CatalogError> {
        if product_id.is_nil() {
            return Err(BidError::UnsavedAuction.into());
        }
        let mut auction = self.port.get_auction(product_id, None).await?;

        let bidder = match self.accounts.get_user(bidder_id).await {
            Ok(user) => user,
            Err(AccountError::Core(_)) => return Err(BidError::UnknownBidder.into()),
            Err(e) if e.is_not_found() => return Err(BidError::UnknownBidder.into()),
            Err(e) => return Err(e.into()),
        };

        auction.validate_bid(bidder.id, &amount, &bidder.balance, now)?;

        let previous_leader = auction.highest_bid().map(|b| (b.bidder_id, b.price));

        match self.accounts.debit(bidder.id, &amount).await {
            Ok(_) => {}
            Err(AccountError::InsufficientBalance) => return Err(BidError::InsufficientBalance.into()),
            Err(e) => return Err(e.into()),
        }

        let bid = Bid::new(product_id, bidder.id, amount, now);
        auction.record_bid(bid.clone(), now);

        if let Err(e) = self.port.record_bid(&auction, &bid, None).await {
            warn!(error = %e, "Bid storage failed, refunding bidder");
            if let Err(refund_error) = self.accounts.credit(bidder.id, &amount).await {
                error!(error = %refund_error, "Refund after failed bid did not complete");
            }
            return Err(BidError::Rejected(e.to_string()).into());
        }

        // The bid is stored from here on; later failures are logged, not returned
        if let Some((leader_id, leader_price)) = previous_leader {
            if let Err(e) = self.accounts.credit(leader_id, &leader_price).await {
                error!(leader_id = %leader_id, amount = %leader_price, error = %e, "Outbid refund did not complete");
            }
            if leader_id != bidder.id {
                if let Err(e) = self
                    .accounts
                    .notify(leader_id, NotificationKind::Outbid { product_id })
                    .await
                {
                    warn!(leader_id = %leader_id, error = %e, "Outbid notification not delivered");
                }
            }
        }

        info!(current_price = %auction.current_price, end_time = %auction.end_time, "Bid accepted");
        Ok(auction)
    }

    /// Closes an ended auction and removes it from the catalog
    pub async fn conclude_auction(&self, product_id: ProductId) -> Result<AuctionOutcome, CatalogError> {
        self.conclude_auction_at(product_id, Utc::now()).await
    }

    #[instrument(skip(self, now), fields(product_id = %product_id))]
    pub async fn conclude_auction_at(
        &self,
        product_id: ProductId,
        now: DateTime<Utc>,
    ) -> Result<AuctionOutcome, CatalogError> {
        if product_id.is_nil() {
            return Err(CatalogError::invalid_field(
                "id",
                "Auction Product ID must be set for conclusion.",
            ));
        }
        let auction = self.port.get_auction(product_id, None).await?;
        if !auction.is_ended(now) {
            return Err(CatalogError::AuctionStillRunning);
        }

        let outcome = AuctionOutcome {
            product_id,
            winner_id: auction.highest_bid().map(|b| b.bidder_id),
            final_price: auction.current_price,
        };

        // The winner pays for the item at checkout, so the held bid goes back
        if let Some(winner_id) = outcome.winner_id {
            self.accounts.credit(winner_id, &outcome.final_price).await?;
        }
        if let Err(e) = self.port.delete_auction(product_id, None).await {
            if let Some(winner_id) = outcome.winner_id {
                if let Err(hold_error) = self.accounts.debit(winner_id, &outcome.final_price).await {
                    error!(winner_id = %winner_id, error = %hold_error, "Could not restore held bid after failed conclusion");
                }
            }
            return Err(e.into());
        }

        info!(winner = ?outcome.winner_id, final_price = %outcome.final_price, "Auction concluded");
        Ok(outcome)
    }

    pub async fn get_auction(&self, product_id: ProductId) -> Result<AuctionProduct, CatalogError> {
        Ok(self.port.get_auction(product_id, None).await?)
    }

    /// Countdown text for an auction
    pub async fn time_left(&self, product_id: ProductId) -> Result<String, CatalogError> {
        Ok(self.get_auction(product_id).await?.time_left(Utc::now()).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_bid_amount() {
        assert_eq!(parse_bid_amount(""), Err(BidError::EmptyAmount));
        assert_eq!(parse_bid_amount("  "), Err(BidError::EmptyAmount));
        assert_eq!(parse_bid_amount("ten"), Err(BidError::InvalidFormat));
        assert_eq!(parse_bid_amount("0"), Err(BidError::NotPositive));
        assert_eq!(parse_bid_amount("-3"), Err(BidError::NotPositive));
        assert_eq!(parse_bid_amount(" 12.50 "), Ok(Money::usd(dec!(12.50))));
    }
}
