//! Auction DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain_catalog::AuctionProduct;

/// The amount is sent as typed so the bid box's own parsing rules apply
#[derive(Debug, Deserialize, Validate)]
pub struct PlaceBidRequest {
    #[validate(length(max = 32, message = "Bid amount is too long"))]
    pub amount: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuctionResponse {
    pub product_id: Uuid,
    pub title: String,
    pub current_price: Decimal,
    pub currency: String,
    pub end_time: DateTime<Utc>,
    pub bid_count: usize,
    pub highest_bidder: Option<Uuid>,
}

impl From<&AuctionProduct> for AuctionResponse {
    fn from(auction: &AuctionProduct) -> Self {
        Self {
            product_id: *auction.core.id.as_uuid(),
            title: auction.core.title.clone(),
            current_price: auction.current_price.amount(),
            currency: auction.current_price.currency().code().to_string(),
            end_time: auction.end_time,
            bid_count: auction.bids.len(),
            highest_bidder: auction.highest_bid().map(|b| *b.bidder_id.as_uuid()),
        }
    }
}
