//! Seller storefronts and trust scores

use core_kernel::UserId;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Highest review rating a buyer can give
pub const MAX_REVIEW_SCORE: Decimal = dec!(5);

/// Seller profile attached to a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seller {
    pub user_id: UserId,
    pub store_name: String,
    pub store_description: String,
    pub store_address: String,
    pub followers_count: u32,
    /// Trust as a percentage of the maximum review score
    pub trust_score: Decimal,
}

impl Seller {
    pub fn new(user_id: UserId, store_name: impl Into<String>) -> Self {
        Self {
            user_id,
            store_name: store_name.into(),
            store_description: String::new(),
            store_address: String::new(),
            followers_count: 0,
            trust_score: Decimal::ZERO,
        }
    }

    /// Sets the trust score from an average review score out of 5
    pub fn apply_average_review_score(&mut self, average: Decimal) {
        let clamped = average.clamp(Decimal::ZERO, MAX_REVIEW_SCORE);
        self.trust_score = (clamped * dec!(100) / MAX_REVIEW_SCORE).round_dp(2);
    }

    /// Updates the follower count, returning the notification text when it changed
    pub fn update_followers(&mut self, new_count: u32) -> Option<String> {
        let previous = self.followers_count;
        self.followers_count = new_count;
        follower_change_message(previous, new_count)
    }
}

/// Text sent to a seller when their follower count changes
pub fn follower_change_message(previous: u32, current: u32) -> Option<String> {
    use std::cmp::Ordering;

    match current.cmp(&previous) {
        Ordering::Greater => Some(format!(
            "You gained a new follower! You now have {} followers.",
            current
        )),
        Ordering::Less => Some(format!(
            "You lost a follower. You now have {} followers.",
            current
        )),
        Ordering::Equal => None,
    }
}
