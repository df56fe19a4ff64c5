//! Fields shared by every listing kind, and the taxonomy used to classify them

use core_kernel::{CategoryId, ConditionId, ImageId, Money, ProductId, TagId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Product category, e.g. "Electronics"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub title: String,
    pub description: String,
}

impl Category {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: CategoryId::new_v7(),
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Product condition, e.g. "New" or "Used - Good"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub id: ConditionId,
    pub title: String,
    pub description: String,
}

impl Condition {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: ConditionId::new_v7(),
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Free-form tag attached to listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub title: String,
}

impl Tag {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: TagId::new_v7(),
            title: title.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub id: ImageId,
    pub url: String,
}

impl ProductImage {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            id: ImageId::new_v7(),
            url: url.into(),
        }
    }
}

/// The three ways a product can be listed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingKind {
    Buy,
    Borrow,
    Auction,
}

impl fmt::Display for ListingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ListingKind::Buy => "buy",
            ListingKind::Borrow => "borrow",
            ListingKind::Auction => "auction",
        })
    }
}

/// Fields common to buy, borrow and auction listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingCore {
    /// Nil until the listing is stored
    pub id: ProductId,
    pub title: String,
    pub description: String,
    pub seller_id: UserId,
    pub condition: Option<Condition>,
    pub category: Option<Category>,
    pub tags: Vec<Tag>,
    pub images: Vec<ProductImage>,
}

impl ListingCore {
    pub fn new(title: impl Into<String>, description: impl Into<String>, seller_id: UserId) -> Self {
        Self {
            id: ProductId::nil(),
            title: title.into(),
            description: description.into(),
            seller_id,
            condition: None,
            category: None,
            tags: Vec::new(),
            images: Vec::new(),
        }
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_tags(mut self, tags: Vec<Tag>) -> Self {
        self.tags = tags;
        self
    }

    pub fn is_saved(&self) -> bool {
        !self.id.is_nil()
    }

    pub fn has_tag(&self, tag_id: TagId) -> bool {
        self.tags.iter().any(|t| t.id == tag_id)
    }
}

/// Common view over every listing kind, used by filtering and sorting
pub trait Listed {
    fn core(&self) -> &ListingCore;

    fn kind(&self) -> ListingKind;

    /// Price shown in listings: unit price, daily rate or current bid
    fn listed_price(&self) -> Money;
}

/// Any listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Listing {
    Buy(crate::buy::BuyProduct),
    Borrow(crate::borrow::BorrowProduct),
    Auction(crate::auction::AuctionProduct),
}

impl Listed for Listing {
    fn core(&self) -> &ListingCore {
        match self {
            Listing::Buy(p) => p.core(),
            Listing::Borrow(p) => p.core(),
            Listing::Auction(p) => p.core(),
        }
    }

    fn kind(&self) -> ListingKind {
        match self {
            Listing::Buy(_) => ListingKind::Buy,
            Listing::Borrow(_) => ListingKind::Borrow,
            Listing::Auction(_) => ListingKind::Auction,
        }
    }

    fn listed_price(&self) -> Money {
        match self {
            Listing::Buy(p) => p.listed_price(),
            Listing::Borrow(p) => p.listed_price(),
            Listing::Auction(p) => p.listed_price(),
        }
    }
}
