//! Catalog Domain
//!
//! Everything a seller can list and a buyer can browse:
//!
//! - **Buy** listings with a fixed price and stock
//! - **Borrow** listings charged per day, with waitlists for lent-out items
//! - **Auction** listings with timed bidding and anti-sniping extension
//! - Categories, conditions and tags, plus filtering, sorting and paging
//! - Validation of the create-listing form

pub mod product;
pub mod buy;
pub mod borrow;
pub mod auction;
pub mod bidding;
pub mod filter;
pub mod listing_form;
pub mod waitlist;
pub mod error;
pub mod ports;
pub mod services;

pub use product::{Category, Condition, Listed, Listing, ListingCore, ListingKind, ProductImage, Tag};
pub use buy::BuyProduct;
pub use borrow::BorrowProduct;
pub use auction::{AuctionProduct, Bid};
pub use bidding::{parse_bid_amount, AuctionOutcome, AuctionService};
pub use filter::{filter_listings, FilteredListings, ListingFilter, ListingSort, SellerNames, SortKey};
pub use listing_form::{ListingForm, ListingFormDetails, ValidatedDetails};
pub use waitlist::{WaitlistEntry, WaitlistService};
pub use error::{BidError, CatalogError};
pub use ports::{CatalogPort, CatalogPortExt};
pub use services::CatalogService;

#[cfg(any(test, feature = "mock"))]
pub use ports::mock::MockCatalogPort;
