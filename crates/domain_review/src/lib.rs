//! Review Domain
//!
//! Buyers rate sellers from 0 to 5 with a description and optional images.
//! Every change recomputes the seller's average score, which feeds the trust
//! score shown on the seller's storefront.

pub mod review;
pub mod error;
pub mod ports;
pub mod services;

pub use review::{average_rating, clamp_rating, fallback_username, Review, ReviewImage, ReviewView, MAX_RATING, MIN_RATING};
pub use error::ReviewError;
pub use ports::{ReviewPort, ReviewPortExt};
pub use services::ReviewService;

#[cfg(any(test, feature = "mock"))]
pub use ports::mock::MockReviewPort;
