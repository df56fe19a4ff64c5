//! Account Domain
//!
//! Users, their buyer and seller profiles, and the account-level features
//! built on them:
//!
//! - **Registration and login** with ordered validation messages, captcha
//!   checks and a short suspension after repeated failed logins
//! - **Wallets** debited by bids and wallet payments
//! - **Buyer loyalty**: badges, discounts, wishlists, followed sellers and
//!   linkages between buyers
//! - **Seller storefronts** with trust scores derived from reviews
//! - **Notifications** produced by every other domain
//!
//! # Examples
//!
//! ```rust
//! use domain_account::buyer::{Buyer, BuyerBadge};
//! use core_kernel::{Money, UserId};
//! use rust_decimal_macros::dec;
//!
//! let mut buyer = Buyer::new(UserId::new());
//! buyer.update_after_purchase(&Money::usd(dec!(150))).unwrap();
//! assert_eq!(buyer.badge, BuyerBadge::Silver);
//! ```

pub mod user;
pub mod credentials;
pub mod validation;
pub mod buyer;
pub mod seller;
pub mod notification;
pub mod linkage;
pub mod error;
pub mod ports;
pub mod services;

pub use user::{User, UserRole, MAX_FAILED_LOGIN_ATTEMPTS, SUSPENSION_DURATION_SECS};
pub use credentials::{generate_captcha, hash_password, verify_captcha, verify_password};
pub use validation::{RegistrationRequest, UserValidator};
pub use buyer::{Address, Buyer, BuyerBadge};
pub use seller::Seller;
pub use notification::{Notification, NotificationKind};
pub use linkage::{BuyerLinkage, LinkageAction, LinkageStatus};
pub use error::AccountError;
pub use ports::{AccountPort, AccountPortExt};
pub use services::{AccountService, LoginAttempt};

#[cfg(any(test, feature = "mock"))]
pub use ports::mock::MockAccountPort;
