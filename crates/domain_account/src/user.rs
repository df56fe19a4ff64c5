//! Marketplace users
//!
//! A [`User`] is the login identity shared by both roles. Role-specific data
//! lives in the [`Buyer`](crate::buyer::Buyer) and
//! [`Seller`](crate::seller::Seller) profiles keyed by the same [`UserId`].

use chrono::{DateTime, Duration, Utc};
use core_kernel::{Currency, Money, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Consecutive failed logins before the account is suspended
pub const MAX_FAILED_LOGIN_ATTEMPTS: u32 = 5;

/// Length of the suspension after too many failed logins
pub const SUSPENSION_DURATION_SECS: i64 = 5;

/// Role a user plays in the marketplace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    Unassigned,
    Buyer,
    Seller,
    Admin,
}

impl UserRole {
    /// Returns true for the roles a visitor can pick when registering
    pub fn is_selectable(&self) -> bool {
        matches!(self, UserRole::Buyer | UserRole::Seller)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Unassigned => "unassigned",
            UserRole::Buyer => "buyer",
            UserRole::Seller => "seller",
            UserRole::Admin => "admin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unassigned" => Ok(UserRole::Unassigned),
            "buyer" => Ok(UserRole::Buyer),
            "seller" => Ok(UserRole::Seller),
            "admin" => Ok(UserRole::Admin),
            other => Err(format!("Unknown user role: {}", other)),
        }
    }
}

/// A registered marketplace user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub phone: String,
    /// Encoded password hash, see [`crate::credentials`]
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    /// Wallet balance used for bids and wallet payments
    pub balance: Money,
    pub is_banned: bool,
    /// Set while the account is suspended after repeated failed logins
    pub banned_until: Option<DateTime<Utc>>,
    pub failed_logins: u32,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creates a user with an empty wallet
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
        password_hash: impl Into<String>,
        role: UserRole,
    ) -> Self {
        Self {
            id: UserId::new_v7(),
            username: username.into(),
            email: email.into(),
            phone: phone.into(),
            password_hash: password_hash.into(),
            role,
            balance: Money::zero(Currency::USD),
            is_banned: false,
            banned_until: None,
            failed_logins: 0,
            created_at: Utc::now(),
        }
    }

    pub fn is_buyer(&self) -> bool {
        self.role == UserRole::Buyer
    }

    pub fn is_seller(&self) -> bool {
        self.role == UserRole::Seller
    }

    /// Returns true while a login suspension is in force
    pub fn is_suspended(&self, now: DateTime<Utc>) -> bool {
        self.banned_until.is_some_and(|until| until > now)
    }

    /// Time left on the current suspension, if any
    pub fn suspension_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.banned_until
            .filter(|until| *until > now)
            .map(|until| until - now)
    }

    /// Records a failed login and suspends the account once the limit is hit
    ///
    /// Returns true if this attempt triggered a suspension.
    pub fn record_failed_login(&mut self, now: DateTime<Utc>) -> bool {
        self.failed_logins += 1;
        if self.failed_logins >= MAX_FAILED_LOGIN_ATTEMPTS {
            self.banned_until = Some(now + Duration::seconds(SUSPENSION_DURATION_SECS));
            true
        } else {
            false
        }
    }

    /// Clears the failed login counter after a successful login
    pub fn reset_failed_logins(&mut self) {
        self.failed_logins = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::new("alice", "alice@example.com", "+40712345678", "hash", UserRole::Buyer)
    }

    #[test]
    fn test_fifth_failure_suspends() {
        let mut u = user();
        let now = Utc::now();
        for _ in 0..4 {
            assert!(!u.record_failed_login(now));
        }
        assert!(u.record_failed_login(now));
        assert!(u.is_suspended(now));
        assert!(!u.is_suspended(now + Duration::seconds(SUSPENSION_DURATION_SECS)));
    }

    #[test]
    fn test_suspension_remaining() {
        let mut u = user();
        let now = Utc::now();
        u.banned_until = Some(now + Duration::seconds(3));
        assert_eq!(u.suspension_remaining(now), Some(Duration::seconds(3)));
        assert_eq!(u.suspension_remaining(now + Duration::seconds(4)), None);
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("Seller".parse::<UserRole>().unwrap(), UserRole::Seller);
        assert!("guest".parse::<UserRole>().is_err());
        assert!(UserRole::Buyer.is_selectable());
        assert!(!UserRole::Admin.is_selectable());
    }
}
