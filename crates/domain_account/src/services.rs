//! Account domain services
//!
//! [`AccountService`] orchestrates registration, login, wallets, buyer and
//! seller profiles, follows, linkages and notifications on top of an
//! [`AccountPort`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

use core_kernel::{ensure_id, Money, NotificationId, PortError, ProductId, UserId};

use crate::buyer::Buyer;
use crate::credentials::{hash_password, verify_captcha, verify_password};
use crate::error::AccountError;
use crate::linkage::{status_between, BuyerLinkage, LinkageAction, LinkageStatus};
use crate::notification::{unread_count_text, Notification, NotificationKind};
use crate::ports::{AccountPort, AccountPortExt};
use crate::seller::Seller;
use crate::user::{User, UserRole};
use crate::validation::RegistrationRequest;

pub const FILL_ALL_FIELDS_MESSAGE: &str = "Please fill in all fields.";
pub const CAPTCHA_FAILED_MESSAGE: &str = "Captcha verification failed.";
pub const UNKNOWN_EMAIL_MESSAGE: &str = "Email does not exist.";
pub const BANNED_MESSAGE: &str = "User is banned.";
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed";

/// Credentials entered on the login form
#[derive(Debug, Clone)]
pub struct LoginAttempt<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub entered_captcha: &'a str,
    pub generated_captcha: &'a str,
}

/// Service for user accounts and profiles
#[derive(Clone)]
pub struct AccountService {
    port: Arc<dyn AccountPort>,
}

impl AccountService {
    pub fn new(port: Arc<dyn AccountPort>) -> Self {
        Self { port }
    }

    /// Underlying port, for services that share it
    pub fn port(&self) -> &Arc<dyn AccountPort> {
        &self.port
    }

    /// Registers a user and creates the matching buyer or seller profile
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: RegistrationRequest) -> Result<User, AccountError> {
        request.check()?;

        if self.port.username_exists(&request.username, None).await? {
            return Err(AccountError::UsernameTaken);
        }
        if self.port.email_exists(&request.email, None).await? {
            return Err(AccountError::EmailTaken);
        }

        let user = User::new(
            request.username,
            request.email,
            request.phone,
            hash_password(&request.password),
            request.role,
        );
        let user = self.port.create_user(user, None).await?;

        match user.role {
            UserRole::Buyer => {
                self.port.save_buyer(Buyer::new(user.id), None).await?;
            }
            UserRole::Seller => {
                self.port
                    .save_seller(Seller::new(user.id, user.username.clone()), None)
                    .await?;
            }
            UserRole::Admin | UserRole::Unassigned => {}
        }

        info!(user_id = %user.id, role = %user.role, "User registered");
        Ok(user)
    }

    /// Validates a login attempt, returning the user on success
    pub async fn validate_login(&self, attempt: LoginAttempt<'_>) -> Result<User, AccountError> {
        self.validate_login_at(attempt, Utc::now()).await
    }

    /// Same as [`validate_login`](Self::validate_login) with an explicit clock
    #[instrument(skip(self, attempt, now), fields(email = %attempt.email))]
    pub async fn validate_login_at(
        &self,
        attempt: LoginAttempt<'_>,
        now: DateTime<Utc>,
    ) -> Result<User, AccountError> {
        if attempt.email.trim().is_empty()
            || attempt.password.is_empty()
            || attempt.entered_captcha.trim().is_empty()
        {
            return Err(AccountError::login_rejected(FILL_ALL_FIELDS_MESSAGE));
        }

        if !verify_captcha(attempt.entered_captcha, attempt.generated_captcha) {
            return Err(AccountError::login_rejected(CAPTCHA_FAILED_MESSAGE));
        }

        let mut user = self
            .port
            .find_user_by_email(attempt.email.trim(), None)
            .await?
            .ok_or_else(|| AccountError::login_rejected(UNKNOWN_EMAIL_MESSAGE))?;

        if user.is_banned {
            return Err(AccountError::login_rejected(BANNED_MESSAGE));
        }

        if let Some(remaining) = user.suspension_remaining(now) {
            let seconds = (remaining.num_milliseconds() + 999) / 1000;
            return Err(AccountError::login_rejected(format!(
                "Too many failed attempts. Try again in {}s",
                seconds
            )));
        }

        if !verify_password(attempt.password, &user.password_hash) {
            let suspended = user.record_failed_login(now);
            if suspended {
                warn!(user_id = %user.id, "Account suspended after repeated failed logins");
                user.reset_failed_logins();
            }
            self.port.update_user(user, None).await?;
            return Err(AccountError::login_rejected(LOGIN_FAILED_MESSAGE));
        }

        if user.failed_logins > 0 || user.banned_until.is_some() {
            user.reset_failed_logins();
            user.banned_until = None;
            user = self.port.update_user(user, None).await?;
        }

        info!(user_id = %user.id, "Login succeeded");
        Ok(user)
    }

    pub async fn get_user(&self, user_id: UserId) -> Result<User, AccountError> {
        ensure_id(user_id.is_nil(), "user")?;
        Ok(self.port.get_user(user_id, None).await?)
    }

    pub async fn get_balance(&self, user_id: UserId) -> Result<Money, AccountError> {
        ensure_id(user_id.is_nil(), "user")?;
        Ok(self.port.balance_of(user_id, None).await?)
    }

    /// Overwrites a wallet balance
    pub async fn set_balance(&self, user_id: UserId, balance: Money) -> Result<Money, AccountError> {
        ensure_id(user_id.is_nil(), "user")?;
        if balance.is_negative() {
            return Err(AccountError::invalid_field("balance", "Balance cannot be negative"));
        }
        let current = self.port.balance_of(user_id, None).await?;
        let delta = balance.checked_sub(&current)?;
        Ok(self.port.adjust_balance(user_id, delta, None).await?)
    }

    /// Takes money out of a wallet, refusing to overdraw it
    #[instrument(skip(self), fields(user_id = %user_id, amount = %amount))]
    pub async fn debit(&self, user_id: UserId, amount: &Money) -> Result<Money, AccountError> {
        ensure_id(user_id.is_nil(), "user")?;
        if amount.is_negative() {
            return Err(AccountError::invalid_field("amount", "Amount cannot be negative"));
        }
        match self.port.adjust_balance(user_id, -*amount, None).await {
            Ok(balance) => Ok(balance),
            Err(PortError::Conflict { .. }) => Err(AccountError::InsufficientBalance),
            Err(e) => Err(e.into()),
        }
    }

    /// Puts money into a wallet
    #[instrument(skip(self), fields(user_id = %user_id, amount = %amount))]
    pub async fn credit(&self, user_id: UserId, amount: &Money) -> Result<Money, AccountError> {
        ensure_id(user_id.is_nil(), "user")?;
        if amount.is_negative() {
            return Err(AccountError::invalid_field("amount", "Amount cannot be negative"));
        }
        Ok(self.port.adjust_balance(user_id, *amount, None).await?)
    }

    pub async fn get_buyer(&self, user_id: UserId) -> Result<Buyer, AccountError> {
        ensure_id(user_id.is_nil(), "buyer")?;
        match self.port.get_buyer(user_id, None).await {
            Ok(buyer) => Ok(buyer),
            Err(e) if e.is_not_found() => Err(AccountError::NotABuyer(user_id.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn save_buyer(&self, buyer: Buyer) -> Result<Buyer, AccountError> {
        ensure_id(buyer.user_id.is_nil(), "buyer")?;
        Ok(self.port.save_buyer(buyer, None).await?)
    }

    /// Records a completed purchase on the buyer's statistics
    pub async fn update_after_purchase(&self, user_id: UserId, amount: &Money) -> Result<Buyer, AccountError> {
        let mut buyer = self.get_buyer(user_id).await?;
        let previous_badge = buyer.badge;
        buyer.update_after_purchase(amount)?;
        if buyer.badge != previous_badge {
            info!(buyer_id = %user_id, badge = %buyer.badge, "Buyer reached a new badge");
        }
        Ok(self.port.save_buyer(buyer, None).await?)
    }

    pub async fn add_to_wishlist(&self, user_id: UserId, product_id: ProductId) -> Result<Buyer, AccountError> {
        ensure_id(product_id.is_nil(), "product")?;
        let mut buyer = self.get_buyer(user_id).await?;
        if buyer.add_to_wishlist(product_id) {
            buyer = self.port.save_buyer(buyer, None).await?;
        }
        Ok(buyer)
    }

    pub async fn remove_from_wishlist(&self, user_id: UserId, product_id: ProductId) -> Result<Buyer, AccountError> {
        ensure_id(product_id.is_nil(), "product")?;
        let mut buyer = self.get_buyer(user_id).await?;
        if buyer.remove_from_wishlist(product_id) {
            buyer = self.port.save_buyer(buyer, None).await?;
        }
        Ok(buyer)
    }

    /// Follows a seller and notifies them of the new follower count
    #[instrument(skip(self), fields(buyer_id = %buyer_id, seller_id = %seller_id))]
    pub async fn follow_seller(&self, buyer_id: UserId, seller_id: UserId) -> Result<Buyer, AccountError> {
        let mut buyer = self.get_buyer(buyer_id).await?;
        self.get_seller(seller_id).await?;

        if buyer.is_following(seller_id) {
            return Ok(buyer);
        }
        buyer.following.push(seller_id);
        let buyer = self.port.save_buyer(buyer, None).await?;
        self.refresh_follower_count(seller_id).await?;
        Ok(buyer)
    }

    #[instrument(skip(self), fields(buyer_id = %buyer_id, seller_id = %seller_id))]
    pub async fn unfollow_seller(&self, buyer_id: UserId, seller_id: UserId) -> Result<Buyer, AccountError> {
        let mut buyer = self.get_buyer(buyer_id).await?;
        if !buyer.is_following(seller_id) {
            return Ok(buyer);
        }
        buyer.following.retain(|s| *s != seller_id);
        let buyer = self.port.save_buyer(buyer, None).await?;
        self.refresh_follower_count(seller_id).await?;
        Ok(buyer)
    }

    /// Sellers the buyer follows, used to list their products
    pub async fn followed_sellers(&self, buyer_id: UserId) -> Result<Vec<UserId>, AccountError> {
        Ok(self.get_buyer(buyer_id).await?.following)
    }

    async fn refresh_follower_count(&self, seller_id: UserId) -> Result<Seller, AccountError> {
        let followers = self.port.followers_of(seller_id, None).await?;
        let mut seller = self.get_seller(seller_id).await?;
        let count = u32::try_from(followers.len()).unwrap_or(u32::MAX);
        let message = seller.update_followers(count);
        let seller = self.port.save_seller(seller, None).await?;
        if let Some(text) = message {
            self.port
                .notify(seller_id, NotificationKind::Message { text }, None)
                .await?;
        }
        Ok(seller)
    }

    pub async fn get_seller(&self, user_id: UserId) -> Result<Seller, AccountError> {
        ensure_id(user_id.is_nil(), "seller")?;
        match self.port.get_seller(user_id, None).await {
            Ok(seller) => Ok(seller),
            Err(e) if e.is_not_found() => Err(AccountError::NotASeller(user_id.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// Saves storefront details, keeping the computed trust score and followers
    pub async fn update_store(&self, seller: Seller) -> Result<Seller, AccountError> {
        let current = self.get_seller(seller.user_id).await?;
        if seller.store_name.trim().is_empty() {
            return Err(AccountError::invalid_field("store_name", "Store name cannot be empty"));
        }
        let updated = Seller {
            followers_count: current.followers_count,
            trust_score: current.trust_score,
            ..seller
        };
        Ok(self.port.save_seller(updated, None).await?)
    }

    /// Recomputes the trust score from the seller's average review score
    pub async fn update_seller_trust(&self, seller_id: UserId, average_score: Decimal) -> Result<Seller, AccountError> {
        let mut seller = self.get_seller(seller_id).await?;
        seller.apply_average_review_score(average_score);
        debug!(seller_id = %seller_id, trust_score = %seller.trust_score, "Trust score updated");
        Ok(self.port.save_seller(seller, None).await?)
    }

    pub async fn notify(&self, recipient_id: UserId, kind: NotificationKind) -> Result<Notification, AccountError> {
        ensure_id(recipient_id.is_nil(), "user")?;
        Ok(self.port.notify(recipient_id, kind, None).await?)
    }

    /// Newest notifications first, at most `max` of them (0 for all)
    pub async fn get_notifications(&self, user_id: UserId, max: usize) -> Result<Vec<Notification>, AccountError> {
        ensure_id(user_id.is_nil(), "user")?;
        let mut notifications = self.port.list_notifications(user_id, None).await?;
        if max > 0 {
            notifications.truncate(max);
        }
        Ok(notifications)
    }

    pub async fn unread_notifications_text(&self, user_id: UserId) -> Result<String, AccountError> {
        let unread = self
            .get_notifications(user_id, 0)
            .await?
            .iter()
            .filter(|n| !n.is_read)
            .count();
        Ok(unread_count_text(unread))
    }

    pub async fn mark_notification_read(&self, id: NotificationId) -> Result<(), AccountError> {
        ensure_id(id.is_nil(), "notification")?;
        Ok(self.port.mark_notification_read(id, None).await?)
    }

    pub async fn mark_all_notifications_read(&self, user_id: UserId) -> Result<(), AccountError> {
        ensure_id(user_id.is_nil(), "user")?;
        Ok(self.port.mark_all_notifications_read(user_id, None).await?)
    }

    pub async fn clear_notifications(&self, user_id: UserId) -> Result<(), AccountError> {
        ensure_id(user_id.is_nil(), "user")?;
        Ok(self.port.clear_notifications(user_id, None).await?)
    }

    pub async fn linkage_status(&self, viewer: UserId, other: UserId) -> Result<LinkageStatus, AccountError> {
        let linkage = self.port.find_linkage(viewer, other, None).await?;
        Ok(status_between(linkage.as_ref(), viewer))
    }

    /// Applies a linkage action from `actor` towards `other`
    #[instrument(skip(self), fields(actor = %actor, other = %other, action = ?action))]
    pub async fn apply_linkage_action(
        &self,
        actor: UserId,
        other: UserId,
        action: LinkageAction,
    ) -> Result<LinkageStatus, AccountError> {
        self.get_buyer(actor).await?;
        self.get_buyer(other).await?;

        let existing = self.port.find_linkage(actor, other, None).await?;
        action.check(status_between(existing.as_ref(), actor))?;

        match (action, existing) {
            (LinkageAction::Request, _) => {
                self.port
                    .save_linkage(BuyerLinkage::request(actor, other)?, None)
                    .await?;
                Ok(LinkageStatus::PendingSent)
            }
            (LinkageAction::Accept, Some(mut linkage)) => {
                linkage.is_approved = true;
                self.port.save_linkage(linkage, None).await?;
                Ok(LinkageStatus::Linked)
            }
            (LinkageAction::Refuse | LinkageAction::Cancel | LinkageAction::Break, Some(linkage)) => {
                self.port.delete_linkage(linkage.id, None).await?;
                Ok(LinkageStatus::None)
            }
            (_, None) => Err(AccountError::InvalidLinkageTransition {
                from: LinkageStatus::None.to_string(),
                to: format!("{:?}", action).to_lowercase(),
            }),
        }
    }

    /// Buyers linked to the given buyer
    pub async fn linked_buyers(&self, user_id: UserId) -> Result<Vec<UserId>, AccountError> {
        Ok(self
            .port
            .linkages_of(user_id, None)
            .await?
            .into_iter()
            .filter(|l| l.is_approved)
            .map(|l| l.counterpart(user_id))
            .collect())
    }
}
