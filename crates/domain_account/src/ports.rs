//! Account Domain Ports
//!
//! The `AccountPort` trait defines everything the account domain needs from
//! its data source:
//!
//! - **Postgres adapter** (infra_db) for production
//! - **Mock adapter** (feature `mock`) for tests of this and downstream crates
//!
//! ```rust,ignore
//! use domain_account::{AccountPort, AccountService};
//! use std::sync::Arc;
//!
//! let port: Arc<dyn AccountPort> = Arc::new(PostgresAccountAdapter::new(pool));
//! let service = AccountService::new(port);
//! ```

use async_trait::async_trait;

use core_kernel::{
    DomainPort, HealthCheckable, LinkageId, Money, NotificationId, OperationMetadata, PortError,
    UserId,
};

use crate::buyer::Buyer;
use crate::linkage::BuyerLinkage;
use crate::notification::Notification;
use crate::seller::Seller;
use crate::user::User;

/// The port trait for account storage
///
/// All methods take optional [`OperationMetadata`] for tracing and return
/// [`PortError`] so services behave identically over every adapter.
#[async_trait]
pub trait AccountPort: DomainPort + HealthCheckable {
    /// Retrieves a user by ID, or `PortError::NotFound`
    async fn get_user(&self, id: UserId, metadata: Option<OperationMetadata>) -> Result<User, PortError>;

    /// Finds a user by email address (case-insensitive)
    async fn find_user_by_email(
        &self,
        email: &str,
        metadata: Option<OperationMetadata>,
    ) -> Result<Option<User>, PortError>;

    /// Returns true if the username is taken
    async fn username_exists(&self, username: &str, metadata: Option<OperationMetadata>) -> Result<bool, PortError>;

    /// Returns true if the email is registered
    async fn email_exists(&self, email: &str, metadata: Option<OperationMetadata>) -> Result<bool, PortError>;

    /// Inserts a new user
    async fn create_user(&self, user: User, metadata: Option<OperationMetadata>) -> Result<User, PortError>;

    /// Replaces a stored user
    async fn update_user(&self, user: User, metadata: Option<OperationMetadata>) -> Result<User, PortError>;

    /// Lists every user
    async fn list_users(&self, metadata: Option<OperationMetadata>) -> Result<Vec<User>, PortError>;

    /// Adds `delta` to a wallet balance and returns the new balance
    ///
    /// Returns `PortError::Conflict` if the balance would become negative,
    /// leaving it unchanged.
    async fn adjust_balance(
        &self,
        user_id: UserId,
        delta: Money,
        metadata: Option<OperationMetadata>,
    ) -> Result<Money, PortError>;

    /// Retrieves a buyer profile with wishlist and followed sellers
    async fn get_buyer(&self, user_id: UserId, metadata: Option<OperationMetadata>) -> Result<Buyer, PortError>;

    /// Inserts or replaces a buyer profile
    async fn save_buyer(&self, buyer: Buyer, metadata: Option<OperationMetadata>) -> Result<Buyer, PortError>;

    /// Retrieves a seller profile
    async fn get_seller(&self, user_id: UserId, metadata: Option<OperationMetadata>) -> Result<Seller, PortError>;

    /// Inserts or replaces a seller profile
    async fn save_seller(&self, seller: Seller, metadata: Option<OperationMetadata>) -> Result<Seller, PortError>;

    /// Buyers following a seller
    async fn followers_of(&self, seller_id: UserId, metadata: Option<OperationMetadata>) -> Result<Vec<UserId>, PortError>;

    async fn add_notification(
        &self,
        notification: Notification,
        metadata: Option<OperationMetadata>,
    ) -> Result<Notification, PortError>;

    /// Notifications for a user, newest first
    async fn list_notifications(
        &self,
        user_id: UserId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Notification>, PortError>;

    async fn mark_notification_read(
        &self,
        id: NotificationId,
        metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError>;

    async fn mark_all_notifications_read(
        &self,
        user_id: UserId,
        metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError>;

    async fn clear_notifications(&self, user_id: UserId, metadata: Option<OperationMetadata>) -> Result<(), PortError>;

    /// The linkage between two buyers in either direction, if any
    async fn find_linkage(
        &self,
        a: UserId,
        b: UserId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Option<BuyerLinkage>, PortError>;

    /// Inserts or replaces a linkage
    async fn save_linkage(
        &self,
        linkage: BuyerLinkage,
        metadata: Option<OperationMetadata>,
    ) -> Result<BuyerLinkage, PortError>;

    async fn delete_linkage(&self, id: LinkageId, metadata: Option<OperationMetadata>) -> Result<(), PortError>;

    /// All linkages involving a buyer
    async fn linkages_of(&self, user_id: UserId, metadata: Option<OperationMetadata>) -> Result<Vec<BuyerLinkage>, PortError>;
}

/// Convenience helpers built on top of [`AccountPort`]
#[async_trait]
pub trait AccountPortExt: AccountPort {
    /// Current wallet balance of a user
    async fn balance_of(&self, user_id: UserId, metadata: Option<OperationMetadata>) -> Result<Money, PortError> {
        Ok(self.get_user(user_id, metadata).await?.balance)
    }

    /// Sends a notification built from its kind
    async fn notify(
        &self,
        recipient_id: UserId,
        kind: crate::notification::NotificationKind,
        metadata: Option<OperationMetadata>,
    ) -> Result<Notification, PortError> {
        self.add_notification(Notification::new(recipient_id, kind), metadata).await
    }
}

impl<T: AccountPort + ?Sized> AccountPortExt for T {}

/// In-memory implementation of AccountPort for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use core_kernel::HealthCheckResult;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// In-memory mock implementation of AccountPort
    #[derive(Debug, Default, Clone)]
    pub struct MockAccountPort {
        users: Arc<RwLock<HashMap<UserId, User>>>,
        buyers: Arc<RwLock<HashMap<UserId, Buyer>>>,
        sellers: Arc<RwLock<HashMap<UserId, Seller>>>,
        notifications: Arc<RwLock<Vec<Notification>>>,
        linkages: Arc<RwLock<HashMap<LinkageId, BuyerLinkage>>>,
        /// When set, balance increases fail with this message
        reject_credits: Arc<RwLock<Option<String>>>,
        /// When set, `save_buyer` fails with this message
        reject_buyer_saves: Arc<RwLock<Option<String>>>,
        /// When set, `add_notification` fails with this message
        reject_notifications: Arc<RwLock<Option<String>>>,
    }

    impl MockAccountPort {
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates with users for testing
        pub async fn with_users(users: Vec<User>) -> Self {
            let port = Self::new();
            for user in users {
                port.users.write().await.insert(user.id, user);
            }
            port
        }

        /// Makes every following `adjust_balance` with a positive delta fail
        pub async fn reject_credits_with(&self, message: impl Into<String>) {
            *self.reject_credits.write().await = Some(message.into());
        }

        pub async fn reject_buyer_saves_with(&self, message: impl Into<String>) {
            *self.reject_buyer_saves.write().await = Some(message.into());
        }

        pub async fn reject_notifications_with(&self, message: impl Into<String>) {
            *self.reject_notifications.write().await = Some(message.into());
        }
    }

    impl DomainPort for MockAccountPort {}

    #[async_trait]
    impl HealthCheckable for MockAccountPort {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("mock-account-port")
        }
    }

    #[async_trait]
    impl AccountPort for MockAccountPort {
        async fn get_user(&self, id: UserId, _metadata: Option<OperationMetadata>) -> Result<User, PortError> {
            self.users
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("User", id))
        }

        async fn find_user_by_email(
            &self,
            email: &str,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Option<User>, PortError> {
            Ok(self
                .users
                .read()
                .await
                .values()
                .find(|u| u.email.eq_ignore_ascii_case(email))
                .cloned())
        }

        async fn username_exists(&self, username: &str, _metadata: Option<OperationMetadata>) -> Result<bool, PortError> {
            Ok(self.users.read().await.values().any(|u| u.username == username))
        }

        async fn email_exists(&self, email: &str, _metadata: Option<OperationMetadata>) -> Result<bool, PortError> {
            Ok(self
                .users
                .read()
                .await
                .values()
                .any(|u| u.email.eq_ignore_ascii_case(email)))
        }

        async fn create_user(&self, user: User, _metadata: Option<OperationMetadata>) -> Result<User, PortError> {
            let mut users = self.users.write().await;
            if users.contains_key(&user.id) {
                return Err(PortError::conflict(format!("User {} already exists", user.id)));
            }
            users.insert(user.id, user.clone());
            Ok(user)
        }

        async fn update_user(&self, user: User, _metadata: Option<OperationMetadata>) -> Result<User, PortError> {
            let mut users = self.users.write().await;
            if !users.contains_key(&user.id) {
                return Err(PortError::not_found("User", user.id));
            }
            users.insert(user.id, user.clone());
            Ok(user)
        }

        async fn list_users(&self, _metadata: Option<OperationMetadata>) -> Result<Vec<User>, PortError> {
            let mut users: Vec<_> = self.users.read().await.values().cloned().collect();
            users.sort_by_key(|u| u.created_at);
            Ok(users)
        }

        async fn adjust_balance(
            &self,
            user_id: UserId,
            delta: Money,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Money, PortError> {
            if delta.is_positive() {
                if let Some(message) = self.reject_credits.read().await.clone() {
                    return Err(PortError::internal(message));
                }
            }
            let mut users = self.users.write().await;
            let user = users
                .get_mut(&user_id)
                .ok_or_else(|| PortError::not_found("User", user_id))?;
            let updated = user
                .balance
                .checked_add(&delta)
                .map_err(|e| PortError::validation(e.to_string()))?;
            if updated.is_negative() {
                return Err(PortError::conflict("Insufficient balance"));
            }
            user.balance = updated;
            Ok(updated)
        }

        async fn get_buyer(&self, user_id: UserId, _metadata: Option<OperationMetadata>) -> Result<Buyer, PortError> {
            self.buyers
                .read()
                .await
                .get(&user_id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Buyer", user_id))
        }

        async fn save_buyer(&self, buyer: Buyer, _metadata: Option<OperationMetadata>) -> Result<Buyer, PortError> {
            if let Some(message) = self.reject_buyer_saves.read().await.clone() {
                return Err(PortError::internal(message));
            }
            self.buyers.write().await.insert(buyer.user_id, buyer.clone());
            Ok(buyer)
        }

        async fn get_seller(&self, user_id: UserId, _metadata: Option<OperationMetadata>) -> Result<Seller, PortError> {
            self.sellers
                .read()
                .await
                .get(&user_id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Seller", user_id))
        }

        async fn save_seller(&self, seller: Seller, _metadata: Option<OperationMetadata>) -> Result<Seller, PortError> {
            self.sellers.write().await.insert(seller.user_id, seller.clone());
            Ok(seller)
        }

        async fn followers_of(&self, seller_id: UserId, _metadata: Option<OperationMetadata>) -> Result<Vec<UserId>, PortError> {
            Ok(self
                .buyers
                .read()
                .await
                .values()
                .filter(|b| b.is_following(seller_id))
                .map(|b| b.user_id)
                .collect())
        }

        async fn add_notification(
            &self,
            notification: Notification,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Notification, PortError> {
            if let Some(message) = self.reject_notifications.read().await.clone() {
                return Err(PortError::internal(message));
            }
            self.notifications.write().await.push(notification.clone());
            Ok(notification)
        }

        async fn list_notifications(
            &self,
            user_id: UserId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<Notification>, PortError> {
            let mut found: Vec<_> = self
                .notifications
                .read()
                .await
                .iter()
                .filter(|n| n.recipient_id == user_id)
                .cloned()
                .collect();
            found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            Ok(found)
        }

        async fn mark_notification_read(
            &self,
            id: NotificationId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<(), PortError> {
            let mut notifications = self.notifications.write().await;
            let notification = notifications
                .iter_mut()
                .find(|n| n.id == id)
                .ok_or_else(|| PortError::not_found("Notification", id))?;
            notification.is_read = true;
            Ok(())
        }

        async fn mark_all_notifications_read(
            &self,
            user_id: UserId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<(), PortError> {
            for n in self.notifications.write().await.iter_mut().filter(|n| n.recipient_id == user_id) {
                n.is_read = true;
            }
            Ok(())
        }

        async fn clear_notifications(&self, user_id: UserId, _metadata: Option<OperationMetadata>) -> Result<(), PortError> {
            self.notifications.write().await.retain(|n| n.recipient_id != user_id);
            Ok(())
        }

        async fn find_linkage(
            &self,
            a: UserId,
            b: UserId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Option<BuyerLinkage>, PortError> {
            Ok(self.linkages.read().await.values().find(|l| l.connects(a, b)).cloned())
        }

        async fn save_linkage(
            &self,
            linkage: BuyerLinkage,
            _metadata: Option<OperationMetadata>,
        ) -> Result<BuyerLinkage, PortError> {
            self.linkages.write().await.insert(linkage.id, linkage.clone());
            Ok(linkage)
        }

        async fn delete_linkage(&self, id: LinkageId, _metadata: Option<OperationMetadata>) -> Result<(), PortError> {
            self.linkages
                .write()
                .await
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| PortError::not_found("Linkage", id))
        }

        async fn linkages_of(&self, user_id: UserId, _metadata: Option<OperationMetadata>) -> Result<Vec<BuyerLinkage>, PortError> {
            Ok(self
                .linkages
                .read()
                .await
                .values()
                .filter(|l| l.requester_id == user_id || l.target_id == user_id)
                .cloned()
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockAccountPort;
    use super::*;
    use crate::user::UserRole;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_adjust_balance_rejects_overdraft() {
        let user = User::new("buyer1", "b1@example.com", "+40700000000", "x", UserRole::Buyer);
        let id = user.id;
        let port = MockAccountPort::with_users(vec![user]).await;

        let balance = port.adjust_balance(id, Money::usd(dec!(50)), None).await.unwrap();
        assert_eq!(balance.amount(), dec!(50));

        let err = port.adjust_balance(id, Money::usd(dec!(-60)), None).await.unwrap_err();
        assert!(matches!(err, PortError::Conflict { .. }));
        assert_eq!(port.balance_of(id, None).await.unwrap().amount(), dec!(50));
    }

    #[tokio::test]
    async fn test_email_lookup_is_case_insensitive() {
        let user = User::new("buyer2", "Mixed@Example.com", "+40700000001", "x", UserRole::Buyer);
        let port = MockAccountPort::with_users(vec![user]).await;
        assert!(port.email_exists("mixed@example.com", None).await.unwrap());
        assert!(port.find_user_by_email("MIXED@example.com", None).await.unwrap().is_some());
    }
}
