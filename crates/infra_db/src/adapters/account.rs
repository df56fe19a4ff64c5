//! PostgreSQL account adapter
//!
//! Users and notifications have their own tables:
//!
//! ```sql
//! CREATE TABLE users (
//!     id            UUID PRIMARY KEY,
//!     username      TEXT        NOT NULL UNIQUE,
//!     email         TEXT        NOT NULL UNIQUE,
//!     phone         TEXT        NOT NULL,
//!     password_hash TEXT        NOT NULL,
//!     role          TEXT        NOT NULL,
//!     balance       NUMERIC     NOT NULL DEFAULT 0,
//!     currency      TEXT        NOT NULL DEFAULT 'USD',
//!     is_banned     BOOLEAN     NOT NULL DEFAULT false,
//!     banned_until  TIMESTAMPTZ,
//!     failed_logins INT4        NOT NULL DEFAULT 0,
//!     created_at    TIMESTAMPTZ NOT NULL
//! );
//!
//! CREATE TABLE notifications (
//!     id           UUID PRIMARY KEY,
//!     recipient_id UUID        NOT NULL REFERENCES users (id) ON DELETE CASCADE,
//!     kind         JSONB       NOT NULL,
//!     is_read      BOOLEAN     NOT NULL DEFAULT false,
//!     created_at   TIMESTAMPTZ NOT NULL
//! );
//! ```
//!
//! Buyer and seller profiles and buyer linkages are documents.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{
    DomainPort, HealthCheckResult, HealthCheckable, LinkageId, Money, NotificationId, OperationMetadata, PortError,
    UserId,
};
use domain_account::{AccountPort, Buyer, BuyerLinkage, Notification, Seller, User, UserRole};

use super::{money, parse_label, port_err};
use crate::documents::{Collection, DocumentStore};
use crate::error::DatabaseError;
use crate::pool::check_pool;

const USER_COLUMNS: &str = "id, username, email, phone, password_hash, role, balance, currency, \
                            is_banned, banned_until, failed_logins, created_at";

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    phone: String,
    password_hash: String,
    role: String,
    balance: Decimal,
    currency: String,
    is_banned: bool,
    banned_until: Option<DateTime<Utc>>,
    failed_logins: i32,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> Result<User, DatabaseError> {
        Ok(User {
            id: UserId::from(self.id),
            username: self.username,
            email: self.email,
            phone: self.phone,
            password_hash: self.password_hash,
            role: parse_label::<UserRole>(&self.role)?,
            balance: money(self.balance, &self.currency)?,
            is_banned: self.is_banned,
            banned_until: self.banned_until,
            failed_logins: u32::try_from(self.failed_logins).unwrap_or(0),
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct NotificationRow {
    id: Uuid,
    recipient_id: Uuid,
    kind: serde_json::Value,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl NotificationRow {
    fn into_notification(self) -> Result<Notification, DatabaseError> {
        Ok(Notification {
            id: NotificationId::from(self.id),
            recipient_id: UserId::from(self.recipient_id),
            kind: serde_json::from_value(self.kind)?,
            is_read: self.is_read,
            created_at: self.created_at,
        })
    }
}

/// PostgreSQL-backed [`AccountPort`]
#[derive(Debug, Clone)]
pub struct PostgresAccountAdapter {
    pool: PgPool,
    documents: DocumentStore,
}

impl PostgresAccountAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            documents: DocumentStore::new(pool.clone()),
            pool,
        }
    }

    async fn fetch_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let row: Option<UserRow> = sqlx::query_as(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(UserRow::into_user).transpose()
    }

    async fn insert_user(&self, user: &User) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO users (id, username, email, phone, password_hash, role, balance, currency, \
             is_banned, banned_until, failed_logins, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(*user.id.as_uuid())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.balance.amount())
        .bind(user.balance.currency().code())
        .bind(user.is_banned)
        .bind(user.banned_until)
        .bind(failed_logins(user))
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Returns the number of rows touched, zero when the user is unknown
    async fn update_user_row(&self, user: &User) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            "UPDATE users SET username = $2, email = $3, phone = $4, password_hash = $5, role = $6, \
             balance = $7, currency = $8, is_banned = $9, banned_until = $10, failed_logins = $11 \
             WHERE id = $1",
        )
        .bind(*user.id.as_uuid())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.balance.amount())
        .bind(user.balance.currency().code())
        .bind(user.is_banned)
        .bind(user.banned_until)
        .bind(failed_logins(user))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

fn failed_logins(user: &User) -> i32 {
    i32::try_from(user.failed_logins).unwrap_or(i32::MAX)
}

impl DomainPort for PostgresAccountAdapter {}

#[async_trait]
impl HealthCheckable for PostgresAccountAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        check_pool(&self.pool, "postgres-account-adapter").await
    }
}

#[async_trait]
impl AccountPort for PostgresAccountAdapter {
    #[instrument(skip(self, _metadata), fields(user_id = %id))]
    async fn get_user(&self, id: UserId, _metadata: Option<OperationMetadata>) -> Result<User, PortError> {
        self.fetch_user(*id.as_uuid())
            .await
            .map_err(port_err)?
            .ok_or_else(|| PortError::not_found("User", id))
    }

    #[instrument(skip(self, email, _metadata))]
    async fn find_user_by_email(
        &self,
        email: &str,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Option<User>, PortError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {} FROM users WHERE lower(email) = lower($1)", USER_COLUMNS))
                .bind(email)
                .fetch_optional(&self.pool)
                .await
                .map_err(port_err)?;
        row.map(UserRow::into_user).transpose().map_err(port_err)
    }

    async fn username_exists(&self, username: &str, _metadata: Option<OperationMetadata>) -> Result<bool, PortError> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map_err(port_err)
    }

    async fn email_exists(&self, email: &str, _metadata: Option<OperationMetadata>) -> Result<bool, PortError> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE lower(email) = lower($1))")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(port_err)
    }

    #[instrument(skip(self, user, _metadata), fields(user_id = %user.id))]
    async fn create_user(&self, user: User, _metadata: Option<OperationMetadata>) -> Result<User, PortError> {
        self.insert_user(&user).await.map_err(port_err)?;
        debug!("User inserted");
        Ok(user)
    }

    #[instrument(skip(self, user, _metadata), fields(user_id = %user.id))]
    async fn update_user(&self, user: User, _metadata: Option<OperationMetadata>) -> Result<User, PortError> {
        if self.update_user_row(&user).await.map_err(port_err)? == 0 {
            return Err(PortError::not_found("User", user.id));
        }
        Ok(user)
    }

    async fn list_users(&self, _metadata: Option<OperationMetadata>) -> Result<Vec<User>, PortError> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!("SELECT {} FROM users ORDER BY created_at", USER_COLUMNS))
            .fetch_all(&self.pool)
            .await
            .map_err(port_err)?;
        rows.into_iter()
            .map(|row| row.into_user().map_err(port_err))
            .collect()
    }

    /// Applied as one conditional UPDATE so concurrent debits cannot overdraw
    #[instrument(skip(self, _metadata), fields(user_id = %user_id, delta = %delta))]
    async fn adjust_balance(
        &self,
        user_id: UserId,
        delta: Money,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Money, PortError> {
        let updated: Option<(Decimal, String)> = sqlx::query_as(
            "UPDATE users SET balance = balance + $2 \
             WHERE id = $1 AND currency = $3 AND balance + $2 >= 0 \
             RETURNING balance, currency",
        )
        .bind(*user_id.as_uuid())
        .bind(delta.amount())
        .bind(delta.currency().code())
        .fetch_optional(&self.pool)
        .await
        .map_err(port_err)?;

        if let Some((balance, currency)) = updated {
            return money(balance, &currency).map_err(port_err);
        }

        let user = self.get_user(user_id, None).await?;
        if user.balance.currency() != delta.currency() {
            return Err(PortError::validation(format!(
                "Currency mismatch: cannot operate on {} and {}",
                user.balance.currency(),
                delta.currency()
            )));
        }
        Err(PortError::conflict("Insufficient balance"))
    }

    async fn get_buyer(&self, user_id: UserId, _metadata: Option<OperationMetadata>) -> Result<Buyer, PortError> {
        self.documents
            .require(Collection::Buyers, "Buyer", *user_id.as_uuid())
            .await
            .map_err(port_err)
    }

    async fn save_buyer(&self, buyer: Buyer, _metadata: Option<OperationMetadata>) -> Result<Buyer, PortError> {
        let id = *buyer.user_id.as_uuid();
        self.documents
            .put(Collection::Buyers, id, Some(id), &buyer)
            .await
            .map_err(port_err)?;
        Ok(buyer)
    }

    async fn get_seller(&self, user_id: UserId, _metadata: Option<OperationMetadata>) -> Result<Seller, PortError> {
        self.documents
            .require(Collection::Sellers, "Seller", *user_id.as_uuid())
            .await
            .map_err(port_err)
    }

    async fn save_seller(&self, seller: Seller, _metadata: Option<OperationMetadata>) -> Result<Seller, PortError> {
        let id = *seller.user_id.as_uuid();
        self.documents
            .put(Collection::Sellers, id, Some(id), &seller)
            .await
            .map_err(port_err)?;
        Ok(seller)
    }

    async fn followers_of(&self, seller_id: UserId, _metadata: Option<OperationMetadata>) -> Result<Vec<UserId>, PortError> {
        let buyers: Vec<Buyer> = self
            .documents
            .find_containing(Collection::Buyers, "following", &seller_id.as_uuid().to_string())
            .await
            .map_err(port_err)?;
        Ok(buyers.into_iter().map(|b| b.user_id).collect())
    }

    #[instrument(skip(self, notification, _metadata), fields(recipient = %notification.recipient_id))]
    async fn add_notification(
        &self,
        notification: Notification,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Notification, PortError> {
        let kind = serde_json::to_value(&notification.kind).map_err(port_err)?;
        sqlx::query(
            "INSERT INTO notifications (id, recipient_id, kind, is_read, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(*notification.id.as_uuid())
        .bind(*notification.recipient_id.as_uuid())
        .bind(kind)
        .bind(notification.is_read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await
        .map_err(port_err)?;
        Ok(notification)
    }

    async fn list_notifications(
        &self,
        user_id: UserId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Notification>, PortError> {
        let rows: Vec<NotificationRow> = sqlx::query_as(
            "SELECT id, recipient_id, kind, is_read, created_at FROM notifications \
             WHERE recipient_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(*user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(port_err)?;
        rows.into_iter()
            .map(|row| row.into_notification().map_err(port_err))
            .collect()
    }

    async fn mark_notification_read(
        &self,
        id: NotificationId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError> {
        let result = sqlx::query("UPDATE notifications SET is_read = true WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(port_err)?;
        if result.rows_affected() == 0 {
            return Err(PortError::not_found("Notification", id));
        }
        Ok(())
    }

    async fn mark_all_notifications_read(
        &self,
        user_id: UserId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError> {
        sqlx::query("UPDATE notifications SET is_read = true WHERE recipient_id = $1")
            .bind(*user_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(port_err)?;
        Ok(())
    }

    async fn clear_notifications(&self, user_id: UserId, _metadata: Option<OperationMetadata>) -> Result<(), PortError> {
        sqlx::query("DELETE FROM notifications WHERE recipient_id = $1")
            .bind(*user_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(port_err)?;
        Ok(())
    }

    async fn find_linkage(
        &self,
        a: UserId,
        b: UserId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Option<BuyerLinkage>, PortError> {
        let linkages = self.linkages_of(a, metadata).await?;
        Ok(linkages.into_iter().find(|l| l.connects(a, b)))
    }

    async fn save_linkage(
        &self,
        linkage: BuyerLinkage,
        _metadata: Option<OperationMetadata>,
    ) -> Result<BuyerLinkage, PortError> {
        self.documents
            .put(
                Collection::Linkages,
                *linkage.id.as_uuid(),
                Some(*linkage.requester_id.as_uuid()),
                &linkage,
            )
            .await
            .map_err(port_err)?;
        Ok(linkage)
    }

    async fn delete_linkage(&self, id: LinkageId, _metadata: Option<OperationMetadata>) -> Result<(), PortError> {
        self.documents
            .delete_existing(Collection::Linkages, "BuyerLinkage", *id.as_uuid())
            .await
            .map_err(port_err)
    }

    async fn linkages_of(&self, user_id: UserId, _metadata: Option<OperationMetadata>) -> Result<Vec<BuyerLinkage>, PortError> {
        let uuid = *user_id.as_uuid();
        let mut linkages: Vec<BuyerLinkage> = self
            .documents
            .list_by_owner(Collection::Linkages, uuid)
            .await
            .map_err(port_err)?;
        let incoming: Vec<BuyerLinkage> = self
            .documents
            .find_by_field(Collection::Linkages, "target_id", &uuid.to_string())
            .await
            .map_err(port_err)?;
        linkages.extend(incoming.into_iter().filter(|l| l.requester_id != user_id));
        Ok(linkages)
    }
}
