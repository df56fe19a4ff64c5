//! Waitlists for borrowed products
//!
//! Buyers queue for a product that is currently lent out. When it comes back
//! it goes straight to the head of the queue.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use core_kernel::{ensure_id, PortError, ProductId, UserId, WaitlistEntryId};
use domain_account::{AccountService, NotificationKind};

use crate::error::CatalogError;
use crate::ports::CatalogPort;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistEntry {
    pub id: WaitlistEntryId,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub joined_at: DateTime<Utc>,
}

impl WaitlistEntry {
    pub fn new(product_id: ProductId, user_id: UserId) -> Self {
        Self {
            id: WaitlistEntryId::new_v7(),
            product_id,
            user_id,
            joined_at: Utc::now(),
        }
    }
}

/// 1-based position of a user in an ordered waitlist, 0 when absent
pub fn position_of(entries: &[WaitlistEntry], user_id: UserId) -> usize {
    entries
        .iter()
        .position(|e| e.user_id == user_id)
        .map_or(0, |index| index + 1)
}

#[derive(Clone)]
pub struct WaitlistService {
    port: Arc<dyn CatalogPort>,
    accounts: AccountService,
}

impl WaitlistService {
    pub fn new(port: Arc<dyn CatalogPort>, accounts: AccountService) -> Self {
        Self { port, accounts }
    }

    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn join(&self, user_id: UserId, product_id: ProductId) -> Result<WaitlistEntry, CatalogError> {
        ensure_id(user_id.is_nil(), "user")?;
        ensure_id(product_id.is_nil(), "product")?;
        self.port.get_borrow_product(product_id, None).await?;

        if self.is_in_waitlist(user_id, product_id).await? {
            return Err(CatalogError::AlreadyWaitlisted);
        }
        match self.port.add_waitlist_entry(WaitlistEntry::new(product_id, user_id), None).await {
            Ok(entry) => Ok(entry),
            Err(PortError::Conflict { .. }) => Err(CatalogError::AlreadyWaitlisted),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn leave(&self, user_id: UserId, product_id: ProductId) -> Result<(), CatalogError> {
        ensure_id(user_id.is_nil(), "user")?;
        ensure_id(product_id.is_nil(), "product")?;
        Ok(self.port.remove_waitlist_entry(user_id, product_id, None).await?)
    }

    pub async fn position(&self, user_id: UserId, product_id: ProductId) -> Result<usize, CatalogError> {
        let entries = self.users_in_waitlist(product_id).await?;
        Ok(position_of(&entries, user_id))
    }

    pub async fn is_in_waitlist(&self, user_id: UserId, product_id: ProductId) -> Result<bool, CatalogError> {
        Ok(self.position(user_id, product_id).await? > 0)
    }

    /// Entries for a product in queue order
    pub async fn users_in_waitlist(&self, product_id: ProductId) -> Result<Vec<WaitlistEntry>, CatalogError> {
        ensure_id(product_id.is_nil(), "product")?;
        Ok(self.port.waitlist_for_product(product_id, None).await?)
    }

    pub async fn user_waitlists(&self, user_id: UserId) -> Result<Vec<WaitlistEntry>, CatalogError> {
        ensure_id(user_id.is_nil(), "user")?;
        Ok(self.port.waitlists_of_user(user_id, None).await?)
    }

    pub async fn size(&self, product_id: ProductId) -> Result<usize, CatalogError> {
        Ok(self.users_in_waitlist(product_id).await?.len())
    }

    /// Handles the return of a borrowed product
    ///
    /// The head of the waitlist becomes the new borrower and is notified;
    /// with an empty waitlist the product becomes available. Returns the
    /// new borrower, if any.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn return_borrowed_product(&self, product_id: ProductId) -> Result<Option<UserId>, CatalogError> {
        let mut product = self.port.get_borrow_product(product_id, None).await?;
        if !product.is_borrowed {
            return Err(CatalogError::NotBorrowed(product_id.to_string()));
        }

        let next = self.users_in_waitlist(product_id).await?.into_iter().next();
        match &next {
            Some(entry) => {
                product.lend_to(entry.user_id);
                self.port.remove_waitlist_entry(entry.user_id, product_id, None).await?;
            }
            None => product.mark_returned(),
        }
        self.port.save_borrow_product(product, None).await?;

        let next_borrower = next.map(|e| e.user_id);
        if let Some(user_id) = next_borrower {
            self.accounts
                .notify(user_id, NotificationKind::ProductAvailable { product_id })
                .await?;
            info!(%user_id, "Borrowed product handed to the next waitlisted buyer");
        }
        Ok(next_borrower)
    }

    /// Tells everyone queued for a product that it was removed
    pub async fn notify_product_removed(&self, product_id: ProductId) -> Result<usize, CatalogError> {
        let entries = self.users_in_waitlist(product_id).await?;
        for entry in &entries {
            self.accounts
                .notify(entry.user_id, NotificationKind::ProductRemoved { product_id })
                .await?;
            self.port.remove_waitlist_entry(entry.user_id, product_id, None).await?;
        }
        Ok(entries.len())
    }
}
