//! Linkages between buyer accounts
//!
//! A linkage starts as a request from one buyer to another and becomes a
//! link once the target approves it. Refusing, cancelling and breaking all
//! remove the record, so at most one linkage exists per pair.

use chrono::{DateTime, Utc};
use core_kernel::{LinkageId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AccountError;

/// Linkage state as seen from one of the two buyers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkageStatus {
    None,
    PendingSent,
    PendingReceived,
    Linked,
}

impl fmt::Display for LinkageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LinkageStatus::None => "none",
            LinkageStatus::PendingSent => "pending_sent",
            LinkageStatus::PendingReceived => "pending_received",
            LinkageStatus::Linked => "linked",
        };
        f.write_str(name)
    }
}

/// What a buyer wants to do with a linkage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkageAction {
    Request,
    Accept,
    Refuse,
    Cancel,
    Break,
}

impl LinkageAction {
    /// Status the acting buyer must currently see for the action to apply
    fn required_status(&self) -> LinkageStatus {
        match self {
            LinkageAction::Request => LinkageStatus::None,
            LinkageAction::Accept | LinkageAction::Refuse => LinkageStatus::PendingReceived,
            LinkageAction::Cancel => LinkageStatus::PendingSent,
            LinkageAction::Break => LinkageStatus::Linked,
        }
    }

    fn resulting_status(&self) -> LinkageStatus {
        match self {
            LinkageAction::Request => LinkageStatus::PendingSent,
            LinkageAction::Accept => LinkageStatus::Linked,
            LinkageAction::Refuse | LinkageAction::Cancel | LinkageAction::Break => LinkageStatus::None,
        }
    }

    /// Checks that the action applies to the current status
    pub fn check(&self, current: LinkageStatus) -> Result<(), AccountError> {
        if current == self.required_status() {
            Ok(())
        } else {
            Err(AccountError::InvalidLinkageTransition {
                from: current.to_string(),
                to: self.resulting_status().to_string(),
            })
        }
    }
}

/// A request or link between two buyers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerLinkage {
    pub id: LinkageId,
    pub requester_id: UserId,
    pub target_id: UserId,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}

impl BuyerLinkage {
    /// Creates a pending request
    pub fn request(requester_id: UserId, target_id: UserId) -> Result<Self, AccountError> {
        if requester_id == target_id {
            return Err(AccountError::invalid_field(
                "target",
                "A buyer cannot link to themselves",
            ));
        }
        Ok(Self {
            id: LinkageId::new_v7(),
            requester_id,
            target_id,
            is_approved: false,
            created_at: Utc::now(),
        })
    }

    /// Returns true if the linkage connects the two buyers in either direction
    pub fn connects(&self, a: UserId, b: UserId) -> bool {
        (self.requester_id == a && self.target_id == b) || (self.requester_id == b && self.target_id == a)
    }

    /// The other buyer of the pair
    pub fn counterpart(&self, viewer: UserId) -> UserId {
        if self.requester_id == viewer {
            self.target_id
        } else {
            self.requester_id
        }
    }

    /// Status from the viewer's point of view
    pub fn status_for(&self, viewer: UserId) -> LinkageStatus {
        if self.is_approved {
            LinkageStatus::Linked
        } else if self.requester_id == viewer {
            LinkageStatus::PendingSent
        } else {
            LinkageStatus::PendingReceived
        }
    }
}

/// Status between two buyers given the linkage record, if any
pub fn status_between(linkage: Option<&BuyerLinkage>, viewer: UserId) -> LinkageStatus {
    linkage.map_or(LinkageStatus::None, |l| l.status_for(viewer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_link_rejected() {
        let id = UserId::new();
        assert!(BuyerLinkage::request(id, id).is_err());
    }

    #[test]
    fn test_status_perspectives() {
        let (a, b) = (UserId::new(), UserId::new());
        let mut link = BuyerLinkage::request(a, b).unwrap();
        assert_eq!(link.status_for(a), LinkageStatus::PendingSent);
        assert_eq!(link.status_for(b), LinkageStatus::PendingReceived);

        link.is_approved = true;
        assert_eq!(link.status_for(a), LinkageStatus::Linked);
        assert_eq!(link.counterpart(b), a);
    }

    #[test]
    fn test_action_guards() {
        assert!(LinkageAction::Accept.check(LinkageStatus::PendingReceived).is_ok());
        assert!(LinkageAction::Accept.check(LinkageStatus::PendingSent).is_err());
        assert!(LinkageAction::Cancel.check(LinkageStatus::PendingSent).is_ok());
        assert!(LinkageAction::Break.check(LinkageStatus::PendingReceived).is_err());
        assert!(LinkageAction::Request.check(LinkageStatus::None).is_ok());
    }
}
