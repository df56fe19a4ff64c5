//! Strongly-typed identifiers for marketplace entities
//!
//! Every entity is keyed by a UUID wrapped in its own newtype, so a
//! `ProductId` can never be passed where a `UserId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates a new time-ordered identifier (v7)
            pub fn new_v7() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates from an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// The nil identifier, used for entities not yet persisted
            pub fn nil() -> Self {
                Self(Uuid::nil())
            }

            /// Returns the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Returns true for the nil identifier
            pub fn is_nil(&self) -> bool {
                self.0.is_nil()
            }

            /// Returns the identifier prefix for display
            pub fn prefix() -> &'static str {
                $prefix
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid_str = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(uuid_str)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

// Accounts
define_id!(UserId, "USR");
define_id!(NotificationId, "NTF");
define_id!(LinkageId, "LNK");

// Catalog
define_id!(ProductId, "PRD");
define_id!(BidId, "BID");
define_id!(CategoryId, "CAT");
define_id!(ConditionId, "CND");
define_id!(TagId, "TAG");
define_id!(ImageId, "IMG");
define_id!(WaitlistEntryId, "WL");

// Basket and orders
define_id!(BasketId, "BSK");
define_id!(BasketItemId, "BSKI");
define_id!(OrderId, "ORD");
define_id!(OrderSummaryId, "OSUM");
define_id!(OrderHistoryId, "OHIS");
define_id!(TrackedOrderId, "TRK");
define_id!(CheckpointId, "CHK");

// Contracts
define_id!(ContractId, "CTR");
define_id!(PredefinedContractId, "PCTR");
define_id!(PdfId, "PDF");

// Reviews and messaging
define_id!(ReviewId, "REV");
define_id!(ConversationId, "CNV");
define_id!(MessageId, "MSG");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_display() {
        let id = UserId::new();
        assert!(id.to_string().starts_with("USR-"));
    }

    #[test]
    fn test_id_parsing() {
        let original = ProductId::new();
        let parsed: ProductId = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_nil_id() {
        assert!(OrderId::nil().is_nil());
        assert!(!OrderId::new().is_nil());
    }
}
