//! Identity types for the Mentora wallet core
//!
//! Generated identifiers are strongly typed wrappers around UUIDs so that a
//! transaction id can never be passed where a coupon id is expected.
//! Identifiers minted outside this workspace (the authenticated user id, the
//! order reference attached to a redemption) wrap the caller's string as-is.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Macro to generate ID types with common implementations
macro_rules! define_id_type {
    ($name:ident, $prefix:literal, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random ID
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create from an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Parse from a string (with or without prefix)
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                let s = s.strip_prefix(concat!($prefix, "_")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(s)?))
            }

            /// Get the inner UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}_{}", $prefix, self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

define_id_type!(TransactionId, "txn", "Unique identifier for a ledger transaction");
define_id_type!(CouponId, "coupon", "Unique identifier for a coupon definition");

/// Unique identifier of the account owning a wallet
///
/// Supplied by the authentication layer; this crate never mints one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Order reference attached to a coupon redemption
///
/// Issued by the purchase flow that sits in front of this workspace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Authenticated caller context consumed from the excluded auth layer
///
/// Administrators bypass the global limiter and may perform grant/adjustment
/// operations; everything else treats the two roles identically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub account_id: AccountId,
    pub is_admin: bool,
}

impl Actor {
    /// A regular authenticated user
    pub fn user(account_id: impl Into<String>) -> Self {
        Self {
            account_id: AccountId::from_string(account_id),
            is_admin: false,
        }
    }

    /// An administrator
    pub fn admin(account_id: impl Into<String>) -> Self {
        Self {
            account_id: AccountId::from_string(account_id),
            is_admin: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_and_parse() {
        let id = TransactionId::new();
        let shown = id.to_string();
        assert!(shown.starts_with("txn_"));

        let parsed = TransactionId::parse(&shown).unwrap();
        assert_eq!(parsed, id);

        // Bare UUID parses too
        let bare = TransactionId::parse(&id.0.to_string()).unwrap();
        assert_eq!(bare, id);
    }

    #[test]
    fn test_distinct_id_types() {
        let a = CouponId::new();
        let b = CouponId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_actor_roles() {
        let user = Actor::user("u-42");
        assert!(!user.is_admin);
        assert_eq!(user.account_id.as_str(), "u-42");

        let admin = Actor::admin("staff-1");
        assert!(admin.is_admin);
    }
}
