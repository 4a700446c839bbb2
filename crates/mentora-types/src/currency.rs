//! Currency unit tag
//!
//! Wallet balances are denominated in a single platform currency. The tag is
//! carried on every wallet so a future multi-currency migration does not need
//! a schema change, but no arithmetic in this workspace crosses currencies.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed unit tag for wallet balances
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Currency(pub String);

impl Currency {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The platform's default currency
    pub fn inr() -> Self {
        Self("INR".to_string())
    }

    pub fn usd() -> Self {
        Self("USD".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self::inr()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
