//! Shared storage error taxonomy
//!
//! Every store trait in the workspace fails with `StorageError`. Component
//! crates wrap it in their own error enums via `#[from]`; only the limiter is
//! allowed to swallow it (fail open).

use thiserror::Error;

/// Transient or structural persistence failure
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// The backing store could not be reached or timed out
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// A stored record could not be decoded into its domain type
    #[error("Stored record corrupted: {0}")]
    Corrupted(String),
}

impl StorageError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted(message.into())
    }
}
