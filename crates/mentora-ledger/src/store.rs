//! Wallet persistence seam
//!
//! The ledger document (wallet + embedded transactions) is loaded and saved
//! whole, so one `save` is the unit of atomicity per account. The in-memory
//! implementation backs tests and the playground; a database-backed one slots
//! in behind the same trait.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use mentora_types::{AccountId, StorageError};
use tokio::sync::RwLock;

use crate::wallet::Wallet;

/// Storage for wallet documents
#[async_trait]
pub trait WalletStore: Send + Sync {
    /// Load the full ledger document for an account
    async fn load(&self, account_id: &AccountId) -> Result<Option<Wallet>, StorageError>;

    /// Persist the full ledger document (insert or replace)
    async fn save(&self, wallet: &Wallet) -> Result<(), StorageError>;
}

/// In-memory wallet store
#[derive(Clone, Default)]
pub struct InMemoryWalletStore {
    wallets: Arc<RwLock<HashMap<AccountId, Wallet>>>,
}

impl InMemoryWalletStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WalletStore for InMemoryWalletStore {
    async fn load(&self, account_id: &AccountId) -> Result<Option<Wallet>, StorageError> {
        let wallets = self.wallets.read().await;
        Ok(wallets.get(account_id).cloned())
    }

    async fn save(&self, wallet: &Wallet) -> Result<(), StorageError> {
        let mut wallets = self.wallets.write().await;
        wallets.insert(wallet.account_id.clone(), wallet.clone());
        Ok(())
    }
}
