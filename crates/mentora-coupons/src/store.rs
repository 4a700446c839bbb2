//! Coupon persistence seam
//!
//! One document per code, loaded and saved whole; the usage record list is
//! embedded, so a single `save` commits a redemption atomically. Codes handed
//! to the store are already normalized uppercase.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use mentora_types::StorageError;
use tokio::sync::RwLock;

use crate::coupon::Coupon;

/// Storage for coupon documents
#[async_trait]
pub trait CouponStore: Send + Sync {
    /// Load a coupon by its normalized code
    async fn load(&self, code: &str) -> Result<Option<Coupon>, StorageError>;

    /// Persist a coupon (insert or replace)
    async fn save(&self, coupon: &Coupon) -> Result<(), StorageError>;

    /// All stored coupons, in no particular order
    async fn list(&self) -> Result<Vec<Coupon>, StorageError>;
}

/// In-memory coupon store
#[derive(Clone, Default)]
pub struct InMemoryCouponStore {
    coupons: Arc<RwLock<HashMap<String, Coupon>>>,
}

impl InMemoryCouponStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CouponStore for InMemoryCouponStore {
    async fn load(&self, code: &str) -> Result<Option<Coupon>, StorageError> {
        let coupons = self.coupons.read().await;
        Ok(coupons.get(code).cloned())
    }

    async fn save(&self, coupon: &Coupon) -> Result<(), StorageError> {
        let mut coupons = self.coupons.write().await;
        coupons.insert(coupon.code.clone(), coupon.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Coupon>, StorageError> {
        let coupons = self.coupons.read().await;
        Ok(coupons.values().cloned().collect())
    }
}
