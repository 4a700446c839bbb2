//! Quota persistence seam
//!
//! `try_consume` is the whole hot path as one primitive: roll the day over
//! if needed, then increment-then-check under a single lock. Folding the
//! claim into the store keeps two racing requests from both reading
//! `current < max` and both landing an increment past the cap.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mentora_types::StorageError;
use tokio::sync::RwLock;

use crate::quota::{DailyQuotas, LimitKind, Quota};

/// Result of one atomic claim attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// One slot consumed
    Claimed { remaining: u32 },
    /// Kind has no quota entry; admit without counting
    Unconfigured,
    /// Quota full for the day; nothing consumed
    Exhausted { max: u32 },
}

/// Storage for the singleton quota configuration
#[async_trait]
pub trait QuotaStore: Send + Sync {
    /// Atomically roll the day over if `now` crossed a UTC date boundary,
    /// then claim one slot for `kind`
    async fn try_consume(
        &self,
        kind: &LimitKind,
        now: DateTime<Utc>,
    ) -> Result<ClaimOutcome, StorageError>;

    /// Create or update the quota entry for `kind`; creates the singleton on
    /// first use
    async fn configure(
        &self,
        kind: &LimitKind,
        max: u32,
        now: DateTime<Utc>,
    ) -> Result<DailyQuotas, StorageError>;

    /// Drop the quota entry for `kind`, making it unlimited again
    async fn remove(&self, kind: &LimitKind) -> Result<(), StorageError>;

    /// Raw stored snapshot; `None` before the first `configure`
    async fn load(&self) -> Result<Option<DailyQuotas>, StorageError>;
}

/// In-memory quota store
#[derive(Clone, Default)]
pub struct InMemoryQuotaStore {
    state: Arc<RwLock<Option<DailyQuotas>>>,
}

impl InMemoryQuotaStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuotaStore for InMemoryQuotaStore {
    async fn try_consume(
        &self,
        kind: &LimitKind,
        now: DateTime<Utc>,
    ) -> Result<ClaimOutcome, StorageError> {
        let mut state = self.state.write().await;
        let Some(quotas) = state.as_mut() else {
            return Ok(ClaimOutcome::Unconfigured);
        };

        quotas.roll_over(now);

        let Some(quota) = quotas.quotas.get_mut(kind) else {
            return Ok(ClaimOutcome::Unconfigured);
        };
        if quota.is_exhausted() {
            return Ok(ClaimOutcome::Exhausted { max: quota.max });
        }
        quota.current += 1;
        Ok(ClaimOutcome::Claimed {
            remaining: quota.remaining(),
        })
    }

    async fn configure(
        &self,
        kind: &LimitKind,
        max: u32,
        now: DateTime<Utc>,
    ) -> Result<DailyQuotas, StorageError> {
        let mut state = self.state.write().await;
        let quotas = state.get_or_insert_with(|| DailyQuotas::new(now));
        quotas.roll_over(now);
        quotas
            .quotas
            .entry(kind.clone())
            .and_modify(|q| q.max = max)
            .or_insert_with(|| Quota::new(max));
        Ok(quotas.clone())
    }

    async fn remove(&self, kind: &LimitKind) -> Result<(), StorageError> {
        let mut state = self.state.write().await;
        if let Some(quotas) = state.as_mut() {
            quotas.quotas.remove(kind);
        }
        Ok(())
    }

    async fn load(&self) -> Result<Option<DailyQuotas>, StorageError> {
        let state = self.state.read().await;
        Ok(state.clone())
    }
}
