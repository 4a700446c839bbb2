//! Global admission gate

use std::sync::Arc;

use mentora_types::{Actor, SharedClock};
use tracing::warn;

use crate::quota::{DailyQuotas, LimitKind};
use crate::store::{ClaimOutcome, QuotaStore};
use crate::{LimiterError, Result};

/// How a request made it past the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// A quota slot was consumed
    Admitted { remaining: u32 },
    /// Admin actors skip the gate without consuming anything
    Bypassed,
    /// No quota is configured for this kind
    Unlimited,
    /// The store failed; availability wins over enforcement
    FailOpen,
}

/// The Mentora global limiter
///
/// One instance gates the whole deployment; counters are shared across all
/// accounts.
#[derive(Clone)]
pub struct GlobalLimiter {
    store: Arc<dyn QuotaStore>,
    clock: SharedClock,
}

impl GlobalLimiter {
    pub fn new(store: Arc<dyn QuotaStore>, clock: SharedClock) -> Self {
        Self { store, clock }
    }

    /// Gate one operation of `kind` for `actor`
    ///
    /// The only hot-path error is `LimitExceeded`; a storage failure is
    /// logged and admits the request.
    pub async fn check_and_consume(&self, actor: &Actor, kind: &LimitKind) -> Result<Admission> {
        if actor.is_admin {
            return Ok(Admission::Bypassed);
        }

        match self.store.try_consume(kind, self.clock.now()).await {
            Ok(ClaimOutcome::Claimed { remaining }) => Ok(Admission::Admitted { remaining }),
            Ok(ClaimOutcome::Unconfigured) => Ok(Admission::Unlimited),
            Ok(ClaimOutcome::Exhausted { max }) => Err(LimiterError::LimitExceeded {
                kind: kind.clone(),
                max,
            }),
            Err(error) => {
                warn!(%kind, %error, "quota store unavailable, admitting without enforcement");
                Ok(Admission::FailOpen)
            }
        }
    }

    /// Set or update the daily cap for a kind
    pub async fn configure(&self, kind: &LimitKind, max: u32) -> Result<DailyQuotas> {
        Ok(self.store.configure(kind, max, self.clock.now()).await?)
    }

    /// Make a kind unlimited again
    pub async fn remove(&self, kind: &LimitKind) -> Result<()> {
        Ok(self.store.remove(kind).await?)
    }

    /// Counters as the next claim would see them
    pub async fn status(&self) -> Result<DailyQuotas> {
        let now = self.clock.now();
        Ok(self
            .store
            .load()
            .await?
            .map(|quotas| quotas.effective(now))
            .unwrap_or_else(|| DailyQuotas::new(now)))
    }
}
