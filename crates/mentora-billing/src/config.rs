//! Billing configuration

use mentora_limiter::LimitKind;
use mentora_types::Currency;
use tracing::warn;

/// Configuration for a billing service instance
#[derive(Debug, Clone)]
pub struct BillingConfig {
    /// Unit every wallet in this deployment is denominated in
    pub currency: Currency,
    /// Daily caps seeded into the limiter at startup
    pub daily_limits: Vec<(LimitKind, u32)>,
    /// Buffer size of the wallet event channel
    pub event_capacity: usize,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            currency: Currency::inr(),
            daily_limits: Vec::new(),
            event_capacity: 256,
        }
    }
}

impl BillingConfig {
    /// Create config from environment variables
    ///
    /// `MENTORA_DAILY_LIMITS` is a comma-separated `kind=max` list, e.g.
    /// `mock_interview=2,quiz=10`.
    pub fn from_env() -> Self {
        Self {
            currency: std::env::var("MENTORA_CURRENCY")
                .map(Currency::new)
                .unwrap_or_default(),
            daily_limits: std::env::var("MENTORA_DAILY_LIMITS")
                .map(|s| parse_daily_limits(&s))
                .unwrap_or_default(),
            event_capacity: std::env::var("MENTORA_EVENT_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(256),
        }
    }
}

/// Parse a `kind=max,kind=max` list, dropping entries that do not parse
fn parse_daily_limits(raw: &str) -> Vec<(LimitKind, u32)> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| {
            let parsed = entry
                .split_once('=')
                .and_then(|(kind, max)| Some((kind.trim(), max.trim().parse::<u32>().ok()?)))
                .filter(|(kind, _)| !kind.is_empty());
            match parsed {
                Some((kind, max)) => Some((LimitKind::new(kind), max)),
                None => {
                    warn!(entry, "ignoring malformed daily limit entry");
                    None
                }
            }
        })
        .collect()
}
