use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::debug;

// A finished identifier lookup. `ticker: None` records that the mapping API
// had no entry for the ISIN, which is worth remembering too.
#[derive(Debug, Clone)]
struct CachedResolution {
    ticker: Option<String>,
    resolved_at: DateTime<Utc>,
    ttl_hours: i64,
}

/// Thread-safe cache of ISIN-to-ticker lookups, so repeated uploads of the
/// same export do not re-hit the mapping API. Successful mappings are kept
/// for a day; misses expire after an hour since identifier coverage grows.
#[derive(Clone, Default)]
pub struct ResolutionCache {
    entries: Arc<DashMap<String, CachedResolution>>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
        }
    }

    /// Returns `Some(outcome)` when a live entry exists, where the outcome
    /// is the cached ticker or a cached miss. Expired entries are removed
    /// on the way out.
    pub fn lookup(&self, isin: &str) -> Option<Option<String>> {
        if let Some(entry) = self.entries.get(isin) {
            let age = Utc::now() - entry.resolved_at;
            if age < Duration::hours(entry.ttl_hours) {
                return Some(entry.ticker.clone());
            }
            drop(entry);
            self.entries.remove(isin);
            debug!("Expired cached resolution for {}", isin);
        }
        None
    }

    pub fn store(&self, isin: &str, ticker: Option<String>) {
        let ttl_hours = ttl_hours_for(&ticker);
        self.entries.insert(
            isin.to_string(),
            CachedResolution {
                ticker,
                resolved_at: Utc::now(),
                ttl_hours,
            },
        );
    }
}

fn ttl_hours_for(ticker: &Option<String>) -> i64 {
    match ticker {
        Some(_) => 24,
        None => 1,
    }
}
