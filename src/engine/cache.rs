use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[cfg(debug_assertions)]
use crate::config::PRINT_CACHE_EVENTS;
use crate::config::{SNAPSHOT_MAX_ENTRIES, SNAPSHOT_TTL_SECS};
use crate::error::Result;
use crate::models::PriceSeries;

use super::pipeline::analyze;
use super::request::{AnalysisReport, AnalysisRequest};

// --- The cache key struct ---
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct SnapshotKey {
    symbol: String,
    period: String,
    timeframe: String,
    /// Config and study selection, so a changed parameter never returns a stale report
    fingerprint: String,
}

impl SnapshotKey {
    fn from_request(request: &AnalysisRequest) -> Self {
        Self {
            symbol: request.symbol.clone(),
            period: request.period.clone(),
            timeframe: request.timeframe.clone(),
            fingerprint: request.fingerprint(),
        }
    }
}

#[derive(Debug)]
struct Snapshot {
    report: Arc<AnalysisReport>,
    stored_at: Instant,
}

/// Session-scoped store of finished analyses keyed by symbol, period and timeframe.
///
/// Reports are shared as `Arc`s and expire after a fixed time-to-live. Clones
/// share the same underlying store.
#[derive(Clone, Debug)]
pub struct SnapshotCache {
    entries: Arc<Mutex<HashMap<SnapshotKey, Snapshot>>>,
    ttl: Duration,
    max_entries: usize,
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::with_ttl(Duration::from_secs(SNAPSHOT_TTL_SECS))
    }
}

impl SnapshotCache {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            ttl,
            max_entries: SNAPSHOT_MAX_ENTRIES,
        }
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self
    }

    /// Fresh report for `request`, if one is cached.
    pub fn get(&self, request: &AnalysisRequest) -> Option<Arc<AnalysisReport>> {
        let key = SnapshotKey::from_request(request);
        if let Ok(entries) = self.entries.lock()
            && let Some(snapshot) = entries.get(&key)
            && snapshot.stored_at.elapsed() < self.ttl
        {
            return Some(Arc::clone(&snapshot.report));
        }
        None
    }

    /// Return the cached report or run the analysis and cache its result.
    /// Failed analyses are not cached.
    pub fn get_or_analyze(
        &self,
        prices: &PriceSeries,
        request: &AnalysisRequest,
    ) -> Result<Arc<AnalysisReport>> {
        if let Some(report) = self.get(request) {
            #[cfg(debug_assertions)]
            if PRINT_CACHE_EVENTS {
                log::info!(
                    "Snapshot cache HIT for {} {} {}",
                    request.symbol,
                    request.period,
                    request.timeframe
                );
            }
            return Ok(report);
        }

        #[cfg(debug_assertions)]
        if PRINT_CACHE_EVENTS {
            log::info!(
                "Snapshot cache MISS for {} {} {}, analysing {} bars...",
                request.symbol,
                request.period,
                request.timeframe,
                prices.len()
            );
        }

        // Computed outside the lock
        let report = Arc::new(analyze(prices, request)?);
        self.insert(request, Arc::clone(&report));
        Ok(report)
    }

    pub fn insert(&self, request: &AnalysisRequest, report: Arc<AnalysisReport>) {
        let key = SnapshotKey::from_request(request);
        if let Ok(mut entries) = self.entries.lock() {
            let ttl = self.ttl;
            entries.retain(|_, snapshot| snapshot.stored_at.elapsed() < ttl);

            if entries.len() >= self.max_entries
                && !entries.contains_key(&key)
                && let Some(oldest) = entries
                    .iter()
                    .min_by_key(|(_, snapshot)| snapshot.stored_at)
                    .map(|(key, _)| key.clone())
            {
                entries.remove(&oldest);
            }

            entries.insert(
                key,
                Snapshot {
                    report,
                    stored_at: Instant::now(),
                },
            );
        }
    }

    /// Drop every snapshot, e.g. after the underlying price data was reloaded.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
