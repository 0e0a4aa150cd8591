//! Atomic fan-out statistics counters.
//!
//! All atomics use `Relaxed` ordering: these are monotonic display counters
//! with no synchronization requirements.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

#[derive(Default)]
struct StatsInner {
    requests: AtomicU64,
    empty_routes: AtomicU64,
    short_circuits: AtomicU64,
    races: AtomicU64,
    failovers_skipped: AtomicU64,
    all_failed: AtomicU64,
    detached: AtomicU64,
    drained: AtomicU64,
    aborted: AtomicU64,
}

/// Thread-safe route statistics. Cheap to clone (Arc); clones share counters.
#[derive(Clone, Default)]
pub struct RouteStats {
    inner: Arc<StatsInner>,
}

/// Snapshot of current counter values, serializable to JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub requests: u64,
    pub empty_routes: u64,
    pub short_circuits: u64,
    pub races: u64,
    pub failovers_skipped: u64,
    pub all_failed: u64,
    pub detached: u64,
    pub drained: u64,
    pub aborted: u64,
}

impl RouteStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_requests(&self) {
        self.inner.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_empty_routes(&self) {
        self.inner.empty_routes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_short_circuits(&self) {
        self.inner.short_circuits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_races(&self) {
        self.inner.races.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_failovers_skipped(&self) {
        self.inner.failovers_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_all_failed(&self) {
        self.inner.all_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_detached(&self, n: u64) {
        self.inner.detached.fetch_add(n, Ordering::Relaxed);
    }

    pub fn inc_drained(&self) {
        self.inner.drained.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_aborted(&self, n: u64) {
        self.inner.aborted.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            requests: self.inner.requests.load(Ordering::Relaxed),
            empty_routes: self.inner.empty_routes.load(Ordering::Relaxed),
            short_circuits: self.inner.short_circuits.load(Ordering::Relaxed),
            races: self.inner.races.load(Ordering::Relaxed),
            failovers_skipped: self.inner.failovers_skipped.load(Ordering::Relaxed),
            all_failed: self.inner.all_failed.load(Ordering::Relaxed),
            detached: self.inner.detached.load(Ordering::Relaxed),
            drained: self.inner.drained.load(Ordering::Relaxed),
            aborted: self.inner.aborted.load(Ordering::Relaxed),
        }
    }
}
