//! Strategy engine statistics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for how intercepted requests were resolved.
#[derive(Debug, Default)]
pub struct StrategyStats {
    store_hits: AtomicU64,
    store_misses: AtomicU64,
    network_served: AtomicU64,
    write_offline: AtomicU64,
    fallback_served: AtomicU64,
    absent: AtomicU64,
}

impl StrategyStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_store_hit(&self) {
        self.store_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_store_miss(&self) {
        self.store_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_network_served(&self) {
        self.network_served.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write_offline(&self) {
        self.write_offline.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallback_served(&self) {
        self.fallback_served.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_absent(&self) {
        self.absent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StrategyStatsSnapshot {
        StrategyStatsSnapshot {
            store_hits: self.store_hits.load(Ordering::Relaxed),
            store_misses: self.store_misses.load(Ordering::Relaxed),
            network_served: self.network_served.load(Ordering::Relaxed),
            write_offline: self.write_offline.load(Ordering::Relaxed),
            fallback_served: self.fallback_served.load(Ordering::Relaxed),
            absent: self.absent.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of resolution counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StrategyStatsSnapshot {
    /// Read requests served straight from the store.
    pub store_hits: u64,
    /// Read requests that had to consult the network.
    pub store_misses: u64,
    /// Responses returned from a live network fetch.
    pub network_served: u64,
    /// Write-path requests answered with the synthesized offline response.
    pub write_offline: u64,
    /// Read requests rescued by the offline fallback document.
    pub fallback_served: u64,
    /// Read requests where both network and fallback were unavailable.
    pub absent: u64,
}
