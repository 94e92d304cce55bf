//! Request resolution strategies.
//!
//! For every intercepted request the engine picks one of three paths, in
//! this order:
//!
//! 1. Mutating requests to the remote write endpoint are network-first with
//!    no store fallback; a transport failure synthesizes a structured 503.
//! 2. Everything else is cache-first: store hit wins, otherwise fetch and
//!    opportunistically persist a duplicate in the background.
//! 3. When both network and store fail, serve the offline fallback document
//!    if present, else report the response as absent.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, warn};

use crate::config::AgentConfig;
use crate::net::{InterceptedRequest, NetworkClient};
use crate::store::{CacheVersion, RequestIdentity, ResponseSnapshot, Store};
use crate::strategy::stats::{StrategyStats, StrategyStatsSnapshot};
use crate::tasks;

/// The decision core of the agent.
///
/// Shared across all concurrent request resolutions; cheap to clone via
/// `Arc`. There is no locking around the lookup-fetch-write sequence:
/// concurrent writes for the same identity race last-write-wins, which is
/// acceptable for a best-effort cache.
pub struct StrategyEngine {
    store: Arc<dyn Store>,
    network: Arc<dyn NetworkClient>,
    version: CacheVersion,
    offline_fallback: RequestIdentity,
    write_endpoint_host: String,
    stats: Arc<StrategyStats>,
}

impl StrategyEngine {
    pub fn new(
        store: Arc<dyn Store>,
        network: Arc<dyn NetworkClient>,
        config: &AgentConfig,
    ) -> Self {
        Self {
            store,
            network,
            version: config.cache_version.clone(),
            offline_fallback: config.offline_fallback_identity(),
            write_endpoint_host: config.write_endpoint_host.clone(),
            stats: Arc::new(StrategyStats::new()),
        }
    }

    /// Resolve one intercepted request.
    ///
    /// Returns `None` only on the read path when the network is down and the
    /// offline fallback document was never stored. The write path always
    /// produces a response.
    pub async fn resolve(&self, request: InterceptedRequest) -> Option<ResponseSnapshot> {
        if self.is_write_endpoint(&request) {
            Some(self.resolve_write(request).await)
        } else {
            self.resolve_read(request).await
        }
    }

    /// Resolution counters.
    pub fn stats(&self) -> StrategyStatsSnapshot {
        self.stats.snapshot()
    }

    fn is_write_endpoint(&self, request: &InterceptedRequest) -> bool {
        request.method.is_mutating()
            && request
                .host()
                .is_some_and(|host| host.contains(&self.write_endpoint_host))
    }

    /// Network-first, never touches the store: these requests have side
    /// effects on the remote system and must not be answered from stale
    /// local data.
    async fn resolve_write(&self, request: InterceptedRequest) -> ResponseSnapshot {
        match self.network.fetch(&request).await {
            Ok(response) => {
                debug!(url = %request.url, status = response.status, "write request forwarded");
                self.stats.record_network_served();
                response
            }
            Err(e) => {
                warn!(url = %request.url, error = %e, "write endpoint unreachable, synthesizing offline response");
                self.stats.record_write_offline();
                offline_write_response()
            }
        }
    }

    async fn resolve_read(&self, request: InterceptedRequest) -> Option<ResponseSnapshot> {
        let identity = request.identity();

        // Store lookup always happens before any write this request may
        // trigger, so a request never observes its own just-written value.
        match self.store.get(&self.version, &identity).await {
            Ok(Some(snapshot)) => {
                debug!(identity = %identity, "served from store");
                self.stats.record_store_hit();
                return Some(snapshot);
            }
            Ok(None) => {
                self.stats.record_store_miss();
            }
            Err(e) => {
                // A failing store degrades to a plain network fetch.
                warn!(identity = %identity, error = %e, "store lookup failed");
                self.stats.record_store_miss();
            }
        }

        match self.network.fetch(&request).await {
            Ok(response) => {
                if response.is_cacheable_success() {
                    self.persist_in_background(identity, response.clone());
                }
                self.stats.record_network_served();
                Some(response)
            }
            Err(e) => {
                warn!(url = %request.url, error = %e, "network fetch failed, trying offline fallback");
                self.serve_offline_fallback().await
            }
        }
    }

    /// Duplicate the response into the store without delaying the caller.
    fn persist_in_background(&self, identity: RequestIdentity, snapshot: ResponseSnapshot) {
        let store = Arc::clone(&self.store);
        let version = self.version.clone();

        tasks::spawn_best_effort("store-write", async move {
            store.put(&version, identity, snapshot).await
        });
    }

    async fn serve_offline_fallback(&self) -> Option<ResponseSnapshot> {
        match self.store.get(&self.version, &self.offline_fallback).await {
            Ok(Some(snapshot)) => {
                debug!(fallback = %self.offline_fallback, "served offline fallback");
                self.stats.record_fallback_served();
                Some(snapshot)
            }
            Ok(None) => {
                warn!(fallback = %self.offline_fallback, "offline fallback not in store, response absent");
                self.stats.record_absent();
                None
            }
            Err(e) => {
                warn!(fallback = %self.offline_fallback, error = %e, "offline fallback lookup failed");
                self.stats.record_absent();
                None
            }
        }
    }
}

/// The machine-readable offline signal for the write path. Callers get a
/// well-formed 503 instead of a raw network error.
fn offline_write_response() -> ResponseSnapshot {
    ResponseSnapshot::json(
        503,
        &json!({ "ok": false, "error": "Offline - POST not available" }),
    )
}
