//! Startup and activation operations.

use std::sync::Arc;

use tracing::{info, warn};

use crate::lifecycle::host::HostControl;
use crate::lifecycle::preload::PreloadSet;
use crate::net::{InterceptedRequest, NetworkClient};
use crate::store::{CacheVersion, Store, StoreError};

/// Outcome of the startup preload pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StartupReport {
    /// Identities successfully fetched and stored.
    pub warmed: usize,
    /// Identities that failed to fetch or store.
    pub failed: usize,
}

/// Outcome of partition cleanup at activation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationReport {
    /// Stale partitions deleted.
    pub removed: Vec<CacheVersion>,
    /// Stale partitions whose deletion failed; skipped, never retried.
    pub skipped: Vec<CacheVersion>,
}

/// Governs store creation at startup and pruning at activation.
pub struct LifecycleManager {
    store: Arc<dyn Store>,
    network: Arc<dyn NetworkClient>,
    host: Arc<dyn HostControl>,
    version: CacheVersion,
}

impl LifecycleManager {
    pub fn new(
        store: Arc<dyn Store>,
        network: Arc<dyn NetworkClient>,
        host: Arc<dyn HostControl>,
        version: CacheVersion,
    ) -> Self {
        Self {
            store,
            network,
            host,
            version,
        }
    }

    /// Startup: open the current partition, warm the preload set, then
    /// request eager activation.
    ///
    /// Individual preload failures are logged and tolerated; only a failure
    /// to open the partition itself is surfaced.
    pub async fn startup(&self, preload: PreloadSet) -> Result<StartupReport, StoreError> {
        info!(version = %self.version, assets = preload.len(), "startup: warming store partition");
        self.store.open_partition(&self.version).await?;

        let mut report = StartupReport::default();
        for identity in preload {
            let request = InterceptedRequest::new(identity.method(), identity.url());
            match self.network.fetch(&request).await {
                Ok(response) if response.is_cacheable_success() => {
                    match self.store.put(&self.version, identity.clone(), response).await {
                        Ok(()) => report.warmed += 1,
                        Err(e) => {
                            warn!(identity = %identity, error = %e, "preload store write failed");
                            report.failed += 1;
                        }
                    }
                }
                Ok(response) => {
                    warn!(identity = %identity, status = response.status, "preload fetch returned non-success status");
                    report.failed += 1;
                }
                Err(e) => {
                    warn!(identity = %identity, error = %e, "preload fetch failed");
                    report.failed += 1;
                }
            }
        }

        // Supersede any previous instance immediately, whether or not every
        // asset warmed.
        self.host.skip_waiting().await;

        info!(
            version = %self.version,
            warmed = report.warmed,
            failed = report.failed,
            "startup complete"
        );
        Ok(report)
    }

    /// Activation: delete every partition that is not the current version,
    /// then take over all connected client sessions.
    ///
    /// Enumeration or deletion failures are logged and skipped; activation
    /// itself never fails.
    pub async fn activate(&self) -> ActivationReport {
        let mut report = ActivationReport::default();

        match self.store.list_partitions().await {
            Ok(versions) => {
                for stale in versions.into_iter().filter(|v| *v != self.version) {
                    match self.store.delete_partition(&stale).await {
                        Ok(_) => {
                            info!(partition = %stale, "deleted stale partition");
                            report.removed.push(stale);
                        }
                        Err(e) => {
                            warn!(partition = %stale, error = %e, "failed to delete stale partition, skipping");
                            report.skipped.push(stale);
                        }
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to enumerate store partitions, skipping cleanup");
            }
        }

        self.host.claim_clients().await;

        info!(
            version = %self.version,
            removed = report.removed.len(),
            skipped = report.skipped.len(),
            "activation complete"
        );
        report
    }
}
