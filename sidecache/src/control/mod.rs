//! Out-of-band control channel.
//!
//! Client sessions send loose JSON envelopes shaped `{type: string, ...}`.
//! Only `CLEAR_CACHE` is recognized; unrecognized commands are ignored
//! without an error or a reply. This is the only synchronous
//! request/response interaction outside the interception path.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::store::{CacheVersion, Store};

/// Commands the agent understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Delete the entire current-version store partition.
    ClearCache,
}

impl ControlCommand {
    /// Parse a command envelope. Returns `None` for anything unrecognized.
    pub fn parse(message: &Value) -> Option<Self> {
        match message.get("type").and_then(Value::as_str) {
            Some("CLEAR_CACHE") => Some(Self::ClearCache),
            _ => None,
        }
    }
}

/// Reply delivered on the caller-supplied channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlReply {
    pub success: bool,
}

/// Handles control messages against the current store partition.
pub struct ControlChannel {
    store: Arc<dyn Store>,
    version: CacheVersion,
}

impl ControlChannel {
    pub fn new(store: Arc<dyn Store>, version: CacheVersion) -> Self {
        Self { store, version }
    }

    /// Handle one control envelope.
    ///
    /// A recognized command replies on `reply`; an unrecognized one drops
    /// the sender so the caller sees the channel close without a payload.
    pub async fn handle(&self, message: Value, reply: oneshot::Sender<ControlReply>) {
        match ControlCommand::parse(&message) {
            Some(ControlCommand::ClearCache) => {
                let success = match self.store.delete_partition(&self.version).await {
                    // Deleting an already-absent partition still counts as a
                    // successful clear.
                    Ok(_) => true,
                    Err(e) => {
                        warn!(version = %self.version, error = %e, "cache clear failed");
                        false
                    }
                };

                info!(version = %self.version, success, "cache cleared by control message");
                // The requester may have gone away; that is not our problem.
                let _ = reply.send(ControlReply { success });
            }
            None => {
                debug!(message = %message, "ignoring unrecognized control message");
            }
        }
    }
}
