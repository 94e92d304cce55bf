//! Host runtime control primitives.

use tracing::info;

use crate::store::BoxFuture;

/// Seam for the host-runtime takeover primitives.
///
/// Activation in this system is eager: a freshly started instance supersedes
/// any previously running one without waiting for its client sessions to
/// disconnect (`skip_waiting`), and after cleanup it takes control of all
/// currently connected sessions rather than only future ones
/// (`claim_clients`). The host runtime supplies the real implementations;
/// tests substitute recording mocks.
pub trait HostControl: Send + Sync {
    /// Supersede the previous instance immediately.
    fn skip_waiting(&self) -> BoxFuture<'_, ()>;

    /// Take control of all currently connected client sessions.
    fn claim_clients(&self) -> BoxFuture<'_, ()>;
}

/// Default host control that only logs; used when no host runtime is
/// attached (tests, CLI).
#[derive(Debug, Default)]
pub struct LoggingHostControl;

impl LoggingHostControl {
    pub fn new() -> Self {
        Self
    }
}

impl HostControl for LoggingHostControl {
    fn skip_waiting(&self) -> BoxFuture<'_, ()> {
        Box::pin(async {
            info!("eager activation requested (skip waiting)");
        })
    }

    fn claim_clients(&self) -> BoxFuture<'_, ()> {
        Box::pin(async {
            info!("claiming all connected client sessions");
        })
    }
}
