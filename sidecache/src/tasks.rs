//! Best-effort background tasks.
//!
//! The opportunistic store write after a network read is fire-and-forget:
//! the caller already has its response, so a failed write only costs a
//! future cache hit. Failures are observable via logging only.

use std::future::Future;

use tokio::task::JoinHandle;
use tracing::{trace, warn};

/// Spawn a detached task whose failure is logged and otherwise ignored.
///
/// The returned handle can be awaited in tests but callers normally drop it.
pub fn spawn_best_effort<F, E>(name: &'static str, future: F) -> JoinHandle<()>
where
    F: Future<Output = Result<(), E>> + Send + 'static,
    E: std::fmt::Display,
{
    tokio::spawn(async move {
        match future.await {
            Ok(()) => trace!(task = name, "background task complete"),
            Err(e) => warn!(task = name, error = %e, "background task failed"),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_spawn_best_effort_runs_task() {
        let ran = Arc::new(AtomicBool::new(false));
        let ran_clone = Arc::clone(&ran);

        spawn_best_effort("test", async move {
            ran_clone.store(true, Ordering::SeqCst);
            Ok::<(), std::io::Error>(())
        })
        .await
        .unwrap();

        assert!(ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_spawn_best_effort_swallows_errors() {
        // The task fails; the handle still resolves cleanly.
        spawn_best_effort("test", async {
            Err::<(), std::io::Error>(std::io::Error::other("boom"))
        })
        .await
        .unwrap();
    }
}
