//! Store lifecycle: startup warming and activation cleanup.

mod host;
mod manager;
mod preload;

pub use host::{HostControl, LoggingHostControl};
pub use manager::{ActivationReport, LifecycleManager, StartupReport};
pub use preload::PreloadSet;

#[cfg(test)]
pub use host::tests::RecordingHostControl;
