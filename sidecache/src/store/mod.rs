//! Versioned key-value store for response snapshots.
//!
//! Entries are addressed by a normalized request identity and partitioned by
//! cache version. Partitions are created at startup, populated during
//! preload and opportunistically during normal operation, and deleted whole
//! when a newer version activates. There is no per-entry expiry or LRU.

mod disk;
mod memory;
mod stats;
mod traits;
mod types;

pub use disk::DiskStore;
pub use memory::MemoryStore;
pub use stats::{StoreStats, StoreStatsSnapshot};
pub use traits::{BoxFuture, NoOpStore, Store};
pub use types::{CacheVersion, Method, RequestIdentity, ResponseSnapshot, StoreError};
