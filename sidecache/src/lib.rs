//! Sidecache - offline-first request interception agent.
//!
//! Keeps a client application working without a network by serving
//! previously-seen responses from a local versioned store, refreshing that
//! store as new responses arrive, and falling back to a designated offline
//! document when both network and store fail.
//!
//! # High-Level API
//!
//! ```ignore
//! use sidecache::agent::Agent;
//! use sidecache::config::AgentConfig;
//! use sidecache::store::DiskStore;
//! use std::sync::Arc;
//!
//! let config = AgentConfig::default().with_origin("https://fishlog.example");
//! let store = Arc::new(DiskStore::open(&config.store_dir).await?);
//! let agent = Agent::builder(config).store(store).build()?;
//!
//! agent.on_startup().await?;
//! agent.on_activate().await;
//! ```

pub mod agent;
pub mod config;
pub mod control;
pub mod lifecycle;
pub mod logging;
pub mod net;
pub mod store;
pub mod strategy;
pub mod tasks;

/// Library and CLI version, injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
