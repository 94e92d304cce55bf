//! Request-handling strategy engine.

mod engine;
mod stats;

pub use engine::StrategyEngine;
pub use stats::{StrategyStats, StrategyStatsSnapshot};
