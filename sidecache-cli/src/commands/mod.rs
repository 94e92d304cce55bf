//! CLI subcommand implementations.

pub mod clear;
pub mod fetch;
pub mod warm;
