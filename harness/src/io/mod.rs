//! I/O helpers for harness commands.

pub mod config;
pub mod metrics;
pub mod run_log;
