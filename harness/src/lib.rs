//! Query synthesis and run-metrics validation for the listing-search harness.
//!
//! The crate keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (catalog lookup, phrasing rules,
//!   failure vocabulary). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (config files, metrics documents,
//!   run-log folders).
//!
//! The `harness` binary wires both halves into CLI commands.

pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
