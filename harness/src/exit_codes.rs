//! Stable exit codes for harness CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Command failed due to invalid config, unreadable/malformed documents, or other errors.
pub const INVALID: i32 = 1;
/// Input was rejected: incoherent cardinality, unknown template, or an
/// out-of-vocabulary failure reason.
pub const REJECTED: i32 = 2;
