//! Deterministic, pure logic shared by the harness.
//!
//! Core modules must be free of I/O side effects. They operate on immutable
//! tables injected by the caller and return deterministic outputs suitable for
//! tests.

pub mod catalog;
pub mod synth;
pub mod vocabulary;
