//! # Isle Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Determinism harness for generation, placement and save/load
//! - Hand-built grid fixtures
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;

/// Re-export proptest for convenience.
pub use proptest;
