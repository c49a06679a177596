//! BARON Simulator Integration Tests
//!
//! End-to-end handover sessions across the crypto, core and simulator crates.
//!
//! ## Test Categories
//!
//! - `handover`: scenario flows (plain, cross-AMF, fast and core recovery, rejection)
//! - `property`: property-based tests over random placements

pub mod common;
pub mod handover;
pub mod property;

// Re-export common test utilities
pub use common::*;
