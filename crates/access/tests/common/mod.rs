//! Test infrastructure for the access layer.
//!
//! Provides a populated world of collections and helpers shared by the
//! integration tests.

#![allow(dead_code)]

pub mod assertions;
pub mod fixtures;

// Re-export commonly used items
pub use assertions::*;
pub use fixtures::*;
