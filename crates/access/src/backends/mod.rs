//! Storage backend implementations.
//!
//! The resolver only depends on the [`Model`](crate::core::Model) traits.
//! Production stores implement them outside this crate.
//!
//! # Available Backends
//!
//! | Backend | Description |
//! |---------|-------------|
//! | `memory` | In-memory collections with JSON fixtures, for tools and tests |

pub mod memory;
