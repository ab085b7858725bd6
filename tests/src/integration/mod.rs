//! # Integration Tests
//!
//! Cross-component behaviour of the registry, wired to in-memory
//! collaborators.

pub mod collaborators;
pub mod scenarios;
