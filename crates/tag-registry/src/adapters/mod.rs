//! # Adapters Layer (Hexagonal Architecture)
//!
//! In-memory implementations of every outbound port, with fault injection
//! for exercising timeouts and retries.

mod faults;
mod memory_directory;
mod memory_prefix;
mod memory_store;

pub use faults::{Fault, FaultInjector};
pub use memory_directory::InMemoryDirectory;
pub use memory_prefix::InMemoryPrefixStore;
pub use memory_store::InMemoryTagStore;
