//! # Tag Registry Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── benchmarks/       # Criterion benchmark bodies
//! │   └── resolution.rs
//! │
//! └── integration/      # Cross-component behaviour
//!     ├── scenarios.rs  # End-to-end command flows
//!     ├── concurrency.rs# Races on create, invoke and ownership
//!     └── collaborators.rs # Timeouts, retries, telemetry
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p tag-registry-tests
//!
//! # By category
//! cargo test -p tag-registry-tests integration::concurrency
//!
//! # Benchmarks
//! cargo bench -p tag-registry-tests
//! ```

#![allow(unused_variables)]
#![allow(unused_imports)]
#![allow(dead_code)]

pub mod integration;

use std::sync::Arc;
use tag_registry::{
    Actor, ActorId, Claim, InMemoryDirectory, InMemoryPrefixStore, InMemoryTagStore,
    PrefixService, RegistryConfig, ScopeId, TagRegistryService,
};

/// Registry wired to in-memory collaborators.
pub type MemoryRegistry = TagRegistryService<InMemoryTagStore, InMemoryDirectory, InMemoryDirectory>;

/// Prefix service wired to in-memory collaborators.
pub type MemoryPrefixes = PrefixService<InMemoryPrefixStore, InMemoryDirectory>;

/// A complete in-memory deployment.
pub struct Harness {
    /// Tag persistence.
    pub store: Arc<InMemoryTagStore>,
    /// Membership and claims.
    pub directory: Arc<InMemoryDirectory>,
    /// Prefix overrides.
    pub prefixes: Arc<InMemoryPrefixStore>,
    /// Tag engine.
    pub registry: Arc<MemoryRegistry>,
    /// Prefix engine.
    pub prefix_service: Arc<MemoryPrefixes>,
}

impl Harness {
    /// Build a harness with the testing configuration.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::for_testing())
    }

    /// Build a harness with a custom configuration.
    pub fn with_config(config: RegistryConfig) -> Self {
        let store = Arc::new(InMemoryTagStore::new());
        let directory = Arc::new(InMemoryDirectory::new());
        let prefixes = Arc::new(InMemoryPrefixStore::new());
        let registry = Arc::new(TagRegistryService::new(
            store.clone(),
            directory.clone(),
            directory.clone(),
            config.clone(),
        ));
        let prefix_service = Arc::new(PrefixService::new(
            prefixes.clone(),
            directory.clone(),
            config,
        ));
        Self {
            store,
            directory,
            prefixes,
            registry,
            prefix_service,
        }
    }

    /// Register a member of `scope` holding `claims`.
    pub fn member(&self, scope: ScopeId, id: u64, claims: &[Claim]) -> Actor {
        self.directory.join(scope, ActorId(id));
        self.directory.grant(scope, ActorId(id), claims);
        Actor::member(id)
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
