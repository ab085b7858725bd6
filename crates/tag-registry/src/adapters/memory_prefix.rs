//! In-memory `PrefixStore`.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

use super::faults::FaultInjector;
use crate::domain::{CollaboratorError, ScopeId};
use crate::ports::outbound::PrefixStore;

/// Per-scope prefix overrides held in memory.
#[derive(Default)]
pub struct InMemoryPrefixStore {
    prefixes: RwLock<HashMap<ScopeId, String>>,
    faults: FaultInjector,
}

impl InMemoryPrefixStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fault queue consulted before every call.
    pub fn faults(&self) -> &FaultInjector {
        &self.faults
    }
}

#[async_trait]
impl PrefixStore for InMemoryPrefixStore {
    async fn get_prefix(&self, scope: ScopeId) -> Result<Option<String>, CollaboratorError> {
        self.faults.check("get_prefix").await?;
        Ok(self.prefixes.read().get(&scope).cloned())
    }

    async fn set_prefix(&self, scope: ScopeId, prefix: &str) -> Result<(), CollaboratorError> {
        self.faults.check("set_prefix").await?;
        debug!("[tags] Prefix for {} set to {:?}", scope, prefix);
        self.prefixes.write().insert(scope, prefix.to_string());
        Ok(())
    }
}
