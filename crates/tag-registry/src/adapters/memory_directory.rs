//! In-Memory Directory
//!
//! Scope membership and claim grants in one place, standing in for the
//! chat platform's member and role lookups. Implements both
//! `MembershipProvider` and `ClaimsProvider`.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

use super::faults::FaultInjector;
use crate::domain::{ActorId, Claim, ClaimSet, CollaboratorError, ScopeId};
use crate::ports::outbound::{ClaimsProvider, MembershipProvider};

/// In-memory membership and claims.
#[derive(Default)]
pub struct InMemoryDirectory {
    members: RwLock<HashSet<(ScopeId, ActorId)>>,
    grants: RwLock<HashMap<(ScopeId, ActorId), ClaimSet>>,
    claim_lookups: AtomicUsize,
    faults: FaultInjector,
}

impl InMemoryDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fault queue consulted before every call.
    pub fn faults(&self) -> &FaultInjector {
        &self.faults
    }

    /// Add an actor to a scope.
    pub fn join(&self, scope: ScopeId, actor: ActorId) {
        self.members.write().insert((scope, actor));
    }

    /// Remove an actor from a scope. Their grants are dropped as well.
    pub fn leave(&self, scope: ScopeId, actor: ActorId) {
        self.members.write().remove(&(scope, actor));
        self.grants.write().remove(&(scope, actor));
    }

    /// Grant claims to an actor in a scope.
    pub fn grant(&self, scope: ScopeId, actor: ActorId, claims: &[Claim]) {
        let mut grants = self.grants.write();
        let set = grants.entry((scope, actor)).or_default();
        for claim in claims {
            set.insert(*claim);
        }
    }

    /// Drop every claim an actor holds in a scope.
    pub fn revoke_all(&self, scope: ScopeId, actor: ActorId) {
        self.grants.write().remove(&(scope, actor));
    }

    /// How many times claims were resolved.
    pub fn claim_lookups(&self) -> usize {
        self.claim_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MembershipProvider for InMemoryDirectory {
    async fn is_current_member(
        &self,
        scope: ScopeId,
        actor: ActorId,
    ) -> Result<bool, CollaboratorError> {
        self.faults.check("is_current_member").await?;
        Ok(self.members.read().contains(&(scope, actor)))
    }
}

#[async_trait]
impl ClaimsProvider for InMemoryDirectory {
    async fn resolve_claims(
        &self,
        scope: ScopeId,
        actor: ActorId,
    ) -> Result<ClaimSet, CollaboratorError> {
        self.faults.check("resolve_claims").await?;
        self.claim_lookups.fetch_add(1, Ordering::SeqCst);
        let claims = self
            .grants
            .read()
            .get(&(scope, actor))
            .cloned()
            .unwrap_or_default();
        debug!(
            "[tags] Resolved {} claim(s) for {} in {}",
            claims.len(),
            actor,
            scope
        );
        Ok(claims)
    }
}
