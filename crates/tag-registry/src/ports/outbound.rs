//! # Outbound Ports
//!
//! Traits for the registry's collaborators: persistence, membership,
//! claims and prefix storage. Implementations must be safe to call
//! concurrently; the registry holds no locks of its own.

use async_trait::async_trait;

use crate::domain::{
    ActorId, ClaimSet, CollaboratorError, OwnerExpectation, ScopeId, Tag, TagPatch,
};

/// Tag persistence - outbound port.
///
/// Names passed in are already lower-cased. The store must provide atomic
/// create-if-absent, atomic use increments and compare-and-swap owner
/// updates.
#[async_trait]
pub trait TagStore: Send + Sync {
    /// Fetch a tag by exact name.
    async fn get_tag(&self, scope: ScopeId, name: &str) -> Result<Option<Tag>, CollaboratorError>;

    /// Insert a tag unless one exists under the same (scope, name).
    ///
    /// Fails with [`CollaboratorError::Conflict`] when the name is taken.
    async fn create_tag(&self, tag: Tag) -> Result<Tag, CollaboratorError>;

    /// Apply a patch if the stored owner satisfies `expected_owner`.
    ///
    /// Fails with [`CollaboratorError::CasFailure`] carrying the stored owner
    /// when it does not.
    async fn update_tag(
        &self,
        scope: ScopeId,
        name: &str,
        patch: TagPatch,
        expected_owner: OwnerExpectation,
    ) -> Result<Tag, CollaboratorError>;

    /// Remove a tag and return it.
    async fn delete_tag(&self, scope: ScopeId, name: &str) -> Result<Tag, CollaboratorError>;

    /// Atomically add one use. Returns the new count.
    async fn increment_use(&self, scope: ScopeId, name: &str) -> Result<u64, CollaboratorError>;

    /// Every tag in the scope, in creation order.
    async fn list_tags(&self, scope: ScopeId) -> Result<Vec<Tag>, CollaboratorError>;

    /// Backend-side partial name search, best first.
    async fn search_tags(
        &self,
        scope: ScopeId,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Tag>, CollaboratorError>;
}

/// Scope membership - outbound port.
#[async_trait]
pub trait MembershipProvider: Send + Sync {
    /// Whether the actor currently belongs to the scope.
    async fn is_current_member(
        &self,
        scope: ScopeId,
        actor: ActorId,
    ) -> Result<bool, CollaboratorError>;
}

/// Claim resolution - outbound port.
///
/// Called once per request that needs it; results are never cached.
#[async_trait]
pub trait ClaimsProvider: Send + Sync {
    /// Claims the actor holds in the scope.
    async fn resolve_claims(
        &self,
        scope: ScopeId,
        actor: ActorId,
    ) -> Result<ClaimSet, CollaboratorError>;
}

/// Per-scope prefix storage - outbound port.
#[async_trait]
pub trait PrefixStore: Send + Sync {
    /// The stored override, if any.
    async fn get_prefix(&self, scope: ScopeId) -> Result<Option<String>, CollaboratorError>;

    /// Store an override. Last write wins.
    async fn set_prefix(&self, scope: ScopeId, prefix: &str) -> Result<(), CollaboratorError>;
}
