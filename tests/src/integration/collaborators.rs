//! # Collaborator Failure Tests
//!
//! Timeouts, transient failures and lost compare-and-swap races, driven
//! through fault injection and a store that interleaves a competing writer.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tag_registry::{
    ActorId, CollaboratorError, InMemoryTagStore, OwnerExpectation, ScopeId, Tag, TagPatch,
    TagStore,
};

/// Store that lets a competing writer take the tag right before each
/// update, once per queued intruder.
pub struct RacingStore {
    inner: InMemoryTagStore,
    intruders: Mutex<VecDeque<ActorId>>,
}

impl RacingStore {
    /// Stage one race per intruder, in order.
    pub fn new(intruders: impl IntoIterator<Item = ActorId>) -> Self {
        Self {
            inner: InMemoryTagStore::new(),
            intruders: Mutex::new(intruders.into_iter().collect()),
        }
    }

    /// The wrapped store.
    pub fn inner(&self) -> &InMemoryTagStore {
        &self.inner
    }
}

#[async_trait]
impl TagStore for RacingStore {
    async fn get_tag(&self, scope: ScopeId, name: &str) -> Result<Option<Tag>, CollaboratorError> {
        self.inner.get_tag(scope, name).await
    }

    async fn create_tag(&self, tag: Tag) -> Result<Tag, CollaboratorError> {
        self.inner.create_tag(tag).await
    }

    async fn update_tag(
        &self,
        scope: ScopeId,
        name: &str,
        patch: TagPatch,
        expected_owner: OwnerExpectation,
    ) -> Result<Tag, CollaboratorError> {
        let intruder = self.intruders.lock().pop_front();
        if let Some(intruder) = intruder {
            let seen = self.inner.get_tag(scope, name).await?.and_then(|t| t.owner_id);
            self.inner
                .update_tag(scope, name, TagPatch::Owner(intruder), OwnerExpectation(seen))
                .await?;
        }
        self.inner.update_tag(scope, name, patch, expected_owner).await
    }

    async fn delete_tag(&self, scope: ScopeId, name: &str) -> Result<Tag, CollaboratorError> {
        self.inner.delete_tag(scope, name).await
    }

    async fn increment_use(&self, scope: ScopeId, name: &str) -> Result<u64, CollaboratorError> {
        self.inner.increment_use(scope, name).await
    }

    async fn list_tags(&self, scope: ScopeId) -> Result<Vec<Tag>, CollaboratorError> {
        self.inner.list_tags(scope).await
    }

    async fn search_tags(
        &self,
        scope: ScopeId,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Tag>, CollaboratorError> {
        self.inner.search_tags(scope, query, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Harness;
    use std::sync::Arc;
    use std::time::Duration;
    use tag_registry::{
        Actor, Claim, ConflictKind, DenialReason, Fault, InMemoryDirectory, RegistryConfig,
        RegistryError, TagPrefixApi, TagRegistryApi, TagRegistryService,
    };
    use tag_telemetry::{encode_metrics, register_metrics};

    const G: ScopeId = ScopeId(9);

    // =============================================================================
    // TRANSIENT FAILURES
    // =============================================================================

    #[tokio::test]
    async fn test_single_outage_is_invisible() {
        let h = Harness::new();
        let a = h.member(G, 1, &[Claim::TagAdd]);
        h.store.faults().push(Fault::Unavailable);
        h.directory.faults().push(Fault::Unavailable);

        let tag = h.registry.create(G, "faq", "text", &a).await.unwrap();
        assert_eq!(tag.name, "faq");
        assert_eq!(h.store.faults().pending(), 0);
        assert_eq!(h.directory.faults().pending(), 0);
    }

    #[tokio::test]
    async fn test_double_outage_surfaces_operation() {
        let h = Harness::new();
        let a = h.member(G, 1, &[Claim::TagAdd]);
        h.registry.create(G, "faq", "text", &a).await.unwrap();

        h.store.faults().push_n(Fault::Unavailable, 2);
        match h.registry.invoke(G, "faq", &a).await {
            Err(RegistryError::CollaboratorUnavailable { operation, source }) => {
                assert_eq!(operation, "get_tag");
                assert!(source.is_transient());
            }
            other => panic!("expected CollaboratorUnavailable, got {:?}", other),
        }
        // The failed request did not count a use
        assert_eq!(h.registry.resolve(G, "faq", false).await.unwrap().use_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_store_times_out_then_recovers() {
        let h = Harness::new();
        let a = h.member(G, 1, &[Claim::TagAdd]);
        h.registry.create(G, "faq", "text", &a).await.unwrap();

        // One stall longer than the 200ms testing timeout
        h.store.faults().push(Fault::Delay(Duration::from_secs(30)));
        let tag = h.registry.invoke(G, "faq", &a).await.unwrap();
        assert_eq!(tag.use_count, 1);

        h.store.faults().push_n(Fault::Delay(Duration::from_secs(30)), 2);
        assert!(matches!(
            h.registry.resolve(G, "faq", false).await,
            Err(RegistryError::CollaboratorUnavailable {
                source: CollaboratorError::Timeout { .. },
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_owner_path_survives_claims_outage() {
        let h = Harness::new();
        let a = h.member(G, 1, &[Claim::TagAdd]);
        let b = h.member(G, 2, &[Claim::TagDelete]);
        h.registry.create(G, "one", "text", &a).await.unwrap();
        h.registry.create(G, "two", "text", &a).await.unwrap();

        // Owner delete never asks for claims
        h.directory.faults().push_n(Fault::Unavailable, 2);
        assert!(h.registry.delete(G, "one", &a).await.is_ok());
        assert_eq!(h.directory.faults().pending(), 2);

        // A claim holder needs the claims collaborator
        assert!(matches!(
            h.registry.delete(G, "two", &b).await,
            Err(RegistryError::CollaboratorUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_prefix_store_outage_is_retried() {
        let h = Harness::new();
        h.prefixes.faults().push(Fault::Unavailable);
        assert_eq!(h.prefix_service.get_prefix(G).await.unwrap(), "$");
    }

    // =============================================================================
    // COMPARE-AND-SWAP
    // =============================================================================

    fn racing_registry(
        intruders: Vec<ActorId>,
    ) -> (
        TagRegistryService<RacingStore, InMemoryDirectory, InMemoryDirectory>,
        Arc<RacingStore>,
        Arc<InMemoryDirectory>,
    ) {
        let store = Arc::new(RacingStore::new(intruders));
        let directory = Arc::new(InMemoryDirectory::new());
        let registry = TagRegistryService::new(
            store.clone(),
            directory.clone(),
            directory.clone(),
            RegistryConfig::for_testing(),
        );
        (registry, store, directory)
    }

    #[tokio::test]
    async fn test_lost_claim_race_reports_new_owner() {
        let intruder = ActorId(50);
        let (registry, store, directory) = racing_registry(vec![intruder]);
        directory.join(G, intruder);
        directory.join(G, ActorId(3));
        directory.grant(G, ActorId(3), &[Claim::TagAdd]);
        store.inner().seed(Tag::new(G, "orphan", "text", Some(ActorId(1))));

        assert_eq!(
            registry.claim(G, "orphan", &Actor::member(3)).await,
            Err(RegistryError::AlreadyOwned { owner: intruder })
        );
    }

    #[tokio::test]
    async fn test_claim_retries_once_after_cas_failure() {
        // The intruder is not a member, so the tag stays vacant
        let (registry, store, directory) = racing_registry(vec![ActorId(60)]);
        directory.join(G, ActorId(3));
        directory.grant(G, ActorId(3), &[Claim::TagAdd]);
        store.inner().seed(Tag::new(G, "orphan", "text", None));

        let claimed = registry.claim(G, "orphan", &Actor::member(3)).await.unwrap();
        assert_eq!(claimed.owner_id, Some(ActorId(3)));
    }

    #[tokio::test]
    async fn test_two_lost_races_are_a_conflict() {
        let (registry, store, directory) = racing_registry(vec![ActorId(60), ActorId(61)]);
        directory.join(G, ActorId(3));
        directory.grant(G, ActorId(3), &[Claim::TagAdd]);
        store.inner().seed(Tag::new(G, "orphan", "text", None));

        assert_eq!(
            registry.claim(G, "orphan", &Actor::member(3)).await,
            Err(RegistryError::Conflict(ConflictKind::ConcurrentModification))
        );
    }

    #[tokio::test]
    async fn test_edit_after_losing_ownership_is_denied() {
        let (registry, store, directory) = racing_registry(vec![ActorId(70)]);
        directory.join(G, ActorId(1));
        store.inner().seed(Tag::new(G, "faq", "v1", Some(ActorId(1))));

        assert_eq!(
            registry.edit(G, "faq", "v2", &Actor::member(1)).await,
            Err(RegistryError::Denied(DenialReason::NotOwner))
        );
        let stored = store.inner().get_tag(G, "faq").await.unwrap().unwrap();
        assert_eq!(stored.content, "v1");
        assert_eq!(stored.owner_id, Some(ActorId(70)));
    }

    // =============================================================================
    // TELEMETRY
    // =============================================================================

    #[tokio::test]
    async fn test_actions_are_counted() {
        register_metrics().unwrap();
        let h = Harness::new();
        let a = h.member(G, 1, &[Claim::TagAdd]);
        h.registry.create(G, "faq", "text", &a).await.unwrap();
        h.registry.invoke(G, "faq", &a).await.unwrap();
        let _ = h.registry.edit(G, "faq", "text", &Actor::member(2)).await;

        let text = encode_metrics().unwrap();
        assert!(text.contains("tag_registry_operations_total"));
        assert!(text.contains("tag_registry_invocations_total"));
        assert!(text.contains("tag_registry_denials_total"));
    }
}
