//! In-Memory Tag Store
//!
//! Implements the `TagStore` port over a single `RwLock`ed map. Every
//! mutation runs under the write lock, which gives create-if-absent,
//! use increments and owner compare-and-swap their atomicity.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

use super::faults::FaultInjector;
use crate::algorithms::rank_suggestions;
use crate::config::FuzzyConfig;
use crate::domain::{
    normalize_name, CollaboratorError, OwnerExpectation, ScopeId, Tag, TagPatch,
};
use crate::ports::outbound::TagStore;

struct StoredTag {
    /// Insertion sequence, for creation-order listing.
    seq: u64,
    tag: Tag,
}

#[derive(Default)]
struct Inner {
    tags: HashMap<(ScopeId, String), StoredTag>,
    next_seq: u64,
}

/// In-memory tag persistence for tests and local runs.
#[derive(Default)]
pub struct InMemoryTagStore {
    inner: RwLock<Inner>,
    search: FuzzyConfig,
    faults: FaultInjector,
}

impl InMemoryTagStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fault queue consulted before every call.
    pub fn faults(&self) -> &FaultInjector {
        &self.faults
    }

    /// Insert or overwrite a tag directly, bypassing the port.
    pub fn seed(&self, tag: Tag) {
        let mut inner = self.inner.write();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner
            .tags
            .insert((tag.scope_id, tag.name.clone()), StoredTag { seq, tag });
    }

    /// Number of tags across all scopes.
    pub fn len(&self) -> usize {
        self.inner.read().tags.len()
    }

    /// Whether the store holds no tags.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn key(scope: ScopeId, name: &str) -> (ScopeId, String) {
        (scope, normalize_name(name))
    }
}

#[async_trait]
impl TagStore for InMemoryTagStore {
    async fn get_tag(&self, scope: ScopeId, name: &str) -> Result<Option<Tag>, CollaboratorError> {
        self.faults.check("get_tag").await?;
        let inner = self.inner.read();
        Ok(inner
            .tags
            .get(&Self::key(scope, name))
            .map(|stored| stored.tag.clone()))
    }

    async fn create_tag(&self, tag: Tag) -> Result<Tag, CollaboratorError> {
        self.faults.check("create_tag").await?;
        let mut inner = self.inner.write();
        let key = (tag.scope_id, tag.name.clone());
        if inner.tags.contains_key(&key) {
            debug!("[tags] create_tag conflict on {}/{}", key.0, key.1);
            return Err(CollaboratorError::Conflict);
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.tags.insert(
            key,
            StoredTag {
                seq,
                tag: tag.clone(),
            },
        );
        debug!("[tags] Stored tag {}/{}", tag.scope_id, tag.name);
        Ok(tag)
    }

    async fn update_tag(
        &self,
        scope: ScopeId,
        name: &str,
        patch: TagPatch,
        expected_owner: OwnerExpectation,
    ) -> Result<Tag, CollaboratorError> {
        self.faults.check("update_tag").await?;
        let mut inner = self.inner.write();
        let stored = inner
            .tags
            .get_mut(&Self::key(scope, name))
            .ok_or(CollaboratorError::NotFound)?;

        if !expected_owner.matches(stored.tag.owner_id) {
            debug!(
                "[tags] CAS failed on {}/{}: expected {:?}, stored {:?}",
                scope, stored.tag.name, expected_owner, stored.tag.owner_id
            );
            return Err(CollaboratorError::CasFailure {
                current_owner: stored.tag.owner_id,
            });
        }

        match patch {
            TagPatch::Content(content) => stored.tag.content = content,
            TagPatch::Owner(owner) => stored.tag.owner_id = Some(owner),
        }
        Ok(stored.tag.clone())
    }

    async fn delete_tag(&self, scope: ScopeId, name: &str) -> Result<Tag, CollaboratorError> {
        self.faults.check("delete_tag").await?;
        self.inner
            .write()
            .tags
            .remove(&Self::key(scope, name))
            .map(|stored| stored.tag)
            .ok_or(CollaboratorError::NotFound)
    }

    async fn increment_use(&self, scope: ScopeId, name: &str) -> Result<u64, CollaboratorError> {
        self.faults.check("increment_use").await?;
        let mut inner = self.inner.write();
        let stored = inner
            .tags
            .get_mut(&Self::key(scope, name))
            .ok_or(CollaboratorError::NotFound)?;
        stored.tag.use_count = stored.tag.use_count.saturating_add(1);
        Ok(stored.tag.use_count)
    }

    async fn list_tags(&self, scope: ScopeId) -> Result<Vec<Tag>, CollaboratorError> {
        self.faults.check("list_tags").await?;
        let inner = self.inner.read();
        let mut stored: Vec<&StoredTag> = inner
            .tags
            .iter()
            .filter(|((s, _), _)| *s == scope)
            .map(|(_, stored)| stored)
            .collect();
        stored.sort_by_key(|s| s.seq);
        Ok(stored.into_iter().map(|s| s.tag.clone()).collect())
    }

    async fn search_tags(
        &self,
        scope: ScopeId,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Tag>, CollaboratorError> {
        let tags = self.list_tags(scope).await?;
        let config = FuzzyConfig {
            max_suggestions: limit,
            ..self.search.clone()
        };
        Ok(rank_suggestions(query, &tags, &config))
    }
}
