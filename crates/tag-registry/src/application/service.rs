//! # Tag Registry Service
//!
//! Application service orchestrating validation, resolution, authorization
//! and persistence for every tag action.
//!
//! A mutating action runs: validate → resolve → authorize → persist.
//! Owner changes go through compare-and-swap; on a lost race the tag is
//! re-resolved and the action retried once before reporting
//! `ConcurrentModification`.

use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tag_telemetry::{log_tag_event, record_outcome, time_operation};
use tag_telemetry::{AUTH_DENIALS, CAS_CONFLICTS, TAG_INVOCATIONS};
use tracing::{debug, warn};

use super::retry::{unavailable, CallPolicy};
use crate::algorithms::{
    authorize, best_match, paginate, rank_suggestions, validate, AuthDecision, FuzzyMatch, Page,
    Policy,
};
use crate::config::RegistryConfig;
use crate::domain::{
    invariant_transferable, invariant_use_count_monotonic, normalize_name, Actor, ActorId,
    Claim, CollaboratorError, ConflictKind, OwnerExpectation, OwnerRelation, RegistryError,
    ScopeId, Tag, TagInfo, TagPatch,
};
use crate::ports::{ClaimsProvider, MembershipProvider, TagRegistryApi, TagStore};

/// Attempts at an owner compare-and-swap before giving up.
const CAS_ATTEMPTS: usize = 2;

/// Tag Registry Service - the engine behind every tag command.
pub struct TagRegistryService<S, M, C>
where
    S: TagStore,
    M: MembershipProvider,
    C: ClaimsProvider,
{
    /// Tag persistence.
    store: Arc<S>,
    /// Scope membership, for owner vacancy.
    members: Arc<M>,
    /// Claim resolution.
    claims: Arc<C>,
    /// Configuration.
    config: RegistryConfig,
    /// Timeout and retry for collaborator calls.
    calls: CallPolicy,
}

impl<S, M, C> TagRegistryService<S, M, C>
where
    S: TagStore,
    M: MembershipProvider,
    C: ClaimsProvider,
{
    /// Create a new registry service.
    pub fn new(store: Arc<S>, members: Arc<M>, claims: Arc<C>, config: RegistryConfig) -> Self {
        let calls = CallPolicy::new(config.collaborator_timeout());
        Self {
            store,
            members,
            claims,
            config,
            calls,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Split a listing into pages of the configured size.
    pub fn paginate(&self, tags: &[Tag]) -> Vec<Page<Tag>> {
        paginate(tags, self.config.page_size)
    }

    /// Time the action and count its outcome.
    async fn observed<T, F>(&self, operation: &'static str, action: F) -> Result<T, RegistryError>
    where
        F: Future<Output = Result<T, RegistryError>>,
    {
        let _timer = time_operation!(operation);
        let result = action.await;
        match &result {
            Ok(_) => record_outcome!(operation, "ok"),
            Err(err) => {
                debug!("[tags] {} failed: {}", operation, err);
                record_outcome!(operation, err.label())
            }
        }
        result
    }

    // =========================================================================
    // Collaborator access
    // =========================================================================

    async fn fetch(&self, scope: ScopeId, name: &str) -> Result<Option<Tag>, RegistryError> {
        self.calls
            .run("get_tag", || self.store.get_tag(scope, name))
            .await
            .map_err(unavailable("get_tag"))
    }

    async fn all_tags(&self, scope: ScopeId) -> Result<Vec<Tag>, RegistryError> {
        self.calls
            .run("list_tags", || self.store.list_tags(scope))
            .await
            .map_err(unavailable("list_tags"))
    }

    async fn is_member(&self, scope: ScopeId, actor: ActorId) -> Result<bool, RegistryError> {
        self.calls
            .run("is_current_member", || {
                self.members.is_current_member(scope, actor)
            })
            .await
            .map_err(unavailable("is_current_member"))
    }

    /// The stored owner if still a scope member.
    async fn live_owner(&self, tag: &Tag) -> Result<Option<ActorId>, RegistryError> {
        let Some(owner) = tag.owner_id else {
            return Ok(None);
        };
        let member = self.is_member(tag.scope_id, owner).await?;
        Ok(member.then_some(owner))
    }

    /// Apply an owner-guarded patch. `Ok(None)` means the CAS was lost.
    async fn apply_patch(
        &self,
        tag: &Tag,
        patch: TagPatch,
        expected: OwnerExpectation,
    ) -> Result<Option<Tag>, RegistryError> {
        let result = self
            .calls
            .run("update_tag", || {
                self.store
                    .update_tag(tag.scope_id, &tag.name, patch.clone(), expected)
            })
            .await;

        match result {
            Ok(updated) => Ok(Some(updated)),
            Err(CollaboratorError::CasFailure { current_owner }) => {
                CAS_CONFLICTS.inc();
                warn!(
                    "[tags] Lost owner CAS on {}/{} (expected {:?}, stored {:?})",
                    tag.scope_id, tag.name, expected, current_owner
                );
                Ok(None)
            }
            Err(CollaboratorError::NotFound) => Err(self.not_found(tag.scope_id, &tag.name).await),
            Err(err) => Err(unavailable("update_tag")(err)),
        }
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// `NotFound` carrying "did you mean" suggestions.
    ///
    /// A failed suggestion lookup degrades to an empty list.
    async fn not_found(&self, scope: ScopeId, name: &str) -> RegistryError {
        let name = normalize_name(name);
        match self.all_tags(scope).await {
            Ok(tags) => RegistryError::NotFound {
                suggestions: rank_suggestions(&name, &tags, &self.config.fuzzy),
                name,
            },
            Err(err) => {
                warn!("[tags] Suggestions unavailable for {}: {}", name, err);
                RegistryError::not_found(&name)
            }
        }
    }

    async fn find_exact(&self, scope: ScopeId, name: &str) -> Result<Tag, RegistryError> {
        match self.fetch(scope, &normalize_name(name)).await? {
            Some(tag) => Ok(tag),
            None => Err(self.not_found(scope, name).await),
        }
    }

    async fn find(&self, scope: ScopeId, name: &str, fuzzy: bool) -> Result<Tag, RegistryError> {
        let name = normalize_name(name);
        if let Some(tag) = self.fetch(scope, &name).await? {
            return Ok(tag);
        }
        if !fuzzy {
            return Err(self.not_found(scope, &name).await);
        }

        let tags = self.all_tags(scope).await?;
        match best_match(&name, &tags, &self.config.fuzzy) {
            FuzzyMatch::Found(tag, score) => {
                debug!("[tags] Fuzzy {} -> {} ({:.2})", name, tag.name, score);
                Ok(tag.clone())
            }
            FuzzyMatch::Ambiguous | FuzzyMatch::NoMatch => Err(RegistryError::NotFound {
                suggestions: rank_suggestions(&name, &tags, &self.config.fuzzy),
                name,
            }),
        }
    }

    // =========================================================================
    // Authorization
    // =========================================================================

    /// Evaluate `policy`, fetching claims only when ownership does not decide.
    async fn check_policy(
        &self,
        scope: ScopeId,
        actor: &Actor,
        policy: Policy,
        relation: OwnerRelation,
    ) -> Result<(), RegistryError> {
        let decision = match policy.decide_without_claims(relation) {
            Some(decision) => decision,
            None => {
                let claims = self
                    .calls
                    .run("resolve_claims", || self.claims.resolve_claims(scope, actor.id))
                    .await
                    .map_err(unavailable("resolve_claims"))?;
                authorize(&claims, policy, relation)
            }
        };

        match decision {
            AuthDecision::Allowed => Ok(()),
            AuthDecision::Denied(reason) => {
                AUTH_DENIALS.with_label_values(&[reason.label()]).inc();
                warn!("[tags] Denied {} in {}: {}", actor.id, scope, reason);
                Err(RegistryError::Denied(reason))
            }
        }
    }

    /// Stable sort, most used first. Ties keep creation order.
    fn by_usage(mut tags: Vec<Tag>) -> Vec<Tag> {
        tags.sort_by(|a, b| b.use_count.cmp(&a.use_count));
        tags
    }
}

#[async_trait]
impl<S, M, C> TagRegistryApi for TagRegistryService<S, M, C>
where
    S: TagStore,
    M: MembershipProvider,
    C: ClaimsProvider,
{
    async fn create(
        &self,
        scope: ScopeId,
        name: &str,
        content: &str,
        actor: &Actor,
    ) -> Result<Tag, RegistryError> {
        self.observed("create", async move {
            let valid = validate(name, content, actor.privileged, &self.config.limits)?;

            if self.fetch(scope, &valid.name).await?.is_some() {
                return Err(RegistryError::Conflict(ConflictKind::NameTaken));
            }
            self.check_policy(
                scope,
                actor,
                Policy::Strict(Claim::TagAdd),
                OwnerRelation::NoTarget,
            )
            .await?;

            let tag = Tag::new(scope, &valid.name, valid.content, Some(actor.id));
            let created = self
                .calls
                .run("create_tag", || self.store.create_tag(tag.clone()))
                .await
                .map_err(|err| match err {
                    CollaboratorError::Conflict => RegistryError::Conflict(ConflictKind::NameTaken),
                    other => unavailable("create_tag")(other),
                })?;

            log_tag_event!(info, "[tags] Tag created", scope, created.name, owner = %actor.id);
            Ok(created)
        })
        .await
    }

    async fn invoke(
        &self,
        scope: ScopeId,
        name: &str,
        actor: &Actor,
    ) -> Result<Tag, RegistryError> {
        self.observed("invoke", async move {
            let mut tag = self.find(scope, name, true).await?;

            let count = self
                .calls
                .run("increment_use", || self.store.increment_use(scope, &tag.name))
                .await;
            tag.use_count = match count {
                Ok(count) if invariant_use_count_monotonic(tag.use_count, count) => count,
                Ok(count) => {
                    warn!(
                        "[tags] Store lowered use count of {}/{} ({} -> {})",
                        scope, tag.name, tag.use_count, count
                    );
                    tag.use_count
                }
                Err(CollaboratorError::NotFound) => {
                    return Err(self.not_found(scope, &tag.name).await)
                }
                Err(err) => return Err(unavailable("increment_use")(err)),
            };

            TAG_INVOCATIONS.inc();
            log_tag_event!(debug, "[tags] Tag invoked", scope, tag.name, actor = %actor.id, uses = tag.use_count);
            Ok(tag)
        })
        .await
    }

    async fn edit(
        &self,
        scope: ScopeId,
        name: &str,
        content: &str,
        actor: &Actor,
    ) -> Result<Tag, RegistryError> {
        self.observed("edit", async move {
            let mut tag = self.find_exact(scope, name).await?;

            for attempt in 1..=CAS_ATTEMPTS {
                let relation = OwnerRelation::of(actor.id, tag.owner_id);
                self.check_policy(scope, actor, Policy::OwnerOnly, relation)
                    .await?;
                let valid = validate(&tag.name, content, actor.privileged, &self.config.limits)?;

                let patch = TagPatch::Content(valid.content);
                let expected = OwnerExpectation(Some(actor.id));
                if let Some(updated) = self.apply_patch(&tag, patch, expected).await? {
                    log_tag_event!(info, "[tags] Tag edited", scope, updated.name, actor = %actor.id);
                    return Ok(updated);
                }
                if attempt < CAS_ATTEMPTS {
                    tag = self.find_exact(scope, name).await?;
                }
            }
            Err(RegistryError::Conflict(ConflictKind::ConcurrentModification))
        })
        .await
    }

    async fn delete(
        &self,
        scope: ScopeId,
        name: &str,
        actor: &Actor,
    ) -> Result<Tag, RegistryError> {
        self.observed("delete", async move {
            let tag = self.find(scope, name, true).await?;
            let relation = OwnerRelation::of(actor.id, tag.owner_id);
            self.check_policy(scope, actor, Policy::Disjunctive(Claim::TagDelete), relation)
                .await?;

            let deleted = self
                .calls
                .run("delete_tag", || self.store.delete_tag(scope, &tag.name))
                .await;
            match deleted {
                Ok(deleted) => {
                    log_tag_event!(info, "[tags] Tag deleted", scope, deleted.name, actor = %actor.id);
                    Ok(deleted)
                }
                Err(CollaboratorError::NotFound) => Err(self.not_found(scope, &tag.name).await),
                Err(err) => Err(unavailable("delete_tag")(err)),
            }
        })
        .await
    }

    async fn claim(
        &self,
        scope: ScopeId,
        name: &str,
        actor: &Actor,
    ) -> Result<Tag, RegistryError> {
        self.observed("claim", async move {
            let mut tag = self.find_exact(scope, name).await?;
            let mut authorized = false;

            for attempt in 1..=CAS_ATTEMPTS {
                if let Some(owner) = self.live_owner(&tag).await? {
                    return Err(RegistryError::AlreadyOwned { owner });
                }
                if !authorized {
                    self.check_policy(
                        scope,
                        actor,
                        Policy::Strict(Claim::TagAdd),
                        OwnerRelation::NotOwner,
                    )
                    .await?;
                    authorized = true;
                }

                let patch = TagPatch::Owner(actor.id);
                let expected = OwnerExpectation(tag.owner_id);
                if let Some(updated) = self.apply_patch(&tag, patch, expected).await? {
                    log_tag_event!(info, "[tags] Tag claimed", scope, updated.name, owner = %actor.id);
                    return Ok(updated);
                }
                if attempt < CAS_ATTEMPTS {
                    tag = self.find_exact(scope, name).await?;
                }
            }
            Err(RegistryError::Conflict(ConflictKind::ConcurrentModification))
        })
        .await
    }

    async fn transfer(
        &self,
        scope: ScopeId,
        name: &str,
        from: &Actor,
        to: &Actor,
    ) -> Result<Tag, RegistryError> {
        self.observed("transfer", async move {
            if to.automated {
                return Err(RegistryError::InvalidRecipient { recipient: to.id });
            }

            let mut tag = self.find_exact(scope, name).await?;

            for attempt in 1..=CAS_ATTEMPTS {
                let live = self.live_owner(&tag).await?;
                let owner = invariant_transferable(live, to.id).map_err(RegistryError::Conflict)?;

                // Re-checked after a lost race: `from` may no longer be the owner
                let relation = OwnerRelation::of(from.id, Some(owner));
                self.check_policy(scope, from, Policy::Disjunctive(Claim::TagTransfer), relation)
                    .await?;

                let patch = TagPatch::Owner(to.id);
                let expected = OwnerExpectation(Some(owner));
                if let Some(updated) = self.apply_patch(&tag, patch, expected).await? {
                    log_tag_event!(
                        info,
                        "[tags] Tag transferred",
                        scope,
                        updated.name,
                        from = %owner,
                        to = %to.id
                    );
                    return Ok(updated);
                }
                if attempt < CAS_ATTEMPTS {
                    tag = self.find_exact(scope, name).await?;
                }
            }
            Err(RegistryError::Conflict(ConflictKind::ConcurrentModification))
        })
        .await
    }

    async fn list(&self, scope: ScopeId) -> Result<Vec<Tag>, RegistryError> {
        self.observed("list", async move { Ok(Self::by_usage(self.all_tags(scope).await?)) })
            .await
    }

    async fn list_owned(
        &self,
        scope: ScopeId,
        owner: ActorId,
    ) -> Result<Vec<Tag>, RegistryError> {
        self.observed("list_owned", async move {
            let tags = self.all_tags(scope).await?;
            Ok(Self::by_usage(
                tags.into_iter().filter(|t| t.is_owned_by(owner)).collect(),
            ))
        })
        .await
    }

    async fn list_unclaimed(&self, scope: ScopeId) -> Result<Vec<Tag>, RegistryError> {
        self.observed("list_unclaimed", async move {
            let tags = self.all_tags(scope).await?;

            // Membership is fresh per request; one lookup per distinct owner
            let mut membership: HashMap<ActorId, bool> = HashMap::new();
            let mut vacant = Vec::new();
            for tag in tags {
                let is_vacant = match tag.owner_id {
                    None => true,
                    Some(owner) => match membership.get(&owner) {
                        Some(member) => !member,
                        None => {
                            let member = self.is_member(scope, owner).await?;
                            membership.insert(owner, member);
                            !member
                        }
                    },
                };
                if is_vacant {
                    vacant.push(tag);
                }
            }
            Ok(Self::by_usage(vacant))
        })
        .await
    }

    async fn resolve(&self, scope: ScopeId, name: &str, fuzzy: bool) -> Result<Tag, RegistryError> {
        self.observed("resolve", self.find(scope, name, fuzzy)).await
    }

    async fn suggest(&self, scope: ScopeId, query: &str) -> Result<Vec<Tag>, RegistryError> {
        self.observed("suggest", async move {
            let tags = self.all_tags(scope).await?;
            Ok(rank_suggestions(query, &tags, &self.config.fuzzy))
        })
        .await
    }

    async fn search(&self, scope: ScopeId, query: &str) -> Result<Vec<Tag>, RegistryError> {
        self.observed("search", async move {
            let limit = self.config.fuzzy.max_suggestions;
            let query = normalize_name(query);
            let mut found = self
                .calls
                .run("search_tags", || self.store.search_tags(scope, &query, limit))
                .await
                .map_err(unavailable("search_tags"))?;
            found.truncate(limit);
            Ok(found)
        })
        .await
    }

    async fn info(&self, scope: ScopeId, name: &str) -> Result<TagInfo, RegistryError> {
        self.observed("info", async move {
            let tag = self.find(scope, name, true).await?;
            let owner = self.live_owner(&tag).await?;
            Ok(TagInfo { tag, owner })
        })
        .await
    }
}
