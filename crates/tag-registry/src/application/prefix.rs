//! # Prefix Service
//!
//! Per-scope invocation prefix: lookup, override, reset, and inline
//! invocation parsing under the active prefix.

use async_trait::async_trait;
use std::sync::Arc;
use tag_telemetry::{record_outcome, AUTH_DENIALS};
use tracing::{info, warn};

use super::retry::{unavailable, CallPolicy};
use crate::algorithms::{authorize, extract_invocations, AuthDecision, Policy};
use crate::config::RegistryConfig;
use crate::domain::{
    Actor, Claim, ConflictKind, OwnerRelation, RegistryError, ScopeId, ValidationError,
};
use crate::ports::{ClaimsProvider, PrefixStore, TagPrefixApi};

/// Prefix Service - backs the `tag prefix` commands.
pub struct PrefixService<P, C>
where
    P: PrefixStore,
    C: ClaimsProvider,
{
    prefixes: Arc<P>,
    claims: Arc<C>,
    config: RegistryConfig,
    calls: CallPolicy,
}

impl<P, C> PrefixService<P, C>
where
    P: PrefixStore,
    C: ClaimsProvider,
{
    /// Create a new prefix service.
    pub fn new(prefixes: Arc<P>, claims: Arc<C>, config: RegistryConfig) -> Self {
        let calls = CallPolicy::new(config.collaborator_timeout());
        Self {
            prefixes,
            claims,
            config,
            calls,
        }
    }

    async fn active(&self, scope: ScopeId) -> Result<String, RegistryError> {
        let stored = self
            .calls
            .run("get_prefix", || self.prefixes.get_prefix(scope))
            .await
            .map_err(unavailable("get_prefix"))?;
        Ok(stored.unwrap_or_else(|| self.config.default_prefix.clone()))
    }

    fn check_prefix(&self, prefix: &str) -> Result<(), ValidationError> {
        if prefix.is_empty() {
            return Err(ValidationError::InvalidPrefix {
                reason: "prefix cannot be empty".to_string(),
            });
        }
        if let Some(c) = prefix
            .chars()
            .find(|c| self.config.reserved_prefix_chars.contains(c))
        {
            return Err(ValidationError::InvalidPrefix {
                reason: format!("prefix cannot contain the character '{}'", c),
            });
        }
        Ok(())
    }

    async fn store(&self, scope: ScopeId, prefix: &str, actor: &Actor) -> Result<(), RegistryError> {
        let claims = self
            .calls
            .run("resolve_claims", || self.claims.resolve_claims(scope, actor.id))
            .await
            .map_err(unavailable("resolve_claims"))?;
        if let AuthDecision::Denied(reason) = authorize(
            &claims,
            Policy::Strict(Claim::CustomTagPrefixSet),
            OwnerRelation::NoTarget,
        ) {
            AUTH_DENIALS.with_label_values(&[reason.label()]).inc();
            warn!("[tags] Denied prefix change by {} in {}: {}", actor.id, scope, reason);
            return Err(RegistryError::Denied(reason));
        }

        self.check_prefix(prefix)?;
        if self.active(scope).await? == prefix {
            return Err(RegistryError::Conflict(ConflictKind::PrefixUnchanged));
        }

        self.calls
            .run("set_prefix", || self.prefixes.set_prefix(scope, prefix))
            .await
            .map_err(unavailable("set_prefix"))?;
        info!("[tags] Prefix for {} is now {:?}", scope, prefix);
        Ok(())
    }

    fn observe<T>(operation: &'static str, result: Result<T, RegistryError>) -> Result<T, RegistryError> {
        match &result {
            Ok(_) => record_outcome!(operation, "ok"),
            Err(err) => record_outcome!(operation, err.label()),
        }
        result
    }
}

#[async_trait]
impl<P, C> TagPrefixApi for PrefixService<P, C>
where
    P: PrefixStore,
    C: ClaimsProvider,
{
    async fn get_prefix(&self, scope: ScopeId) -> Result<String, RegistryError> {
        let result = self.active(scope).await;
        Self::observe("get_prefix", result)
    }

    async fn set_prefix(
        &self,
        scope: ScopeId,
        prefix: &str,
        actor: &Actor,
    ) -> Result<(), RegistryError> {
        let result = self.store(scope, prefix.trim(), actor).await;
        Self::observe("set_prefix", result)
    }

    async fn reset_prefix(&self, scope: ScopeId, actor: &Actor) -> Result<(), RegistryError> {
        let result = self.store(scope, &self.config.default_prefix, actor).await;
        Self::observe("reset_prefix", result)
    }

    async fn invocations(
        &self,
        scope: ScopeId,
        message: &str,
    ) -> Result<Vec<String>, RegistryError> {
        let result = self
            .active(scope)
            .await
            .map(|prefix| extract_invocations(message, &prefix));
        Self::observe("invocations", result)
    }
}
