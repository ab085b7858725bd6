//! # Inbound Ports
//!
//! What callers (command handlers, a chat connector) can ask of the
//! registry. Every method returns a [`RegistryError`] naming the failure;
//! turning it into a message is the caller's job.

use async_trait::async_trait;

use crate::domain::{Actor, ActorId, RegistryError, ScopeId, Tag, TagInfo};

/// Tag Registry API - inbound port.
#[async_trait]
pub trait TagRegistryApi: Send + Sync {
    /// Create a tag owned by `actor`. Requires `tag_add`.
    async fn create(
        &self,
        scope: ScopeId,
        name: &str,
        content: &str,
        actor: &Actor,
    ) -> Result<Tag, RegistryError>;

    /// Fuzzy-resolve and count one use.
    async fn invoke(&self, scope: ScopeId, name: &str, actor: &Actor)
        -> Result<Tag, RegistryError>;

    /// Replace content. Owner only.
    async fn edit(
        &self,
        scope: ScopeId,
        name: &str,
        content: &str,
        actor: &Actor,
    ) -> Result<Tag, RegistryError>;

    /// Delete a tag. Owner or `tag_delete`.
    async fn delete(&self, scope: ScopeId, name: &str, actor: &Actor)
        -> Result<Tag, RegistryError>;

    /// Take over a vacant tag. Requires `tag_add`.
    async fn claim(&self, scope: ScopeId, name: &str, actor: &Actor)
        -> Result<Tag, RegistryError>;

    /// Hand a tag to another actor. Owner or `tag_transfer`.
    async fn transfer(
        &self,
        scope: ScopeId,
        name: &str,
        from: &Actor,
        to: &Actor,
    ) -> Result<Tag, RegistryError>;

    /// All tags, most used first.
    async fn list(&self, scope: ScopeId) -> Result<Vec<Tag>, RegistryError>;

    /// Tags stored as owned by `owner`, most used first.
    async fn list_owned(&self, scope: ScopeId, owner: ActorId) -> Result<Vec<Tag>, RegistryError>;

    /// Tags without a live owner, most used first.
    async fn list_unclaimed(&self, scope: ScopeId) -> Result<Vec<Tag>, RegistryError>;

    /// Exact lookup, falling back to fuzzy matching when `fuzzy` is set.
    async fn resolve(&self, scope: ScopeId, name: &str, fuzzy: bool)
        -> Result<Tag, RegistryError>;

    /// Ranked "did you mean" candidates.
    async fn suggest(&self, scope: ScopeId, query: &str) -> Result<Vec<Tag>, RegistryError>;

    /// User-facing search through the store.
    async fn search(&self, scope: ScopeId, query: &str) -> Result<Vec<Tag>, RegistryError>;

    /// A tag with its live owner.
    async fn info(&self, scope: ScopeId, name: &str) -> Result<TagInfo, RegistryError>;
}

/// Tag Prefix API - inbound port.
#[async_trait]
pub trait TagPrefixApi: Send + Sync {
    /// Active prefix for the scope.
    async fn get_prefix(&self, scope: ScopeId) -> Result<String, RegistryError>;

    /// Override the prefix. Requires `custom_tag_prefix_set`.
    async fn set_prefix(
        &self,
        scope: ScopeId,
        prefix: &str,
        actor: &Actor,
    ) -> Result<(), RegistryError>;

    /// Restore the default prefix.
    async fn reset_prefix(&self, scope: ScopeId, actor: &Actor) -> Result<(), RegistryError>;

    /// Tag names invoked inline in `message` under the scope's prefix.
    async fn invocations(&self, scope: ScopeId, message: &str)
        -> Result<Vec<String>, RegistryError>;
}
