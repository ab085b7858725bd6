//! # Tag Registry
//!
//! Scoped tag registry with claims-based authorization.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Create, resolve, edit, delete, claim and transfer named text snippets
//! ("tags") inside isolated scopes. Every mutating action is gated by a
//! combination of ownership and claims held by the acting user.
//!
//! ## Authorization Rules
//!
//! | Action | Rule |
//! |--------|------|
//! | create, claim | `tag_add` |
//! | edit | owner only |
//! | delete | owner or `tag_delete` |
//! | transfer | owner or `tag_transfer` |
//! | prefix set/reset | `custom_tag_prefix_set` |
//!
//! ## Module Structure
//!
//! ```text
//! tag-registry/
//! ├── domain/          # Tag, claims, identifiers, errors, invariants
//! ├── algorithms/      # Validation, similarity, authorization, pagination
//! ├── ports/           # API traits (inbound) + collaborator traits (outbound)
//! ├── application/     # TagRegistryService, PrefixService, call policy
//! ├── adapters/        # In-memory collaborators with fault injection
//! └── config.rs        # RegistryConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::{Fault, FaultInjector, InMemoryDirectory, InMemoryPrefixStore, InMemoryTagStore};
pub use algorithms::{
    authorize, best_match, chunk, escape_mentions, extract_invocations, paginate,
    rank_suggestions, score, validate, AuthDecision, FuzzyMatch, Page, Policy, ValidContent,
};
pub use application::{CallPolicy, PrefixService, TagRegistryService};
pub use config::{ConfigError, ContentLimits, FuzzyConfig, RegistryConfig};
pub use domain::{
    Actor, ActorId, Claim, ClaimParseError, ClaimSet, CollaboratorError, ConflictKind,
    DenialReason, OwnerExpectation, OwnerRelation, RegistryError, ScopeId, Tag, TagInfo,
    TagPatch, ValidationError, DEFAULT_TAG_PREFIX, MAX_NON_ADMIN_LINES, MAX_TAG_CONTENT_SIZE,
    MAX_TAG_NAME_SIZE, TAG_CHUNK_SIZE,
};
pub use ports::{
    ClaimsProvider, MembershipProvider, PrefixStore, TagPrefixApi, TagRegistryApi, TagStore,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
