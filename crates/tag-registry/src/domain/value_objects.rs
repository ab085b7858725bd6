//! # Domain Value Objects
//!
//! Identifiers, claims and ownership relations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::errors::ClaimParseError;

/// Identifier of a community/server. All tags and prefixes are partitioned by it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScopeId(pub u64);

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a user or automated account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub u64);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The identity issuing a request, with the per-request facts the
/// connector knows about it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Actor identifier.
    pub id: ActorId,
    /// Bot/automated account.
    pub automated: bool,
    /// Scope administrator. Bypasses the content line limit.
    pub privileged: bool,
}

impl Actor {
    /// A regular member.
    pub fn member(id: u64) -> Self {
        Self {
            id: ActorId(id),
            automated: false,
            privileged: false,
        }
    }

    /// A scope administrator.
    pub fn privileged(id: u64) -> Self {
        Self {
            privileged: true,
            ..Self::member(id)
        }
    }

    /// An automated account.
    pub fn automated(id: u64) -> Self {
        Self {
            automated: true,
            ..Self::member(id)
        }
    }
}

/// Permission label an actor may hold in a scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Claim {
    /// Create and claim tags.
    TagAdd,
    /// Delete tags owned by others.
    TagDelete,
    /// Transfer tags owned by others.
    TagTransfer,
    /// Change the scope's tag prefix.
    CustomTagPrefixSet,
}

impl Claim {
    /// All claims known to the engine.
    pub const ALL: [Claim; 4] = [
        Claim::TagAdd,
        Claim::TagDelete,
        Claim::TagTransfer,
        Claim::CustomTagPrefixSet,
    ];

    /// The snake_case label used by the claims backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            Claim::TagAdd => "tag_add",
            Claim::TagDelete => "tag_delete",
            Claim::TagTransfer => "tag_transfer",
            Claim::CustomTagPrefixSet => "custom_tag_prefix_set",
        }
    }
}

impl fmt::Display for Claim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Claim {
    type Err = ClaimParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Claim::ALL
            .into_iter()
            .find(|claim| claim.as_str() == s)
            .ok_or_else(|| ClaimParseError(s.to_string()))
    }
}

/// Claims held by one actor in one scope, resolved for a single request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimSet(BTreeSet<Claim>);

impl ClaimSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the claim is held.
    pub fn contains(&self, claim: Claim) -> bool {
        self.0.contains(&claim)
    }

    /// Add a claim.
    pub fn insert(&mut self, claim: Claim) -> bool {
        self.0.insert(claim)
    }

    /// Number of claims held.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no claim is held.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in label order.
    pub fn iter(&self) -> impl Iterator<Item = Claim> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Claim> for ClaimSet {
    fn from_iter<I: IntoIterator<Item = Claim>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// How the requesting actor relates to a tag's stored owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OwnerRelation {
    /// The actor is the stored owner.
    Owner,
    /// Someone else (or nobody) owns the tag.
    NotOwner,
    /// The action has no target tag.
    NoTarget,
}

impl OwnerRelation {
    /// Relation of `actor` to a tag owned by `owner`.
    pub fn of(actor: ActorId, owner: Option<ActorId>) -> Self {
        if owner == Some(actor) {
            OwnerRelation::Owner
        } else {
            OwnerRelation::NotOwner
        }
    }
}

/// A single-field change applied by the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagPatch {
    /// Replace the (already validated) content.
    Content(String),
    /// Replace the owner.
    Owner(ActorId),
}

/// Compare-and-swap precondition: the owner the caller last saw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OwnerExpectation(pub Option<ActorId>);

impl OwnerExpectation {
    /// Whether the stored owner is still the one expected.
    pub fn matches(&self, stored: Option<ActorId>) -> bool {
        self.0 == stored
    }
}
