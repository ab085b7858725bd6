//! # Domain Entities
//!
//! The tag record and the views built from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::invariants::normalize_name;
use super::value_objects::{ActorId, ScopeId};

/// A named snippet stored in one scope.
///
/// `owner_id` is a soft reference: the actor may have left the scope, which
/// makes the tag vacant even though the field is set. Membership is never
/// cached here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Owning scope.
    pub scope_id: ScopeId,
    /// Lower-cased name, unique within the scope.
    pub name: String,
    /// Mention-escaped content.
    pub content: String,
    /// Stored owner, if any.
    pub owner_id: Option<ActorId>,
    /// Successful invocations. Never decreases.
    pub use_count: u64,
    /// Creation time. Immutable.
    pub created_at: DateTime<Utc>,
}

impl Tag {
    /// Create a fresh, unused tag.
    pub fn new(
        scope_id: ScopeId,
        name: &str,
        content: impl Into<String>,
        owner_id: Option<ActorId>,
    ) -> Self {
        Self {
            scope_id,
            name: normalize_name(name),
            content: content.into(),
            owner_id,
            use_count: 0,
            created_at: Utc::now(),
        }
    }

    /// Whether `actor` is the stored owner.
    pub fn is_owned_by(&self, actor: ActorId) -> bool {
        self.owner_id == Some(actor)
    }
}

/// A tag together with its live owner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagInfo {
    /// The tag as stored.
    pub tag: Tag,
    /// Stored owner if still a member, `None` when vacant.
    pub owner: Option<ActorId>,
}

impl TagInfo {
    /// Whether the tag can be claimed.
    pub fn is_unclaimed(&self) -> bool {
        self.owner.is_none()
    }
}
