//! # Domain Errors
//!
//! Failure kinds returned by the registry. None of them is fatal: every
//! action can be reissued by the caller.

use thiserror::Error;

use super::entities::Tag;
use super::value_objects::{ActorId, Claim};

/// Name or content policy violation. The user corrects the input.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Tag name is empty after trimming.
    #[error("Tag name cannot be empty")]
    EmptyName,

    /// Tag name is over the character limit.
    #[error("Tag name exceeds {max} characters")]
    NameTooLong {
        /// Characters submitted
        len: usize,
        /// Limit
        max: usize,
    },

    /// Content is empty or whitespace only.
    #[error("Tag content cannot be empty")]
    EmptyContent,

    /// Content is over the character limit.
    #[error("Tag content exceeds {max} characters")]
    ContentTooLong {
        /// Characters submitted
        len: usize,
        /// Limit
        max: usize,
    },

    /// Too many lines for a non-privileged actor.
    #[error("Tag line number exceeds {max} lines")]
    LineLimitExceeded {
        /// Lines submitted
        lines: usize,
        /// Limit
        max: usize,
    },

    /// Prefix is empty or contains a reserved character.
    #[error("Invalid tag prefix: {reason}")]
    InvalidPrefix {
        /// Human-readable cause
        reason: String,
    },
}

/// Why an authorization check failed.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum DenialReason {
    /// The required claim is not held.
    #[error("missing `{0}` claim")]
    MissingClaim(Claim),

    /// The actor does not own the tag.
    #[error("not the tag owner")]
    NotOwner,

    /// Neither the owner nor a holder of the claim.
    #[error("missing `{0}` claim and not the tag owner")]
    NotOwnerOrMissingClaim(Claim),
}

impl DenialReason {
    /// Stable label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            DenialReason::MissingClaim(_) => "missing_claim",
            DenialReason::NotOwner => "not_owner",
            DenialReason::NotOwnerOrMissingClaim(_) => "not_owner_or_missing_claim",
        }
    }
}

/// Informational conflicts.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ConflictKind {
    /// A tag with this name already exists in the scope.
    #[error("a tag with this name already exists")]
    NameTaken,

    /// The requested prefix is already active.
    #[error("that is already the tag prefix")]
    PrefixUnchanged,

    /// The transfer recipient already owns the tag.
    #[error("recipient already owns the tag")]
    RecipientAlreadyOwner,

    /// The tag has no live owner and must be claimed first.
    #[error("tag is unclaimed")]
    Unclaimed,

    /// The stored owner changed while the action was in flight.
    #[error("tag was modified concurrently")]
    ConcurrentModification,
}

/// Failure reported by an outbound port.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CollaboratorError {
    /// Create-if-absent found an existing entry.
    #[error("entry already exists")]
    Conflict,

    /// Compare-and-swap precondition failed.
    #[error("owner changed (current: {current_owner:?})")]
    CasFailure {
        /// Owner actually stored
        current_owner: Option<ActorId>,
    },

    /// Addressed entry does not exist.
    #[error("entry not found")]
    NotFound,

    /// The call did not complete in time.
    #[error("operation timed out: {operation}")]
    Timeout {
        /// Port operation name
        operation: String,
    },

    /// The backend could not be reached.
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
}

impl CollaboratorError {
    /// Timeouts and unavailability may succeed when retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CollaboratorError::Timeout { .. } | CollaboratorError::Unavailable(_)
        )
    }
}

/// Result of any registry or prefix action that did not succeed.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum RegistryError {
    /// Input rejected by the content validator.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// No tag by that name. Carries "did you mean" candidates.
    #[error("Requested tag `{name}` does not exist")]
    NotFound {
        /// Name as requested (lower-cased)
        name: String,
        /// Ranked suggestions, possibly empty
        suggestions: Vec<Tag>,
    },

    /// Redundant or colliding request.
    #[error("Conflict: {0}")]
    Conflict(ConflictKind),

    /// Authorization failed.
    #[error("Denied: {0}")]
    Denied(DenialReason),

    /// Claim attempted on a tag whose owner is still a member.
    #[error("Tag is already owned by {owner}")]
    AlreadyOwned {
        /// Live owner
        owner: ActorId,
    },

    /// Transfer target cannot own tags.
    #[error("Cannot transfer a tag to automated account {recipient}")]
    InvalidRecipient {
        /// Rejected recipient
        recipient: ActorId,
    },

    /// A collaborator failed twice in a row, or returned an unexpected error.
    #[error("{operation} failed: {source}")]
    CollaboratorUnavailable {
        /// Port operation name
        operation: String,
        /// Last failure seen
        source: CollaboratorError,
    },
}

impl RegistryError {
    /// Every kind is recoverable by correcting input or reissuing the request.
    pub fn is_recoverable(&self) -> bool {
        true
    }

    /// Stable label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            RegistryError::Validation(_) => "validation",
            RegistryError::NotFound { .. } => "not_found",
            RegistryError::Conflict(_) => "conflict",
            RegistryError::Denied(_) => "denied",
            RegistryError::AlreadyOwned { .. } => "already_owned",
            RegistryError::InvalidRecipient { .. } => "invalid_recipient",
            RegistryError::CollaboratorUnavailable { .. } => "collaborator_unavailable",
        }
    }

    pub(crate) fn not_found(name: &str) -> Self {
        RegistryError::NotFound {
            name: name.to_string(),
            suggestions: Vec::new(),
        }
    }
}

/// Unknown claim label.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("`{0}` is not a valid Claim")]
pub struct ClaimParseError(pub String);
