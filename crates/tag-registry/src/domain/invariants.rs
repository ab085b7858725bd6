//! # Domain Invariants
//!
//! Limits and rules that must always hold.

use super::errors::ConflictKind;
use super::value_objects::ActorId;

/// Maximum tag name length, in characters.
pub const MAX_TAG_NAME_SIZE: usize = 20;

/// Maximum tag content length, in characters.
pub const MAX_TAG_CONTENT_SIZE: usize = 1000;

/// Maximum content lines for non-privileged actors.
pub const MAX_NON_ADMIN_LINES: usize = 10;

/// Tags per listing page.
pub const TAG_CHUNK_SIZE: usize = 12;

/// Prefix used when a scope has no override.
pub const DEFAULT_TAG_PREFIX: &str = "$";

/// Characters a custom prefix may not contain.
pub const RESERVED_PREFIX_CHARS: &[char] = &['`'];

/// Canonical form of a tag name: trimmed and lower-cased.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Invariant: a transfer needs a live owner and a different recipient.
pub fn invariant_transferable(
    live_owner: Option<ActorId>,
    recipient: ActorId,
) -> Result<ActorId, ConflictKind> {
    match live_owner {
        None => Err(ConflictKind::Unclaimed),
        Some(owner) if owner == recipient => Err(ConflictKind::RecipientAlreadyOwner),
        Some(owner) => Ok(owner),
    }
}

/// Invariant: use counts never decrease.
pub fn invariant_use_count_monotonic(before: u64, after: u64) -> bool {
    after >= before
}
