//! # Authorization Evaluator
//!
//! Every permission rule of the registry lives here.
//!
//! | Policy | Allowed when |
//! |--------|--------------|
//! | `Strict(c)` | actor holds `c` |
//! | `Disjunctive(c)` | actor owns the tag, or holds `c` |
//! | `OwnerOnly` | actor owns the tag |
//!
//! Ownership is local knowledge while claims need a call to the claims
//! collaborator, so [`Policy::decide_without_claims`] settles what it can
//! before any claim lookup.

use crate::domain::{Claim, ClaimSet, DenialReason, OwnerRelation};

/// Authorization rule attached to an action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Policy {
    /// The claim is required; ownership is irrelevant.
    Strict(Claim),
    /// Owner, or holder of the claim.
    Disjunctive(Claim),
    /// Owner only; claims are never consulted.
    OwnerOnly,
}

/// Result of an authorization check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthDecision {
    /// Go ahead.
    Allowed,
    /// Refused, with the failed condition(s).
    Denied(DenialReason),
}

impl AuthDecision {
    /// Whether the action may proceed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, AuthDecision::Allowed)
    }
}

impl Policy {
    /// Decide from ownership alone. `None` means the claim set is needed.
    pub fn decide_without_claims(&self, relation: OwnerRelation) -> Option<AuthDecision> {
        match (self, relation) {
            (Policy::Strict(_), _) => None,
            (Policy::Disjunctive(_), OwnerRelation::Owner) => Some(AuthDecision::Allowed),
            (Policy::Disjunctive(_), _) => None,
            (Policy::OwnerOnly, OwnerRelation::Owner) => Some(AuthDecision::Allowed),
            (Policy::OwnerOnly, _) => Some(AuthDecision::Denied(DenialReason::NotOwner)),
        }
    }
}

/// Evaluate a policy against a resolved claim set.
pub fn authorize(claims: &ClaimSet, policy: Policy, relation: OwnerRelation) -> AuthDecision {
    if let Some(decision) = policy.decide_without_claims(relation) {
        return decision;
    }

    match policy {
        Policy::Strict(claim) if claims.contains(claim) => AuthDecision::Allowed,
        Policy::Strict(claim) => AuthDecision::Denied(DenialReason::MissingClaim(claim)),
        Policy::Disjunctive(claim) if claims.contains(claim) => AuthDecision::Allowed,
        Policy::Disjunctive(claim) => {
            AuthDecision::Denied(DenialReason::NotOwnerOrMissingClaim(claim))
        }
        // Settled above for every relation
        Policy::OwnerOnly => AuthDecision::Denied(DenialReason::NotOwner),
    }
}
