//! # Name Similarity
//!
//! Scoring used by fuzzy resolution and "did you mean" suggestions.
//!
//! The score is normalized Levenshtein similarity, raised for substring
//! containment to `0.5 + 0.5 * query_len / candidate_len`. Both inputs are
//! compared lower-cased.

use std::cmp::Ordering;

use crate::config::FuzzyConfig;
use crate::domain::{normalize_name, Tag};

/// Similarity between a query and a candidate name, in `0.0..=1.0`.
pub fn score(query: &str, candidate: &str) -> f64 {
    let query = normalize_name(query);
    let candidate = normalize_name(candidate);
    if query.is_empty() || candidate.is_empty() {
        return 0.0;
    }

    let edit = strsim::normalized_levenshtein(&query, &candidate);
    if candidate.contains(&query) {
        let ratio = query.chars().count() as f64 / candidate.chars().count() as f64;
        edit.max(0.5 + 0.5 * ratio)
    } else {
        edit
    }
}

/// Outcome of a fuzzy lookup.
#[derive(Clone, Debug, PartialEq)]
pub enum FuzzyMatch<'a> {
    /// One candidate cleared the threshold by more than the tie margin.
    Found(&'a Tag, f64),
    /// The top two candidates are within the tie margin.
    Ambiguous,
    /// Nothing cleared the threshold.
    NoMatch,
}

/// Pick the single best candidate for `query`.
///
/// Ambiguity is never resolved silently: when the runner-up is within
/// `tie_margin` of the best score the result is [`FuzzyMatch::Ambiguous`],
/// whether or not the runner-up itself clears `threshold`.
pub fn best_match<'a>(query: &str, candidates: &'a [Tag], config: &FuzzyConfig) -> FuzzyMatch<'a> {
    let mut scored: Vec<(&Tag, f64)> = candidates
        .iter()
        .map(|tag| (tag, score(query, &tag.name)))
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    match scored.as_slice() {
        [] => FuzzyMatch::NoMatch,
        [(_, best), ..] if *best < config.threshold => FuzzyMatch::NoMatch,
        [(tag, best)] => FuzzyMatch::Found(tag, *best),
        [(tag, best), (_, second), ..] => {
            if best - second < config.tie_margin {
                FuzzyMatch::Ambiguous
            } else {
                FuzzyMatch::Found(tag, *best)
            }
        }
    }
}

/// Rank candidates for display.
///
/// Names containing the query come first, then the rest whose score clears
/// `suggestion_floor`. Within each group: score, then use count, then name.
pub fn rank_suggestions(query: &str, candidates: &[Tag], config: &FuzzyConfig) -> Vec<Tag> {
    let needle = normalize_name(query);
    if needle.is_empty() {
        return Vec::new();
    }

    let mut ranked: Vec<(bool, f64, &Tag)> = candidates
        .iter()
        .map(|tag| (tag.name.contains(&needle), score(&needle, &tag.name), tag))
        .filter(|(contains, s, _)| *contains || *s >= config.suggestion_floor)
        .collect();

    ranked.sort_by(|a, b| {
        b.0.cmp(&a.0)
            .then_with(|| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal))
            .then_with(|| b.2.use_count.cmp(&a.2.use_count))
            .then_with(|| a.2.name.cmp(&b.2.name))
    });

    ranked
        .into_iter()
        .take(config.max_suggestions)
        .map(|(_, _, tag)| tag.clone())
        .collect()
}
