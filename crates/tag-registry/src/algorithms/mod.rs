//! # Algorithms Module
//!
//! Pure policy: validation, similarity, authorization, pagination and
//! inline invocation parsing. No I/O.

pub mod authorization;
pub mod inline;
pub mod pagination;
pub mod similarity;
pub mod validator;

pub use authorization::{authorize, AuthDecision, Policy};
pub use inline::extract_invocations;
pub use pagination::{chunk, paginate, Page};
pub use similarity::{best_match, rank_suggestions, score, FuzzyMatch};
pub use validator::{escape_mentions, validate, validate_content, validate_name, ValidContent};
