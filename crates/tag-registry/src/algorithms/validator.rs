//! # Content Validator
//!
//! Name/content size policy and mention sanitizing.

use lazy_static::lazy_static;
use regex::Regex;

use crate::config::ContentLimits;
use crate::domain::{normalize_name, ValidationError};

lazy_static! {
    /// `@everyone`, `@here`, and user/role mentions by id.
    static ref MENTION: Regex =
        Regex::new(r"@(everyone|here|[!&]?[0-9]{17,20})").expect("mention pattern");
}

/// Name and content that passed the policy, ready to store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidContent {
    /// Lower-cased name.
    pub name: String,
    /// Mention-escaped content.
    pub content: String,
}

/// Check a name against the length policy and return its canonical form.
pub fn validate_name(name: &str, limits: &ContentLimits) -> Result<String, ValidationError> {
    let name = normalize_name(name);
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    let len = name.chars().count();
    if len > limits.max_name_chars {
        return Err(ValidationError::NameTooLong {
            len,
            max: limits.max_name_chars,
        });
    }
    Ok(name)
}

/// Check content against the size and line policy and escape mentions.
///
/// Privileged actors skip the line limit only.
pub fn validate_content(
    content: &str,
    actor_is_privileged: bool,
    limits: &ContentLimits,
) -> Result<String, ValidationError> {
    if content.trim().is_empty() {
        return Err(ValidationError::EmptyContent);
    }

    let len = content.chars().count();
    if len > limits.max_content_chars {
        return Err(ValidationError::ContentTooLong {
            len,
            max: limits.max_content_chars,
        });
    }

    let lines = content.split('\n').count();
    if lines > limits.max_lines_unprivileged && !actor_is_privileged {
        return Err(ValidationError::LineLimitExceeded {
            lines,
            max: limits.max_lines_unprivileged,
        });
    }

    Ok(escape_mentions(content))
}

/// Validate a name and content pair.
pub fn validate(
    name: &str,
    content: &str,
    actor_is_privileged: bool,
    limits: &ContentLimits,
) -> Result<ValidContent, ValidationError> {
    let name = validate_name(name, limits)?;
    let content = validate_content(content, actor_is_privileged, limits)?;
    Ok(ValidContent { name, content })
}

/// Insert a zero-width space after `@` in every mention so stored content
/// never pings anyone when replayed.
pub fn escape_mentions(text: &str) -> String {
    MENTION.replace_all(text, "@\u{200b}$1").into_owned()
}
