//! Inline invocation parsing: `$name` anywhere in a message.

use crate::domain::normalize_name;

/// Tag names invoked inline in `message` with `prefix`.
///
/// Names are lower-cased with trailing ASCII punctuation removed; repeats
/// collapse in first-seen order. Text inside backtick code spans is skipped.
pub fn extract_invocations(message: &str, prefix: &str) -> Vec<String> {
    if prefix.is_empty() {
        return Vec::new();
    }

    let mut names: Vec<String> = Vec::new();
    for (i, segment) in message.split('`').enumerate() {
        // Odd segments sit between backticks
        if i % 2 == 1 {
            continue;
        }
        for token in segment.split_whitespace() {
            let Some(rest) = token.strip_prefix(prefix) else {
                continue;
            };
            let name = normalize_name(rest.trim_end_matches(|c: char| c.is_ascii_punctuation()));
            if !name.is_empty() && !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}
