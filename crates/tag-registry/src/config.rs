//! # Registry Configuration
//!
//! Limits, fuzzy-matching parameters and collaborator timeouts.

use serde::{Deserialize, Serialize};
use std::env;
use std::num::NonZeroUsize;
use std::time::Duration;
use thiserror::Error;

use crate::domain::{
    DEFAULT_TAG_PREFIX, MAX_NON_ADMIN_LINES, MAX_TAG_CONTENT_SIZE, MAX_TAG_NAME_SIZE,
    RESERVED_PREFIX_CHARS, TAG_CHUNK_SIZE,
};

/// Name and content policy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentLimits {
    /// Maximum name length in characters.
    pub max_name_chars: usize,
    /// Maximum content length in characters.
    pub max_content_chars: usize,
    /// Maximum lines for non-privileged actors.
    pub max_lines_unprivileged: usize,
}

impl Default for ContentLimits {
    fn default() -> Self {
        Self {
            max_name_chars: MAX_TAG_NAME_SIZE,
            max_content_chars: MAX_TAG_CONTENT_SIZE,
            max_lines_unprivileged: MAX_NON_ADMIN_LINES,
        }
    }
}

/// Fuzzy resolution and suggestion parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FuzzyConfig {
    /// Minimum score (0.0 - 1.0) for a fuzzy hit.
    pub threshold: f64,
    /// If the best two scores are closer than this, resolution fails.
    pub tie_margin: f64,
    /// Minimum score for a non-containing candidate to be suggested.
    pub suggestion_floor: f64,
    /// Maximum suggestions returned.
    pub max_suggestions: usize,
}

impl Default for FuzzyConfig {
    fn default() -> Self {
        Self {
            threshold: 0.6,
            tie_margin: 0.05,
            suggestion_floor: 0.3,
            max_suggestions: 5,
        }
    }
}

/// Registry configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Name/content policy.
    pub limits: ContentLimits,
    /// Fuzzy matching.
    pub fuzzy: FuzzyConfig,
    /// Tags per listing page.
    pub page_size: NonZeroUsize,
    /// Prefix used when a scope has no override.
    pub default_prefix: String,
    /// Characters a custom prefix may not contain.
    pub reserved_prefix_chars: Vec<char>,
    /// Upper bound for any single collaborator call, in milliseconds.
    pub collaborator_timeout_ms: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            limits: ContentLimits::default(),
            fuzzy: FuzzyConfig::default(),
            page_size: NonZeroUsize::new(TAG_CHUNK_SIZE).unwrap_or(NonZeroUsize::MIN),
            default_prefix: DEFAULT_TAG_PREFIX.to_string(),
            reserved_prefix_chars: RESERVED_PREFIX_CHARS.to_vec(),
            collaborator_timeout_ms: 3000,
        }
    }
}

/// Rejected configuration value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable could not be parsed.
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue {
        /// Variable name
        var: String,
        /// Raw value
        value: String,
    },
    /// Thresholds outside 0.0 - 1.0, or a zero limit.
    #[error("out of range: {0}")]
    OutOfRange(String),
}

impl RegistryConfig {
    /// Create a config for testing (short timeouts).
    pub fn for_testing() -> Self {
        Self {
            collaborator_timeout_ms: 200,
            ..Self::default()
        }
    }

    /// Collaborator timeout as a `Duration`.
    pub fn collaborator_timeout(&self) -> Duration {
        Duration::from_millis(self.collaborator_timeout_ms)
    }

    /// Defaults overridden by environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `TAG_MAX_NAME_CHARS`, `TAG_MAX_CONTENT_CHARS`, `TAG_MAX_LINES`
    /// - `TAG_FUZZY_THRESHOLD`, `TAG_FUZZY_TIE_MARGIN`, `TAG_SUGGESTION_FLOOR`,
    ///   `TAG_MAX_SUGGESTIONS`
    /// - `TAG_PAGE_SIZE`
    /// - `TAG_DEFAULT_PREFIX`
    /// - `TAG_COLLABORATOR_TIMEOUT_MS`
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(v) = parse_var("TAG_MAX_NAME_CHARS")? {
            config.limits.max_name_chars = v;
        }
        if let Some(v) = parse_var("TAG_MAX_CONTENT_CHARS")? {
            config.limits.max_content_chars = v;
        }
        if let Some(v) = parse_var("TAG_MAX_LINES")? {
            config.limits.max_lines_unprivileged = v;
        }
        if let Some(v) = parse_var("TAG_FUZZY_THRESHOLD")? {
            config.fuzzy.threshold = v;
        }
        if let Some(v) = parse_var("TAG_FUZZY_TIE_MARGIN")? {
            config.fuzzy.tie_margin = v;
        }
        if let Some(v) = parse_var("TAG_SUGGESTION_FLOOR")? {
            config.fuzzy.suggestion_floor = v;
        }
        if let Some(v) = parse_var("TAG_MAX_SUGGESTIONS")? {
            config.fuzzy.max_suggestions = v;
        }
        if let Some(v) = parse_var::<usize>("TAG_PAGE_SIZE")? {
            config.page_size = NonZeroUsize::new(v)
                .ok_or_else(|| ConfigError::OutOfRange("TAG_PAGE_SIZE must be positive".into()))?;
        }
        if let Ok(prefix) = env::var("TAG_DEFAULT_PREFIX") {
            config.default_prefix = prefix;
        }
        if let Some(v) = parse_var("TAG_COLLABORATOR_TIMEOUT_MS")? {
            config.collaborator_timeout_ms = v;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("threshold", self.fuzzy.threshold),
            ("tie_margin", self.fuzzy.tie_margin),
            ("suggestion_floor", self.fuzzy.suggestion_floor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange(format!("{name} = {value}")));
            }
        }
        if self.limits.max_name_chars == 0 || self.limits.max_content_chars == 0 {
            return Err(ConfigError::OutOfRange("content limits must be positive".into()));
        }
        if self.default_prefix.is_empty()
            || self
                .default_prefix
                .chars()
                .any(|c| self.reserved_prefix_chars.contains(&c))
        {
            return Err(ConfigError::OutOfRange(format!(
                "default prefix {:?}",
                self.default_prefix
            )));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(var: &str) -> Result<Option<T>, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                var: var.to_string(),
                value: raw,
            }),
        Err(_) => Ok(None),
    }
}
