//! Static policy lists and the screening checks run against detection output.
//!
//! Two independent checks:
//! - disallowed words: case-insensitive substring match against the text
//!   extracted from an image
//! - disallowed themes: case-sensitive exact match against detected
//!   moderation-category names
//!
//! Matches are reported in policy-list order, not in the order they appear
//! in the scanned input. Lists are immutable once loaded; updates happen by
//! editing the policy file and redeploying, never at runtime.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;

fn default_words() -> Vec<String> {
    vec!["private".into(), "security".into()]
}

// Category names as returned by the detection service. Case sensitive.
fn default_themes() -> Vec<String> {
    vec!["Tobacco".into(), "Alcohol".into()]
}

/// Word and theme lists screened on every moderated image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyLists {
    #[serde(default = "default_words")]
    pub disallowed_words: Vec<String>,
    #[serde(default = "default_themes")]
    pub disallowed_themes: Vec<String>,
}

impl Default for PolicyLists {
    fn default() -> Self {
        Self {
            disallowed_words: default_words(),
            disallowed_themes: default_themes(),
        }
    }
}

impl PolicyLists {
    /// Create empty lists (for testing).
    pub fn empty() -> Self {
        Self {
            disallowed_words: Vec::new(),
            disallowed_themes: Vec::new(),
        }
    }

    /// Load lists from a JSON policy file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let lists: Self =
            serde_json::from_str(&raw).map_err(|e| ConfigError::PolicyParse {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        info!(
            path = %path.display(),
            words = lists.disallowed_words.len(),
            themes = lists.disallowed_themes.len(),
            "Loaded policy lists"
        );
        Ok(lists)
    }

    /// Load from the configured policy file, or fall back to the built-in
    /// defaults when none is configured.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    /// Disallowed words found in `text` as case-insensitive substrings,
    /// in list order.
    pub fn matched_words(&self, text: &str) -> Vec<&str> {
        let lowered = text.to_lowercase();
        self.disallowed_words
            .iter()
            .filter(|word| lowered.contains(&word.to_lowercase()))
            .map(String::as_str)
            .collect()
    }

    /// Disallowed themes present in `categories` (exact, case-sensitive),
    /// in list order.
    pub fn matched_themes(&self, categories: &[String]) -> Vec<&str> {
        self.disallowed_themes
            .iter()
            .filter(|theme| categories.iter().any(|c| c == *theme))
            .map(String::as_str)
            .collect()
    }
}
