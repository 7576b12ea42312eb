//! Missing-value tokens recognised during coercion

use serde::{Serialize, Deserialize};

/// Tokens spreadsheet and dataframe exports commonly write for a missing cell
pub const DEFAULT_NULL_TOKENS: &[&str] = &["", "-", "NA", "N/A", "#N/A", "<NA>", "NaN", "null", "None"];

/// Which raw cell texts count as missing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NullConfig {
    /// Tokens that mark a missing value
    pub patterns: Vec<String>,

    /// Ignore surrounding whitespace
    pub trim_whitespace: bool,

    pub case_sensitive: bool,
}

impl Default for NullConfig {
    fn default() -> Self {
        Self {
            patterns: DEFAULT_NULL_TOKENS.iter().map(|t| t.to_string()).collect(),
            trim_whitespace: true,
            case_sensitive: false,
        }
    }
}

impl NullConfig {
    /// Only the given tokens, matched exactly
    pub fn exact<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: tokens.into_iter().map(Into::into).collect(),
            trim_whitespace: false,
            case_sensitive: true,
        }
    }

    /// Whether a raw cell is a missing value
    pub fn is_null(&self, raw: &str) -> bool {
        let raw = if self.trim_whitespace { raw.trim() } else { raw };
        self.patterns.iter().any(|token| self.token_matches(token, raw))
    }

    /// Register another token, ignoring duplicates
    pub fn add_pattern(&mut self, token: String) {
        if !self.patterns.iter().any(|t| *t == token) {
            self.patterns.push(token);
        }
    }

    fn token_matches(&self, token: &str, raw: &str) -> bool {
        if self.case_sensitive {
            token == raw
        } else {
            token.eq_ignore_ascii_case(raw)
        }
    }
}
