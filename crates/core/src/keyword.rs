use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

pub const DEFAULT_MIN_KEYWORD_LENGTH: usize = 3;

/// Common English function words that carry no signal about the counterparty.
pub const DEFAULT_STOPWORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "am", "an", "and", "any", "are", "as", "at", "be",
    "been", "before", "but", "by", "can", "could", "did", "do", "does", "for", "from", "had",
    "has", "have", "he", "her", "his", "how", "if", "in", "into", "is", "it", "its", "may",
    "me", "my", "no", "not", "of", "on", "or", "our", "out", "over", "she", "so", "than",
    "that", "the", "their", "them", "then", "there", "these", "they", "this", "those", "to",
    "too", "under", "up", "us", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "why", "will", "with", "would", "you", "your",
];

/// Why a token was refused as a keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum KeywordRejection {
    #[error("keyword is empty")]
    Empty,
    #[error("keyword is shorter than {min_length} characters")]
    TooShort { min_length: usize },
    #[error("keyword is a stopword")]
    Stopword,
    #[error("keyword is purely numeric")]
    Numeric,
    #[error("keyword has no letters or digits")]
    Symbols,
}

/// Validation rules shared by extraction and the write path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordRules {
    pub min_length: usize,
    pub stopwords: HashSet<String>,
}

impl Default for KeywordRules {
    fn default() -> Self {
        Self {
            min_length: DEFAULT_MIN_KEYWORD_LENGTH,
            stopwords: DEFAULT_STOPWORDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}

impl KeywordRules {
    pub fn new(min_length: usize, stopwords: impl IntoIterator<Item = String>) -> Self {
        Self {
            min_length,
            stopwords: stopwords.into_iter().map(|w| normalize(&w)).collect(),
        }
    }

    /// Checks an already-normalized token against these rules.
    pub fn check(&self, token: &str) -> Result<(), KeywordRejection> {
        self.check_with_min_length(token, self.min_length)
    }

    pub fn check_with_min_length(
        &self,
        token: &str,
        min_length: usize,
    ) -> Result<(), KeywordRejection> {
        if token.is_empty() {
            return Err(KeywordRejection::Empty);
        }
        if token.chars().count() < min_length {
            return Err(KeywordRejection::TooShort { min_length });
        }
        if self.stopwords.contains(token) {
            return Err(KeywordRejection::Stopword);
        }
        if !token.chars().any(char::is_alphanumeric) {
            return Err(KeywordRejection::Symbols);
        }
        if !token.chars().any(char::is_alphabetic) {
            return Err(KeywordRejection::Numeric);
        }
        Ok(())
    }
}

/// A single normalized (trimmed, lowercased) search token that passed the
/// active [`KeywordRules`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Keyword(String);

impl Keyword {
    pub fn parse(raw: &str, rules: &KeywordRules) -> Result<Self, KeywordRejection> {
        let text = normalize(raw);
        rules.check(&text)?;
        Ok(Keyword(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Keyword {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}
