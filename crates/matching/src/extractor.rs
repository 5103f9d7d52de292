use counterparty_core::keyword::normalize;
use counterparty_core::{Keyword, KeywordRules, MatchConfig};
use std::collections::HashSet;

/// Symbols dropped from inside a token, so `AT&T` reads as `att`. Any other
/// non-alphanumeric character except `-` ends the token.
const STRIPPED_SYMBOLS: &[char] = &['@', '#', '$', '&', '*', '%', '+', '~', '^', '_'];

/// Turns free transaction text (memo, merchant name, title) into the set of
/// keywords worth looking up.
#[derive(Debug, Clone, Default)]
pub struct KeywordExtractor {
    rules: KeywordRules,
}

impl KeywordExtractor {
    pub fn new(rules: KeywordRules) -> Self {
        Self { rules }
    }

    pub fn from_config(config: &MatchConfig) -> Self {
        Self::new(config.keyword_rules())
    }

    pub fn rules(&self) -> &KeywordRules {
        &self.rules
    }

    /// Lowercases, splits on whitespace and punctuation, strips symbols such
    /// as `#`, `@` and `$` from each token, then drops stopwords, short tokens
    /// and numbers. Duplicates collapse to one keyword.
    pub fn extract(&self, text: &str) -> Vec<Keyword> {
        let mut seen = HashSet::new();
        text.to_lowercase()
            .split(is_separator)
            .map(clean_token)
            .filter_map(|token| Keyword::parse(&token, &self.rules).ok())
            .filter(|kw| seen.insert(kw.clone()))
            .collect()
    }

    /// Cleans a single keyword the way [`extract`](Self::extract) cleans each
    /// token, without validating it.
    pub fn clean(&self, raw: &str) -> String {
        clean_token(&normalize(raw))
    }

    pub fn extract_as_strings(&self, text: &str) -> Vec<String> {
        self.extract(text)
            .into_iter()
            .map(Keyword::into_string)
            .collect()
    }

    pub fn is_valid(&self, token: &str) -> bool {
        self.rules.check(&normalize(token)).is_ok()
    }

    pub fn is_valid_with_min_length(&self, token: &str, min_length: usize) -> bool {
        self.rules
            .check_with_min_length(&normalize(token), min_length)
            .is_ok()
    }

    pub fn add_stopword(&mut self, word: &str) {
        let word = normalize(word);
        if !word.is_empty() {
            self.rules.stopwords.insert(word);
        }
    }

    pub fn remove_stopword(&mut self, word: &str) -> bool {
        self.rules.stopwords.remove(&normalize(word))
    }

    pub fn stopwords(&self) -> &HashSet<String> {
        &self.rules.stopwords
    }
}

fn is_separator(c: char) -> bool {
    !(c.is_alphanumeric() || c == '-' || STRIPPED_SYMBOLS.contains(&c))
}

fn clean_token(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-')
        .collect();
    kept.trim_matches('-').to_string()
}
