use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

use crate::keyword::{KeywordRules, DEFAULT_MIN_KEYWORD_LENGTH};

pub const CONFIDENCE_THRESHOLD_KEY: &str = "keyword_confidence_threshold";
pub const CLUSTERING_BONUS_KEY: &str = "keyword_clustering_bonus";
pub const OVERFETCH_MULTIPLIER_KEY: &str = "keyword_overfetch_multiplier";
pub const MIN_KEYWORD_LENGTH_KEY: &str = "keyword_min_length";
pub const STOPWORDS_KEY: &str = "keyword_stopwords";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Read-only key/value source of tunable parameters (e.g. a settings table).
pub trait SettingsSource {
    fn setting(&self, key: &str) -> Option<String>;
}

impl SettingsSource for HashMap<String, String> {
    fn setting(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Matches whose confidence falls below this (0.0–1.0) are dropped.
    pub confidence_threshold: f64,
    /// Multiplicative bonus per matched keyword beyond the first.
    pub clustering_bonus: f64,
    /// How many times `limit` rows to request from the repository.
    pub overfetch_multiplier: usize,
    pub min_keyword_length: usize,
    /// Replaces the built-in stopword list when set.
    pub stopwords: Option<Vec<String>>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.30,
            clustering_bonus: 0.20,
            overfetch_multiplier: 2,
            min_keyword_length: DEFAULT_MIN_KEYWORD_LENGTH,
            stopwords: None,
        }
    }
}

impl MatchConfig {
    pub fn from_toml(toml_content: &str) -> Result<Self, ConfigError> {
        let config: MatchConfig = toml::from_str(toml_content)?;
        Ok(config.sanitized())
    }

    /// Reads every known key from `source`. A missing source, a missing key or
    /// an unparsable value leaves the default in place.
    pub fn from_settings(source: Option<&dyn SettingsSource>) -> Self {
        let mut config = Self::default();
        let Some(source) = source else {
            return config;
        };

        if let Some(v) = parse_setting::<f64>(source, CONFIDENCE_THRESHOLD_KEY) {
            // The ledger UI stores this as a percentage, so "1" means 1%.
            config.confidence_threshold = if v >= 1.0 { v / 100.0 } else { v };
        }
        if let Some(v) = parse_setting::<f64>(source, CLUSTERING_BONUS_KEY) {
            config.clustering_bonus = v;
        }
        if let Some(v) = parse_setting::<usize>(source, OVERFETCH_MULTIPLIER_KEY) {
            config.overfetch_multiplier = v;
        }
        if let Some(v) = parse_setting::<usize>(source, MIN_KEYWORD_LENGTH_KEY) {
            config.min_keyword_length = v;
        }
        if let Some(list) = source.setting(STOPWORDS_KEY) {
            config.stopwords = Some(
                list.split(',')
                    .map(|w| w.trim().to_lowercase())
                    .filter(|w| !w.is_empty())
                    .collect(),
            );
        }

        config.sanitized()
    }

    pub fn keyword_rules(&self) -> KeywordRules {
        match &self.stopwords {
            Some(words) => KeywordRules::new(self.min_keyword_length, words.iter().cloned()),
            None => KeywordRules {
                min_length: self.min_keyword_length,
                ..KeywordRules::default()
            },
        }
    }

    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            tracing::warn!(
                value = self.confidence_threshold,
                "confidence threshold out of range, using default"
            );
            self.confidence_threshold = defaults.confidence_threshold;
        }
        if !self.clustering_bonus.is_finite() || self.clustering_bonus < 0.0 {
            tracing::warn!(
                value = self.clustering_bonus,
                "negative clustering bonus, using default"
            );
            self.clustering_bonus = defaults.clustering_bonus;
        }
        self.overfetch_multiplier = self.overfetch_multiplier.max(1);
        self.min_keyword_length = self.min_keyword_length.max(1);
        self
    }
}

fn parse_setting<T: FromStr>(source: &dyn SettingsSource, key: &str) -> Option<T> {
    let raw = source.setting(key)?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "unparsable setting, using default");
            None
        }
    }
}
