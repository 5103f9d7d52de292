use counterparty_core::{
    KeywordAggregate, KeywordMatch, MatchConfig, PartnerDataRepository, PartnerType,
};
use std::cmp::Ordering;
use std::sync::Arc;

use crate::error::MatchError;
use crate::extractor::KeywordExtractor;

/// Weight of keyword coverage (matched / extracted) in the confidence score.
const COVERAGE_WEIGHT: f64 = 0.6;
/// Weight of the score relative to the best score in the same batch.
const STRENGTH_WEIGHT: f64 = 0.4;

/// Ranks known partners by how well their stored keywords cover a piece of
/// transaction text.
pub struct KeywordMatchingService<R: PartnerDataRepository + ?Sized> {
    repository: Arc<R>,
    extractor: KeywordExtractor,
    config: MatchConfig,
}

struct ScoredRow {
    aggregate: KeywordAggregate,
    final_score: f64,
    confidence: f64,
}

impl<R: PartnerDataRepository + ?Sized> KeywordMatchingService<R> {
    pub fn new(repository: Arc<R>, config: MatchConfig) -> Self {
        let extractor = KeywordExtractor::from_config(&config);
        Self::with_extractor(repository, extractor, config)
    }

    pub fn with_extractor(
        repository: Arc<R>,
        extractor: KeywordExtractor,
        config: MatchConfig,
    ) -> Self {
        Self {
            repository,
            extractor,
            config,
        }
    }

    pub fn extractor(&self) -> &KeywordExtractor {
        &self.extractor
    }

    pub fn extractor_mut(&mut self) -> &mut KeywordExtractor {
        &mut self.extractor
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Returns at most `limit` partners, best first. No keywords, no stored
    /// hits and nothing above the confidence threshold all give an empty list.
    pub async fn search(
        &self,
        text: &str,
        partner_type: Option<PartnerType>,
        limit: usize,
    ) -> Result<Vec<KeywordMatch>, MatchError> {
        let keywords = self.extractor.extract_as_strings(text);
        if keywords.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let fetch_limit = limit.saturating_mul(self.config.overfetch_multiplier);
        let rows = self
            .repository
            .search_by_keywords(&keywords, partner_type, fetch_limit)
            .await?;
        tracing::debug!(
            keywords = keywords.len(),
            rows = rows.len(),
            fetch_limit,
            "keyword search fetched candidates"
        );
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let max_total_score = rows.iter().map(|r| r.total_score).max().unwrap_or(0);
        let keyword_total = keywords.len() as f64;

        let mut scored: Vec<ScoredRow> = rows
            .into_iter()
            .map(|aggregate| {
                let raw_score = aggregate.total_score as f64;
                let coverage = aggregate.keyword_count as f64 / keyword_total;
                let strength = if max_total_score > 0 {
                    raw_score / max_total_score as f64
                } else {
                    0.0
                };
                ScoredRow {
                    final_score: self.calculate_score(raw_score, aggregate.keyword_count),
                    confidence: coverage * COVERAGE_WEIGHT + strength * STRENGTH_WEIGHT,
                    aggregate,
                }
            })
            .filter(|row| row.confidence >= self.config.confidence_threshold)
            .collect();
        tracing::debug!(
            kept = scored.len(),
            threshold = self.config.confidence_threshold,
            "keyword candidates above confidence threshold"
        );

        scored.sort_by(|a, b| {
            b.aggregate
                .keyword_count
                .cmp(&a.aggregate.keyword_count)
                .then_with(|| {
                    b.final_score
                        .partial_cmp(&a.final_score)
                        .unwrap_or(Ordering::Equal)
                })
                .then_with(|| a.aggregate.partner.cmp(&b.aggregate.partner))
        });
        scored.truncate(limit);

        Ok(scored
            .into_iter()
            .map(|row| {
                let raw_score = row.aggregate.total_score as f64;
                KeywordMatch::new(
                    row.aggregate.partner,
                    row.aggregate.partner_name,
                    row.aggregate.matched_keywords,
                    raw_score,
                    row.final_score,
                )
            })
            .collect())
    }

    pub async fn top_match(
        &self,
        text: &str,
        partner_type: Option<PartnerType>,
    ) -> Result<Option<KeywordMatch>, MatchError> {
        Ok(self.search(text, partner_type, 1).await?.into_iter().next())
    }

    /// `raw * (1 + (keyword_count - 1) * bonus)`: every distinct keyword past
    /// the first adds a flat multiplicative bonus.
    pub fn calculate_score(&self, raw_score: f64, keyword_count: usize) -> f64 {
        let extra = keyword_count.saturating_sub(1) as f64;
        raw_score * (1.0 + extra * self.config.clustering_bonus)
    }
}
