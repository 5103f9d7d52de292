//! Persistence port for keyword-to-partner associations.
//!
//! Implementations own the storage details; no driver types appear in the
//! signatures. Keyword arguments are normalized (trimmed, lowercased) by the
//! implementation before they are stored or compared.

use async_trait::async_trait;
use thiserror::Error;

use crate::partner::{KeywordAggregate, KeywordFrequency, PartnerData, PartnerRef, PartnerType};

#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error("stored data could not be decoded: {0}")]
    InvalidData(String),
}

#[async_trait]
pub trait PartnerDataRepository: Send + Sync {
    async fn find(
        &self,
        partner: PartnerRef,
        keyword: &str,
    ) -> Result<Option<PartnerData>, RepositoryError>;

    /// All associations of one partner, most frequent first.
    async fn find_by_partner(&self, partner: PartnerRef)
        -> Result<Vec<PartnerData>, RepositoryError>;

    /// All associations storing exactly `keyword`, optionally for one partner type.
    async fn find_by_keyword(
        &self,
        keyword: &str,
        partner_type: Option<PartnerType>,
    ) -> Result<Vec<PartnerData>, RepositoryError>;

    /// Case-insensitive substring search of every keyword against stored data,
    /// aggregated per partner.
    ///
    /// `total_score` sums the occurrence counts of the matching associations
    /// (each association once, however many keywords hit it) and
    /// `keyword_count` is the number of distinct searched keywords that hit.
    /// Rows come back ordered by `keyword_count` then `total_score`, both
    /// descending, at most `limit` of them. That order is advisory.
    async fn search_by_keywords(
        &self,
        keywords: &[String],
        partner_type: Option<PartnerType>,
        limit: usize,
    ) -> Result<Vec<KeywordAggregate>, RepositoryError>;

    /// Inserts the association, or adds `occurrence_count` to the stored one.
    async fn save(&self, data: &PartnerData) -> Result<(), RepositoryError>;

    /// Returns whether a row was removed.
    async fn delete(&self, partner: PartnerRef, keyword: &str) -> Result<bool, RepositoryError>;

    /// Returns the number of rows removed.
    async fn delete_by_partner(&self, partner: PartnerRef) -> Result<u64, RepositoryError>;

    /// Adds `by` to an existing association. Returns `false` when there is none.
    async fn increment_occurrence(
        &self,
        partner: PartnerRef,
        keyword: &str,
        by: i64,
    ) -> Result<bool, RepositoryError>;

    async fn count(&self, partner_type: Option<PartnerType>) -> Result<i64, RepositoryError>;

    async fn exists(&self, partner: PartnerRef, keyword: &str) -> Result<bool, RepositoryError>;

    /// Most frequent keywords across partners.
    async fn top_keywords(
        &self,
        partner_type: Option<PartnerType>,
        limit: usize,
    ) -> Result<Vec<KeywordFrequency>, RepositoryError>;
}
