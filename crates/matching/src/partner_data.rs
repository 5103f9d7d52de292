use counterparty_core::{
    Keyword, KeywordFrequency, MatchConfig, PartnerData, PartnerDataRepository, PartnerRef,
    PartnerType,
};
use std::sync::Arc;

use crate::error::MatchError;
use crate::extractor::KeywordExtractor;

/// Write side of the keyword store: validates keywords before they reach the
/// repository and forwards the plain lookups.
pub struct PartnerDataService<R: PartnerDataRepository + ?Sized> {
    repository: Arc<R>,
    extractor: KeywordExtractor,
}

impl<R: PartnerDataRepository + ?Sized> PartnerDataService<R> {
    pub fn new(repository: Arc<R>, config: &MatchConfig) -> Self {
        Self::with_extractor(repository, KeywordExtractor::from_config(config))
    }

    pub fn with_extractor(repository: Arc<R>, extractor: KeywordExtractor) -> Self {
        Self {
            repository,
            extractor,
        }
    }

    pub fn extractor(&self) -> &KeywordExtractor {
        &self.extractor
    }

    /// Associates `keyword` with `partner`, adding `occurrence_count` to an
    /// existing association. The keyword is cleaned like an extracted token
    /// first, so `AT&T` is stored as `att`.
    pub async fn save_keyword(
        &self,
        partner: PartnerRef,
        keyword: &str,
        occurrence_count: i64,
    ) -> Result<(), MatchError> {
        let cleaned = self.extractor.clean(keyword);
        let keyword = Keyword::parse(&cleaned, self.extractor.rules()).map_err(|reason| {
            MatchError::InvalidKeyword {
                keyword: keyword.to_string(),
                reason,
            }
        })?;
        self.repository
            .save(&PartnerData::new(
                partner,
                keyword.into_string(),
                occurrence_count,
            ))
            .await?;
        Ok(())
    }

    /// Learns every keyword found in `text`. Individual failures are logged
    /// and skipped; returns how many keywords were stored.
    pub async fn save_keywords_from_text(&self, partner: PartnerRef, text: &str) -> usize {
        let mut saved = 0;
        for keyword in self.extractor.extract(text) {
            let data = PartnerData::new(partner, keyword.as_str(), 1);
            match self.repository.save(&data).await {
                Ok(()) => saved += 1,
                Err(e) => {
                    tracing::warn!(%partner, keyword = %keyword, "failed to save keyword: {e}");
                }
            }
        }
        saved
    }

    pub async fn find(
        &self,
        partner: PartnerRef,
        keyword: &str,
    ) -> Result<Option<PartnerData>, MatchError> {
        Ok(self.repository.find(partner, keyword).await?)
    }

    pub async fn find_by_partner(
        &self,
        partner: PartnerRef,
    ) -> Result<Vec<PartnerData>, MatchError> {
        Ok(self.repository.find_by_partner(partner).await?)
    }

    pub async fn find_by_keyword(
        &self,
        keyword: &str,
        partner_type: Option<PartnerType>,
    ) -> Result<Vec<PartnerData>, MatchError> {
        Ok(self.repository.find_by_keyword(keyword, partner_type).await?)
    }

    pub async fn delete(&self, partner: PartnerRef, keyword: &str) -> Result<bool, MatchError> {
        Ok(self.repository.delete(partner, keyword).await?)
    }

    pub async fn delete_by_partner(&self, partner: PartnerRef) -> Result<u64, MatchError> {
        Ok(self.repository.delete_by_partner(partner).await?)
    }

    pub async fn increment_occurrence(
        &self,
        partner: PartnerRef,
        keyword: &str,
        by: i64,
    ) -> Result<bool, MatchError> {
        Ok(self
            .repository
            .increment_occurrence(partner, keyword, by)
            .await?)
    }

    pub async fn count(&self, partner_type: Option<PartnerType>) -> Result<i64, MatchError> {
        Ok(self.repository.count(partner_type).await?)
    }

    pub async fn exists(&self, partner: PartnerRef, keyword: &str) -> Result<bool, MatchError> {
        Ok(self.repository.exists(partner, keyword).await?)
    }

    pub async fn top_keywords(
        &self,
        partner_type: Option<PartnerType>,
        limit: usize,
    ) -> Result<Vec<KeywordFrequency>, MatchError> {
        Ok(self.repository.top_keywords(partner_type, limit).await?)
    }
}
