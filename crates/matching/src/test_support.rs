use async_trait::async_trait;
use counterparty_core::{
    KeywordAggregate, KeywordFrequency, PartnerData, PartnerDataRepository, PartnerRef,
    PartnerType, RepositoryError,
};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// In-memory repository for service tests. Search results can be canned so
/// scoring can be exercised without building matching rows by hand.
#[derive(Default)]
pub(crate) struct MemoryRepository {
    rows: Mutex<BTreeMap<(PartnerRef, String), i64>>,
    canned: Option<Vec<KeywordAggregate>>,
    failing_keywords: Mutex<HashSet<String>>,
    fail_searches: AtomicBool,
    pub search_calls: AtomicUsize,
    pub last_limit: AtomicUsize,
}

pub(crate) fn aggregate(partner_id: i64, keywords: &[&str], total_score: i64) -> KeywordAggregate {
    KeywordAggregate {
        partner: PartnerRef::new(partner_id, PartnerType(2), 0),
        partner_name: format!("Partner {partner_id}"),
        matched_keywords: keywords.iter().map(|k| k.to_string()).collect(),
        keyword_count: keywords.len(),
        total_score,
    }
}

impl MemoryRepository {
    pub fn with_search_rows(rows: Vec<KeywordAggregate>) -> Self {
        Self {
            canned: Some(rows),
            ..Self::default()
        }
    }

    pub fn insert(&self, data: PartnerData) {
        let mut rows = self.rows.lock().unwrap();
        *rows.entry((data.partner, data.data.to_lowercase())).or_insert(0) +=
            data.occurrence_count;
    }

    pub fn fail_on(&self, keyword: &str) {
        self.failing_keywords
            .lock()
            .unwrap()
            .insert(keyword.to_string());
    }

    pub fn fail_searches(&self) {
        self.fail_searches.store(true, Ordering::SeqCst);
    }

    fn snapshot(&self) -> Vec<PartnerData> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .map(|((partner, data), count)| PartnerData::new(*partner, data.clone(), *count))
            .collect()
    }
}

#[async_trait]
impl PartnerDataRepository for MemoryRepository {
    async fn find(
        &self,
        partner: PartnerRef,
        keyword: &str,
    ) -> Result<Option<PartnerData>, RepositoryError> {
        let key = (partner, keyword.to_lowercase());
        Ok(self
            .rows
            .lock()
            .unwrap()
            .get(&key)
            .map(|count| PartnerData::new(partner, key.1.clone(), *count)))
    }

    async fn find_by_partner(
        &self,
        partner: PartnerRef,
    ) -> Result<Vec<PartnerData>, RepositoryError> {
        let mut rows: Vec<PartnerData> = self
            .snapshot()
            .into_iter()
            .filter(|d| d.partner == partner)
            .collect();
        rows.sort_by(|a, b| b.occurrence_count.cmp(&a.occurrence_count));
        Ok(rows)
    }

    async fn find_by_keyword(
        &self,
        keyword: &str,
        partner_type: Option<PartnerType>,
    ) -> Result<Vec<PartnerData>, RepositoryError> {
        let keyword = keyword.to_lowercase();
        Ok(self
            .snapshot()
            .into_iter()
            .filter(|d| d.data == keyword)
            .filter(|d| partner_type.map_or(true, |pt| d.partner.partner_type == pt))
            .collect())
    }

    async fn search_by_keywords(
        &self,
        keywords: &[String],
        partner_type: Option<PartnerType>,
        limit: usize,
    ) -> Result<Vec<KeywordAggregate>, RepositoryError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.last_limit.store(limit, Ordering::SeqCst);
        if self.fail_searches.load(Ordering::SeqCst) {
            return Err(RepositoryError::Backend("database is locked".into()));
        }
        if let Some(canned) = &self.canned {
            return Ok(canned.iter().take(limit).cloned().collect());
        }

        let mut groups: BTreeMap<PartnerRef, (BTreeSet<String>, i64)> = BTreeMap::new();
        for data in self.snapshot() {
            if partner_type.is_some_and(|pt| data.partner.partner_type != pt) {
                continue;
            }
            let hits: Vec<&String> = keywords
                .iter()
                .filter(|k| data.data.contains(k.as_str()))
                .collect();
            if hits.is_empty() {
                continue;
            }
            let entry = groups.entry(data.partner).or_default();
            entry.0.extend(hits.into_iter().cloned());
            entry.1 += data.occurrence_count;
        }

        let mut rows: Vec<KeywordAggregate> = groups
            .into_iter()
            .map(|(partner, (matched, total_score))| KeywordAggregate {
                partner,
                partner_name: String::new(),
                keyword_count: matched.len(),
                matched_keywords: matched.into_iter().collect(),
                total_score,
            })
            .collect();
        rows.sort_by(|a, b| {
            b.keyword_count
                .cmp(&a.keyword_count)
                .then(b.total_score.cmp(&a.total_score))
        });
        rows.truncate(limit);
        Ok(rows)
    }

    async fn save(&self, data: &PartnerData) -> Result<(), RepositoryError> {
        if self.failing_keywords.lock().unwrap().contains(&data.data) {
            return Err(RepositoryError::Backend(format!("cannot store '{}'", data.data)));
        }
        self.insert(data.clone());
        Ok(())
    }

    async fn delete(&self, partner: PartnerRef, keyword: &str) -> Result<bool, RepositoryError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .remove(&(partner, keyword.to_lowercase()))
            .is_some())
    }

    async fn delete_by_partner(&self, partner: PartnerRef) -> Result<u64, RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|(p, _), _| *p != partner);
        Ok((before - rows.len()) as u64)
    }

    async fn increment_occurrence(
        &self,
        partner: PartnerRef,
        keyword: &str,
        by: i64,
    ) -> Result<bool, RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&(partner, keyword.to_lowercase())) {
            Some(count) => {
                *count += by.max(1);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count(&self, partner_type: Option<PartnerType>) -> Result<i64, RepositoryError> {
        Ok(self
            .snapshot()
            .iter()
            .filter(|d| partner_type.map_or(true, |pt| d.partner.partner_type == pt))
            .count() as i64)
    }

    async fn exists(&self, partner: PartnerRef, keyword: &str) -> Result<bool, RepositoryError> {
        Ok(self.find(partner, keyword).await?.is_some())
    }

    async fn top_keywords(
        &self,
        partner_type: Option<PartnerType>,
        limit: usize,
    ) -> Result<Vec<KeywordFrequency>, RepositoryError> {
        let mut totals: BTreeMap<String, (i64, i64)> = BTreeMap::new();
        for data in self.snapshot() {
            if partner_type.is_some_and(|pt| data.partner.partner_type != pt) {
                continue;
            }
            let entry = totals.entry(data.data).or_default();
            entry.0 += data.occurrence_count;
            entry.1 += 1;
        }
        let mut rows: Vec<KeywordFrequency> = totals
            .into_iter()
            .map(|(keyword, (total_occurrences, partner_count))| KeywordFrequency {
                keyword,
                total_occurrences,
                partner_count,
            })
            .collect();
        rows.sort_by(|a, b| b.total_occurrences.cmp(&a.total_occurrences));
        rows.truncate(limit);
        Ok(rows)
    }
}
