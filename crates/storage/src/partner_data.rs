use async_trait::async_trait;
use chrono::NaiveDateTime;
use counterparty_core::{
    KeywordAggregate, KeywordFrequency, PartnerData, PartnerDataRepository, PartnerRef,
    PartnerType, RepositoryError,
};

use crate::db::DbPool;

type PartnerDataRow = (i64, i32, i64, String, i64, NaiveDateTime);
type AggregateRow = (i64, i32, i64, String, String, i64, i64);

const PARTNER_DATA_COLUMNS: &str =
    "partner_id, partner_type, partner_detail_id, data, occurrence_count, updated_at";

/// SQLite-backed keyword store. Build one per process and share it.
#[derive(Clone)]
pub struct SqlitePartnerDataRepository {
    pool: DbPool,
}

impl SqlitePartnerDataRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Records the display name returned with search results for `partner`.
    pub async fn register_partner_name(
        &self,
        partner: PartnerRef,
        name: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO partner_names (partner_id, partner_type, partner_detail_id, name)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (partner_id, partner_type, partner_detail_id)
            DO UPDATE SET name = excluded.name
            "#,
        )
        .bind(partner.partner_id)
        .bind(partner.partner_type.0)
        .bind(partner.partner_detail_id)
        .bind(name)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(())
    }

    pub async fn forget_partner_name(&self, partner: PartnerRef) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM partner_names WHERE partner_id = ? AND partner_type = ? AND partner_detail_id = ?",
        )
        .bind(partner.partner_id)
        .bind(partner.partner_type.0)
        .bind(partner.partner_detail_id)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl PartnerDataRepository for SqlitePartnerDataRepository {
    async fn find(
        &self,
        partner: PartnerRef,
        keyword: &str,
    ) -> Result<Option<PartnerData>, RepositoryError> {
        let row = sqlx::query_as::<_, PartnerDataRow>(&format!(
            "SELECT {PARTNER_DATA_COLUMNS} FROM partner_data \
             WHERE partner_id = ? AND partner_type = ? AND partner_detail_id = ? AND data = ?"
        ))
        .bind(partner.partner_id)
        .bind(partner.partner_type.0)
        .bind(partner.partner_detail_id)
        .bind(normalize(keyword))
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        Ok(row.map(to_partner_data))
    }

    async fn find_by_partner(
        &self,
        partner: PartnerRef,
    ) -> Result<Vec<PartnerData>, RepositoryError> {
        let rows = sqlx::query_as::<_, PartnerDataRow>(&format!(
            "SELECT {PARTNER_DATA_COLUMNS} FROM partner_data \
             WHERE partner_id = ? AND partner_type = ? AND partner_detail_id = ? \
             ORDER BY occurrence_count DESC, data"
        ))
        .bind(partner.partner_id)
        .bind(partner.partner_type.0)
        .bind(partner.partner_detail_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        Ok(rows.into_iter().map(to_partner_data).collect())
    }

    async fn find_by_keyword(
        &self,
        keyword: &str,
        partner_type: Option<PartnerType>,
    ) -> Result<Vec<PartnerData>, RepositoryError> {
        let rows = match partner_type {
            Some(pt) => {
                sqlx::query_as::<_, PartnerDataRow>(&format!(
                    "SELECT {PARTNER_DATA_COLUMNS} FROM partner_data \
                     WHERE data = ? AND partner_type = ? \
                     ORDER BY occurrence_count DESC, partner_id, partner_detail_id"
                ))
                .bind(normalize(keyword))
                .bind(pt.0)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, PartnerDataRow>(&format!(
                    "SELECT {PARTNER_DATA_COLUMNS} FROM partner_data \
                     WHERE data = ? \
                     ORDER BY occurrence_count DESC, partner_type, partner_id, partner_detail_id"
                ))
                .bind(normalize(keyword))
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(backend)?;

        Ok(rows.into_iter().map(to_partner_data).collect())
    }

    async fn search_by_keywords(
        &self,
        keywords: &[String],
        partner_type: Option<PartnerType>,
        limit: usize,
    ) -> Result<Vec<KeywordAggregate>, RepositoryError> {
        let mut terms: Vec<String> = Vec::with_capacity(keywords.len());
        for kw in keywords.iter().map(|k| normalize(k)) {
            if !kw.is_empty() && !terms.contains(&kw) {
                terms.push(kw);
            }
        }
        if terms.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let values = vec!["(?)"; terms.len()].join(", ");
        let type_filter = if partner_type.is_some() {
            "WHERE pd.partner_type = ?"
        } else {
            ""
        };
        let sql = format!(
            r#"
            WITH kw(keyword) AS (VALUES {values}),
            hits AS (
                SELECT pd.id, pd.partner_id, pd.partner_type, pd.partner_detail_id,
                       pd.occurrence_count, kw.keyword
                FROM partner_data pd
                JOIN kw ON instr(lower(pd.data), kw.keyword) > 0
                {type_filter}
            ),
            scores AS (
                SELECT partner_id, partner_type, partner_detail_id,
                       SUM(occurrence_count) AS total_score
                FROM (SELECT DISTINCT id, partner_id, partner_type, partner_detail_id,
                             occurrence_count FROM hits)
                GROUP BY partner_id, partner_type, partner_detail_id
            ),
            matched AS (
                SELECT partner_id, partner_type, partner_detail_id,
                       json_group_array(keyword) AS matched_keywords,
                       COUNT(*) AS keyword_count
                FROM (SELECT DISTINCT partner_id, partner_type, partner_detail_id, keyword
                      FROM hits)
                GROUP BY partner_id, partner_type, partner_detail_id
            )
            SELECT s.partner_id, s.partner_type, s.partner_detail_id,
                   COALESCE(pn.name, '') AS partner_name,
                   m.matched_keywords, m.keyword_count, s.total_score
            FROM scores s
            JOIN matched m
              ON m.partner_id = s.partner_id
             AND m.partner_type = s.partner_type
             AND m.partner_detail_id = s.partner_detail_id
            LEFT JOIN partner_names pn
              ON pn.partner_id = s.partner_id
             AND pn.partner_type = s.partner_type
             AND pn.partner_detail_id = s.partner_detail_id
            ORDER BY m.keyword_count DESC, s.total_score DESC,
                     s.partner_id, s.partner_type, s.partner_detail_id
            LIMIT ?
            "#
        );

        let mut query = sqlx::query_as::<_, AggregateRow>(&sql);
        for term in &terms {
            query = query.bind(term.as_str());
        }
        if let Some(pt) = partner_type {
            query = query.bind(pt.0);
        }
        let rows = query
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;

        rows.into_iter()
            .map(|r| -> Result<KeywordAggregate, RepositoryError> {
                let mut matched_keywords: Vec<String> = serde_json::from_str(&r.4)
                    .map_err(|e| RepositoryError::InvalidData(e.to_string()))?;
                matched_keywords.sort();
                let keyword_count = usize::try_from(r.5)
                    .ok()
                    .filter(|&n| n == matched_keywords.len())
                    .ok_or_else(|| {
                        RepositoryError::InvalidData(format!(
                            "keyword_count {} disagrees with {} matched keywords",
                            r.5,
                            matched_keywords.len()
                        ))
                    })?;
                Ok(KeywordAggregate {
                    partner: PartnerRef::new(r.0, PartnerType(r.1), r.2),
                    partner_name: r.3,
                    keyword_count,
                    matched_keywords,
                    total_score: r.6,
                })
            })
            .collect()
    }

    async fn save(&self, data: &PartnerData) -> Result<(), RepositoryError> {
        let keyword = normalize(&data.data);
        if keyword.is_empty() {
            return Err(RepositoryError::InvalidData(
                "cannot store an empty keyword".to_string(),
            ));
        }

        sqlx::query(
            r#"
            INSERT INTO partner_data
                (partner_id, partner_type, partner_detail_id, data, occurrence_count)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (partner_id, partner_type, partner_detail_id, data)
            DO UPDATE SET occurrence_count = occurrence_count + excluded.occurrence_count,
                          updated_at = datetime('now')
            "#,
        )
        .bind(data.partner.partner_id)
        .bind(data.partner.partner_type.0)
        .bind(data.partner.partner_detail_id)
        .bind(keyword)
        .bind(data.occurrence_count.max(1))
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(())
    }

    async fn delete(&self, partner: PartnerRef, keyword: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM partner_data \
             WHERE partner_id = ? AND partner_type = ? AND partner_detail_id = ? AND data = ?",
        )
        .bind(partner.partner_id)
        .bind(partner.partner_type.0)
        .bind(partner.partner_detail_id)
        .bind(normalize(keyword))
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_partner(&self, partner: PartnerRef) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM partner_data \
             WHERE partner_id = ? AND partner_type = ? AND partner_detail_id = ?",
        )
        .bind(partner.partner_id)
        .bind(partner.partner_type.0)
        .bind(partner.partner_detail_id)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(result.rows_affected())
    }

    async fn increment_occurrence(
        &self,
        partner: PartnerRef,
        keyword: &str,
        by: i64,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE partner_data \
             SET occurrence_count = occurrence_count + ?, updated_at = datetime('now') \
             WHERE partner_id = ? AND partner_type = ? AND partner_detail_id = ? AND data = ?",
        )
        .bind(by.max(1))
        .bind(partner.partner_id)
        .bind(partner.partner_type.0)
        .bind(partner.partner_detail_id)
        .bind(normalize(keyword))
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self, partner_type: Option<PartnerType>) -> Result<i64, RepositoryError> {
        let (count,) = match partner_type {
            Some(pt) => {
                sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM partner_data WHERE partner_type = ?")
                    .bind(pt.0)
                    .fetch_one(&self.pool)
                    .await
            }
            None => {
                sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM partner_data")
                    .fetch_one(&self.pool)
                    .await
            }
        }
        .map_err(backend)?;

        Ok(count)
    }

    async fn exists(&self, partner: PartnerRef, keyword: &str) -> Result<bool, RepositoryError> {
        let (found,) = sqlx::query_as::<_, (i64,)>(
            "SELECT EXISTS (SELECT 1 FROM partner_data \
             WHERE partner_id = ? AND partner_type = ? AND partner_detail_id = ? AND data = ?)",
        )
        .bind(partner.partner_id)
        .bind(partner.partner_type.0)
        .bind(partner.partner_detail_id)
        .bind(normalize(keyword))
        .fetch_one(&self.pool)
        .await
        .map_err(backend)?;

        Ok(found != 0)
    }

    async fn top_keywords(
        &self,
        partner_type: Option<PartnerType>,
        limit: usize,
    ) -> Result<Vec<KeywordFrequency>, RepositoryError> {
        let type_filter = if partner_type.is_some() {
            "WHERE partner_type = ?"
        } else {
            ""
        };
        let sql = format!(
            "SELECT data, SUM(occurrence_count) AS total, COUNT(*) AS partners \
             FROM partner_data {type_filter} \
             GROUP BY data ORDER BY total DESC, data LIMIT ?"
        );

        let mut query = sqlx::query_as::<_, (String, i64, i64)>(&sql);
        if let Some(pt) = partner_type {
            query = query.bind(pt.0);
        }
        let rows = query
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;

        Ok(rows
            .into_iter()
            .map(|(keyword, total_occurrences, partner_count)| KeywordFrequency {
                keyword,
                total_occurrences,
                partner_count,
            })
            .collect())
    }
}

fn to_partner_data(r: PartnerDataRow) -> PartnerData {
    PartnerData {
        partner: PartnerRef::new(r.0, PartnerType(r.1), r.2),
        data: r.3,
        occurrence_count: r.4,
        updated_at: Some(r.5),
    }
}

fn normalize(keyword: &str) -> String {
    keyword.trim().to_lowercase()
}

fn backend(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Backend(e.to_string())
}
