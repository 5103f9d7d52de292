use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque classification of a counterparty (customer, supplier, bank
/// transfer, ...). The numbering belongs to the host ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartnerType(pub i32);

impl fmt::Display for PartnerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of one partner: the entity, its kind and the sub-entity (branch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartnerRef {
    pub partner_id: i64,
    pub partner_type: PartnerType,
    pub partner_detail_id: i64,
}

impl PartnerRef {
    pub fn new(partner_id: i64, partner_type: PartnerType, partner_detail_id: i64) -> Self {
        Self {
            partner_id,
            partner_type,
            partner_detail_id,
        }
    }
}

impl fmt::Display for PartnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}/{}",
            self.partner_type, self.partner_id, self.partner_detail_id
        )
    }
}

/// One keyword-to-partner association and how often it has been confirmed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerData {
    pub partner: PartnerRef,
    pub data: String,
    pub occurrence_count: i64,
    pub updated_at: Option<NaiveDateTime>,
}

impl PartnerData {
    pub fn new(partner: PartnerRef, data: impl Into<String>, occurrence_count: i64) -> Self {
        Self {
            partner,
            data: data.into(),
            occurrence_count: occurrence_count.max(1),
            updated_at: None,
        }
    }
}

/// Aggregate row produced by a multi-keyword repository search: every stored
/// association of one partner that matched at least one searched keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordAggregate {
    pub partner: PartnerRef,
    pub partner_name: String,
    pub matched_keywords: Vec<String>,
    pub keyword_count: usize,
    pub total_score: i64,
}

/// How often a keyword appears across all stored associations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordFrequency {
    pub keyword: String,
    pub total_occurrences: i64,
    pub partner_count: i64,
}
