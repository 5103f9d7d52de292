use serde::{Deserialize, Serialize};

use crate::partner::PartnerRef;

/// A scored candidate partner for one search call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordMatch {
    pub partner: PartnerRef,
    pub partner_name: String,
    pub matched_keywords: Vec<String>,
    pub matched_keyword_count: usize,
    /// Sum of occurrence counts over the matching associations.
    pub raw_score: f64,
    /// `raw_score` after the clustering bonus; never below `raw_score`.
    pub final_score: f64,
}

impl KeywordMatch {
    pub fn new(
        partner: PartnerRef,
        partner_name: impl Into<String>,
        matched_keywords: Vec<String>,
        raw_score: f64,
        final_score: f64,
    ) -> Self {
        Self {
            partner,
            partner_name: partner_name.into(),
            matched_keyword_count: matched_keywords.len(),
            matched_keywords,
            raw_score,
            final_score: final_score.max(raw_score),
        }
    }
}
