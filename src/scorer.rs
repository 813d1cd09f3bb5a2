//! Composite quality index
//!
//! Blends four sub-scores, each normalized to `[0, 100]`:
//!
//! | Sub-score | Source | Weight |
//! |---|---|---|
//! | confidence | `ConfidenceStats::average` | 40% |
//! | satisfaction | `FeedbackStats::positive_percent` | 25% |
//! | documents | `min(documents * 10, 100)` | 20% |
//! | queries | `min(queries * 5, 100)` | 15% |
//!
//! With no documents, no queries, and no confidence scores the index is 0
//! whatever the feedback says.

use crate::aggregate::{ConfidenceStats, FeedbackStats};
use serde::{Deserialize, Serialize};

/// Weights in percent; they sum to 100
pub const CONFIDENCE_WEIGHT: i64 = 40;
pub const SATISFACTION_WEIGHT: i64 = 25;
pub const DOCUMENT_WEIGHT: i64 = 20;
pub const QUERY_WEIGHT: i64 = 15;

/// Points per document; saturates at 10 documents
pub const POINTS_PER_DOCUMENT: usize = 10;
/// Points per query; saturates at 20 queries
pub const POINTS_PER_QUERY: usize = 5;

const SUB_SCORE_MAX: usize = 100;

/// The sub-scores behind a quality index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityBreakdown {
    pub doc_score: u32,
    /// Average confidence, clamped to `[0, 100]`
    pub conf_score: i64,
    pub query_score: u32,
    pub sat_score: u32,
    /// Any document, query, or confidence score recorded
    pub has_activity: bool,
}

impl QualityBreakdown {
    pub fn new(
        document_count: usize,
        query_count: usize,
        confidence: &ConfidenceStats,
        feedback: &FeedbackStats,
    ) -> Self {
        let doc_score = document_count
            .saturating_mul(POINTS_PER_DOCUMENT)
            .min(SUB_SCORE_MAX) as u32;
        let query_score = query_count
            .saturating_mul(POINTS_PER_QUERY)
            .min(SUB_SCORE_MAX) as u32;

        Self {
            doc_score,
            conf_score: confidence.average.clamp(0, SUB_SCORE_MAX as i64),
            query_score,
            sat_score: feedback.positive_percent,
            has_activity: document_count > 0 || query_count > 0 || confidence.total > 0,
        }
    }

    /// Weighted composite, rounded half-up
    pub fn index(&self) -> u32 {
        if !self.has_activity {
            return 0;
        }

        let weighted = CONFIDENCE_WEIGHT * self.conf_score
            + SATISFACTION_WEIGHT * i64::from(self.sat_score)
            + DOCUMENT_WEIGHT * i64::from(self.doc_score)
            + QUERY_WEIGHT * i64::from(self.query_score);

        (weighted + 50).div_euclid(100).max(0) as u32
    }
}

/// Quality index from the four aggregate inputs
pub fn quality_index(
    document_count: usize,
    query_count: usize,
    confidence: &ConfidenceStats,
    feedback: &FeedbackStats,
) -> u32 {
    QualityBreakdown::new(document_count, query_count, confidence, feedback).index()
}
