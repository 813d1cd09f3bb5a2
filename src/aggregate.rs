//! Aggregations over the event logs
//!
//! Pure functions: each takes a whole log and returns a fresh snapshot.
//! Nothing is cached, so calling one twice on an unchanged log yields the
//! same result.
//!
//! Percentages use round-half-up on the exact ratio and are computed
//! independently, so `positive_percent + negative_percent` may be 99 or
//! 101. Empty logs produce zeroed snapshots through an explicit guard.

use crate::types::{ConfidenceEntry, DocumentEntry, FeedbackEntry, FeedbackKind, QueryEntry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Number of entries returned by [`query_ranking`]
pub const TOP_QUERIES: usize = 5;

/// Lower bounds of the confidence buckets
pub const HIGH_THRESHOLD: i64 = 90;
pub const MEDIUM_THRESHOLD: i64 = 70;
pub const LOW_THRESHOLD: i64 = 50;

/// `round(100 * count / total)`, or 0 for an empty total
pub fn percent(count: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((200 * count + total) / (2 * total)) as u32
}

/// Round-half-up mean of integer values, 0 for an empty slice
fn rounded_mean(sum: i64, total: usize) -> i64 {
    if total == 0 {
        return 0;
    }
    let total = total as i64;
    (2 * sum + total).div_euclid(2 * total)
}

/// Feedback vote summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackStats {
    pub positive: usize,
    pub negative: usize,
    pub total: usize,
    pub positive_percent: u32,
    pub negative_percent: u32,
}

pub fn feedback_stats(log: &[FeedbackEntry]) -> FeedbackStats {
    let positive = log
        .iter()
        .filter(|e| e.kind == FeedbackKind::Positive)
        .count();
    let negative = log
        .iter()
        .filter(|e| e.kind == FeedbackKind::Negative)
        .count();
    let total = positive + negative;

    FeedbackStats {
        positive,
        negative,
        total,
        positive_percent: percent(positive, total),
        negative_percent: percent(negative, total),
    }
}

/// All documents, most recent first.
///
/// Recency is reverse insertion order; timestamps are never re-sorted.
pub fn document_list(log: &[DocumentEntry]) -> Vec<DocumentEntry> {
    log.iter().rev().cloned().collect()
}

/// One row of the query ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryCount {
    pub query: String,
    pub count: usize,
}

/// Top queries by exact trimmed text, most frequent first.
///
/// Ties keep first-seen order.
pub fn query_ranking(log: &[QueryEntry]) -> Vec<QueryCount> {
    let mut order: Vec<QueryCount> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for entry in log {
        let key = entry.text.trim();
        match index.get(key) {
            Some(&i) => order[i].count += 1,
            None => {
                index.insert(key, order.len());
                order.push(QueryCount {
                    query: key.to_string(),
                    count: 1,
                });
            }
        }
    }

    // sort_by is stable
    order.sort_by(|a, b| b.count.cmp(&a.count));
    order.truncate(TOP_QUERIES);
    order
}

/// Confidence bucket of a single score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBucket {
    High,
    Medium,
    Low,
    Uncertain,
}

impl ConfidenceBucket {
    /// Classify by raw comparison; out-of-range values land in `High` or
    /// `Uncertain`
    pub fn of(score: i64) -> Self {
        if score >= HIGH_THRESHOLD {
            ConfidenceBucket::High
        } else if score >= MEDIUM_THRESHOLD {
            ConfidenceBucket::Medium
        } else if score >= LOW_THRESHOLD {
            ConfidenceBucket::Low
        } else {
            ConfidenceBucket::Uncertain
        }
    }
}

impl std::fmt::Display for ConfidenceBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfidenceBucket::High => write!(f, "high"),
            ConfidenceBucket::Medium => write!(f, "medium"),
            ConfidenceBucket::Low => write!(f, "low"),
            ConfidenceBucket::Uncertain => write!(f, "uncertain"),
        }
    }
}

/// Confidence score summary. Bucket fields are percentages of `total`,
/// not raw counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceStats {
    pub average: i64,
    pub high: u32,
    pub medium: u32,
    pub low: u32,
    pub uncertain: u32,
    pub total: usize,
}

pub fn confidence_stats(log: &[ConfidenceEntry]) -> ConfidenceStats {
    let total = log.len();
    if total == 0 {
        return ConfidenceStats::default();
    }

    let mut counts = [0usize; 4];
    let mut sum: i64 = 0;
    for entry in log {
        sum = sum.saturating_add(entry.score);
        let slot = match ConfidenceBucket::of(entry.score) {
            ConfidenceBucket::High => 0,
            ConfidenceBucket::Medium => 1,
            ConfidenceBucket::Low => 2,
            ConfidenceBucket::Uncertain => 3,
        };
        counts[slot] += 1;
    }

    ConfidenceStats {
        average: rounded_mean(sum, total),
        high: percent(counts[0], total),
        medium: percent(counts[1], total),
        low: percent(counts[2], total),
        uncertain: percent(counts[3], total),
        total,
    }
}
