//! Analytics facade over the event log store
//!
//! Gives dashboard consumers the no-argument aggregate calls they need:
//! every method re-reads the relevant log from storage and recomputes, so
//! a consumer that re-pulls after each change notification always renders
//! what the store holds.

pub mod format;

pub use format::{format_size, format_time_ago};

use crate::aggregate::{self, ConfidenceStats, FeedbackStats, QueryCount};
use crate::notify::{Handler, Subscription};
use crate::scorer::QualityBreakdown;
use crate::store::EventLogStore;
use crate::types::{Channel, DocumentEntry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Documents listed on the dashboard's recent-uploads panel
pub const RECENT_DOCUMENTS: usize = 5;

/// Everything the analytics view renders, computed in one pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    pub generated_at: DateTime<Utc>,
    pub feedback: FeedbackStats,
    pub documents: Vec<DocumentEntry>,
    pub top_queries: Vec<QueryCount>,
    pub total_queries: usize,
    pub confidence: ConfidenceStats,
    pub quality: QualityBreakdown,
    pub quality_index: u32,
}

/// Read side of the dashboard
#[derive(Debug, Clone)]
pub struct Analytics {
    store: Arc<EventLogStore>,
}

impl Analytics {
    pub fn new(store: Arc<EventLogStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<EventLogStore> {
        &self.store
    }

    pub fn feedback_stats(&self) -> FeedbackStats {
        aggregate::feedback_stats(&self.store.feedback())
    }

    /// All documents, most recent first
    pub fn document_list(&self) -> Vec<DocumentEntry> {
        aggregate::document_list(&self.store.documents())
    }

    /// The `limit` most recent documents
    pub fn recent_documents(&self, limit: usize) -> Vec<DocumentEntry> {
        let mut docs = self.document_list();
        docs.truncate(limit);
        docs
    }

    pub fn query_ranking(&self) -> Vec<QueryCount> {
        aggregate::query_ranking(&self.store.queries())
    }

    /// Every submitted query counts, repeats included
    pub fn total_queries(&self) -> usize {
        self.store.queries().len()
    }

    pub fn confidence_stats(&self) -> ConfidenceStats {
        aggregate::confidence_stats(&self.store.confidence_scores())
    }

    pub fn quality_breakdown(&self) -> QualityBreakdown {
        QualityBreakdown::new(
            self.store.documents().len(),
            self.total_queries(),
            &self.confidence_stats(),
            &self.feedback_stats(),
        )
    }

    pub fn quality_index(&self) -> u32 {
        self.quality_breakdown().index()
    }

    /// Compute every aggregate, reading each log once
    pub fn snapshot(&self) -> AnalyticsSnapshot {
        let feedback = aggregate::feedback_stats(&self.store.feedback());
        let documents = aggregate::document_list(&self.store.documents());
        let queries = self.store.queries();
        let confidence = aggregate::confidence_stats(&self.store.confidence_scores());
        let quality = QualityBreakdown::new(documents.len(), queries.len(), &confidence, &feedback);

        AnalyticsSnapshot {
            generated_at: Utc::now(),
            feedback,
            top_queries: aggregate::query_ranking(&queries),
            total_queries: queries.len(),
            documents,
            confidence,
            quality_index: quality.index(),
            quality,
        }
    }

    /// Subscribe to a change channel on the store's notifier
    pub fn subscribe(&self, channel: Channel, handler: Handler) -> Subscription {
        self.store.notifier().subscribe(channel, handler)
    }

    /// Subscribe one handler to both channels
    pub fn on_any_change(&self, handler: Handler) -> Vec<Subscription> {
        Channel::ALL
            .iter()
            .map(|&channel| self.subscribe(channel, Arc::clone(&handler)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::notify::ChangeNotifier;
    use crate::storage::{MemoryStorage, StorageBackend};
    use crate::types::FeedbackKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend that counts reads
    #[derive(Default)]
    struct CountingStorage {
        inner: MemoryStorage,
        reads: AtomicUsize,
    }

    impl StorageBackend for CountingStorage {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            self.inner.set(key, value)
        }
    }

    fn analytics() -> Analytics {
        Analytics::new(Arc::new(EventLogStore::in_memory()))
    }

    #[test]
    fn test_empty_snapshot_is_zeroed() {
        let snapshot = analytics().snapshot();
        assert_eq!(snapshot.feedback, FeedbackStats::default());
        assert_eq!(snapshot.confidence, ConfidenceStats::default());
        assert!(snapshot.documents.is_empty());
        assert!(snapshot.top_queries.is_empty());
        assert_eq!(snapshot.total_queries, 0);
        assert_eq!(snapshot.quality_index, 0);
    }

    #[test]
    fn test_snapshot_matches_individual_calls() {
        let analytics = analytics();
        let store = analytics.store();
        store.add_document("contract.pdf", 1024);
        store.add_query("termination clause?");
        store.add_query("termination clause?");
        store.add_confidence_score(94.0);
        store.add_confidence_score(78.0);
        store.add_feedback(FeedbackKind::Positive);

        let snapshot = analytics.snapshot();
        assert_eq!(snapshot.feedback, analytics.feedback_stats());
        assert_eq!(snapshot.documents, analytics.document_list());
        assert_eq!(snapshot.top_queries, analytics.query_ranking());
        assert_eq!(snapshot.total_queries, 2);
        assert_eq!(snapshot.confidence, analytics.confidence_stats());
        assert_eq!(snapshot.quality_index, analytics.quality_index());
        // 0.40*86 + 0.25*100 + 0.20*10 + 0.15*10 = 34.4 + 25 + 2 + 1.5 = 62.9
        assert_eq!(snapshot.quality_index, 63);
    }

    #[test]
    fn test_recent_documents_limit() {
        let analytics = analytics();
        for i in 0..7 {
            analytics.store().add_document(format!("doc-{}.pdf", i), 10);
        }
        let recent = analytics.recent_documents(RECENT_DOCUMENTS);
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].name, "doc-6.pdf");
        assert_eq!(analytics.document_list().len(), 7);
    }

    #[test]
    fn test_on_any_change_fires_for_both_channels() {
        let analytics = analytics();
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let subs = analytics.on_any_change(Arc::new(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        }));

        analytics.store().add_feedback(FeedbackKind::Negative);
        analytics.store().add_query("hello");
        assert_eq!(count.load(Ordering::SeqCst), 2);

        for sub in subs {
            sub.unsubscribe();
        }
        analytics.store().add_query("again");
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_legacy_out_of_range_score_keeps_index_in_range() {
        let backend = Arc::new(MemoryStorage::new());
        backend
            .set("prism_confidence", r#"[{"id":"1","score":900,"timestamp":0}]"#)
            .unwrap();
        let analytics = Analytics::new(Arc::new(EventLogStore::new(
            backend,
            ChangeNotifier::default(),
        )));

        assert_eq!(analytics.confidence_stats().average, 900);
        assert_eq!(analytics.quality_breakdown().conf_score, 100);
        assert_eq!(analytics.quality_index(), 40);
    }

    #[test]
    fn test_quality_index_reads_each_log_once() {
        let backend = Arc::new(CountingStorage::default());
        let store = Arc::new(EventLogStore::new(backend.clone(), ChangeNotifier::default()));
        store.add_document("a.pdf", 1);
        store.add_query("q");
        store.add_confidence_score(80.0);
        store.add_feedback(FeedbackKind::Positive);

        let analytics = Analytics::new(store);
        backend.reads.store(0, Ordering::SeqCst);
        analytics.quality_index();
        assert_eq!(backend.reads.load(Ordering::SeqCst), 4);

        backend.reads.store(0, Ordering::SeqCst);
        analytics.snapshot();
        assert_eq!(backend.reads.load(Ordering::SeqCst), 4);
    }
}
