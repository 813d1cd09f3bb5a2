//! Prism - Document Q&A Dashboard Analytics
//!
//! The analytics engine behind a document question-answering dashboard:
//! - Durable append-only event logs (feedback, documents, queries, confidence)
//! - Aggregates recomputed from the logs on every read
//! - Change notification so views re-pull after each write
//! - A composite quality index
//! - Clients for the workflow engine and storage provider proxies
//!
//! # Architecture
//!
//! - **Types**: log records and identifiers
//! - **Storage**: key/value backends (in-memory, on-disk JSON)
//! - **Store**: the four event logs over a backend, plus the change notifier
//! - **Aggregate / Scorer / Analytics**: the read side
//! - **Services / Chat**: the network-facing writers
//!
//! # Example
//!
//! ```ignore
//! use prism_core::{Analytics, EventLogStore, FeedbackKind};
//! use std::sync::Arc;
//!
//! let store = Arc::new(EventLogStore::in_memory());
//! store.add_query("What is the termination clause?");
//! store.add_confidence_score(94.0);
//! store.add_feedback(FeedbackKind::Positive);
//!
//! let analytics = Analytics::new(store);
//! println!("quality index: {}", analytics.quality_index());
//! ```

pub mod aggregate;
pub mod analytics;
pub mod chat;
pub mod config;
pub mod error;
pub mod notify;
pub mod scorer;
pub mod services;
pub mod storage;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use aggregate::{ConfidenceBucket, ConfidenceStats, FeedbackStats, QueryCount};
pub use analytics::{Analytics, AnalyticsSnapshot};
pub use chat::{ChatReply, ChatSession, ResultCard};
pub use config::PrismConfig;
pub use error::{PrismError, Result};
pub use notify::{ChangeNotifier, Subscription};
pub use scorer::{quality_index, QualityBreakdown};
pub use services::{DriveClient, WorkflowClient};
pub use storage::{FileStorage, MemoryStorage, StorageBackend};
pub use store::{AppendOutcome, EventLogStore};
pub use types::{
    Channel, ConfidenceEntry, DocumentEntry, EntryId, FeedbackEntry, FeedbackKind, LogKind,
    QueryEntry,
};
