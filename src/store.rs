//! Event log store
//!
//! Append-only persistence of the four event logs over a
//! [`StorageBackend`]. The store never raises to its callers:
//! - `read_all` on a missing, unreadable, or corrupted log returns an
//!   empty sequence; single malformed records are skipped
//! - `append` on an absent backend or a corrupted log is a no-op, and a
//!   failed write is reported through [`AppendOutcome`] and logged
//!
//! Every stored record fires the change notifier for its log's channel.
//! Reads always go back to the backend; nothing is cached between calls.

use crate::notify::ChangeNotifier;
use crate::storage::{MemoryStorage, StorageBackend};
use crate::types::{
    ConfidenceEntry, DocumentEntry, EntryId, FeedbackEntry, FeedbackKind, LogKind, LogRecord,
    QueryEntry,
};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Result of an append
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    /// Record persisted and subscribers notified
    Stored(EntryId),
    /// Dropped because it repeats the most recent record (documents only)
    Duplicate,
    /// Dropped because the record failed validation
    Rejected(String),
    /// No storage backend in this context; nothing written
    Unavailable,
    /// The backend refused the write; nothing written
    Failed,
}

impl AppendOutcome {
    pub fn is_stored(&self) -> bool {
        matches!(self, AppendOutcome::Stored(_))
    }

    pub fn id(&self) -> Option<&EntryId> {
        match self {
            AppendOutcome::Stored(id) => Some(id),
            _ => None,
        }
    }
}

/// Append-only store for the feedback, document, query, and confidence logs
pub struct EventLogStore {
    backend: Option<Arc<dyn StorageBackend>>,
    notifier: ChangeNotifier,
    // Serializes read-modify-write appends so none is lost
    write_lock: Mutex<()>,
}

impl EventLogStore {
    /// Create a store over `backend`.
    ///
    /// The backend's availability is checked once here; an unavailable
    /// backend produces the same store as [`unavailable`](Self::unavailable).
    pub fn new(backend: Arc<dyn StorageBackend>, notifier: ChangeNotifier) -> Self {
        let backend = if backend.is_available() {
            Some(backend)
        } else {
            warn!("Storage backend unavailable; event logs will read empty and ignore writes");
            None
        };

        Self {
            backend,
            notifier,
            write_lock: Mutex::new(()),
        }
    }

    /// Create a store with no backend at all
    pub fn unavailable(notifier: ChangeNotifier) -> Self {
        Self {
            backend: None,
            notifier,
            write_lock: Mutex::new(()),
        }
    }

    /// Create a store over a fresh in-memory backend
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()), ChangeNotifier::default())
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    /// Notifier fired by this store; consumers subscribe here
    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    /// Read a whole log in insertion order.
    ///
    /// Records that fail to decode are skipped one by one; the rest of the
    /// log is still returned.
    pub fn read_all<R: LogRecord>(&self) -> Vec<R> {
        let Some(backend) = &self.backend else {
            return Vec::new();
        };

        match Self::load_raw::<R>(backend.as_ref()) {
            Ok(items) => decode_records(items),
            Err(reason) => {
                warn!("Discarding unreadable {} log: {}", R::LOG, reason);
                Vec::new()
            }
        }
    }

    /// Append a record to its log.
    ///
    /// Stored items are carried over untouched, including ones this
    /// version cannot decode. A log whose stored value is not a JSON array
    /// is left as it is and the append reports `Failed`.
    pub fn append<R: LogRecord>(&self, record: R) -> AppendOutcome {
        let record = match record.prepare() {
            Ok(record) => record,
            Err(reason) => {
                debug!("Rejected {} record: {}", R::LOG, reason);
                return AppendOutcome::Rejected(reason);
            }
        };

        let Some(backend) = &self.backend else {
            return AppendOutcome::Unavailable;
        };

        let outcome = {
            let _guard = match self.write_lock.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };

            let mut items = match Self::load_raw::<R>(backend.as_ref()) {
                Ok(items) => items,
                Err(reason) => {
                    warn!("Not appending to {} log: {}", R::LOG, reason);
                    return AppendOutcome::Failed;
                }
            };

            let last = items
                .last()
                .and_then(|v| serde_json::from_value::<R>(v.clone()).ok());
            if last.is_some_and(|last| record.repeats(&last)) {
                debug!("Dropped repeated {} record", R::LOG);
                return AppendOutcome::Duplicate;
            }

            let id = record.id().clone();
            let encoded = serde_json::to_value(&record).and_then(|value| {
                items.push(value);
                serde_json::to_string(&items)
            });

            match encoded {
                Ok(raw) => match backend.set(R::LOG.storage_key(), &raw) {
                    Ok(()) => AppendOutcome::Stored(id),
                    Err(e) => {
                        warn!("Failed to write {} log: {}", R::LOG, e);
                        AppendOutcome::Failed
                    }
                },
                Err(e) => {
                    warn!("Failed to serialize {} log: {}", R::LOG, e);
                    AppendOutcome::Failed
                }
            }
        };

        if let AppendOutcome::Stored(id) = &outcome {
            debug!("Appended {} record {}", R::LOG, id);
            self.notifier.notify(R::LOG.channel());
        }
        outcome
    }

    /// Stored items of a log, undecoded. A missing key is an empty log;
    /// anything other than a JSON array is an error.
    fn load_raw<R: LogRecord>(backend: &dyn StorageBackend) -> Result<Vec<Value>, String> {
        let raw = match backend.get(R::LOG.storage_key()) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(Vec::new()),
            Err(e) => return Err(e.to_string()),
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(items)) => Ok(items),
            Ok(_) => Err("stored value is not a JSON array".to_string()),
            Err(e) => Err(e.to_string()),
        }
    }

    /// Record a feedback vote on a chat answer
    pub fn add_feedback(&self, kind: FeedbackKind) -> AppendOutcome {
        self.append(FeedbackEntry::new(kind))
    }

    /// Record a selected upload. Dropped if the previous document has the
    /// same name.
    pub fn add_document(&self, name: impl Into<String>, size_bytes: u64) -> AppendOutcome {
        self.append(DocumentEntry::new(name, size_bytes))
    }

    /// Record a submitted question
    pub fn add_query(&self, text: impl Into<String>) -> AppendOutcome {
        self.append(QueryEntry::new(text))
    }

    /// Record the confidence score of one surfaced citation
    pub fn add_confidence_score(&self, score: f64) -> AppendOutcome {
        self.append(ConfidenceEntry::new(score))
    }

    pub fn feedback(&self) -> Vec<FeedbackEntry> {
        self.read_all()
    }

    pub fn documents(&self) -> Vec<DocumentEntry> {
        self.read_all()
    }

    pub fn queries(&self) -> Vec<QueryEntry> {
        self.read_all()
    }

    pub fn confidence_scores(&self) -> Vec<ConfidenceEntry> {
        self.read_all()
    }

    /// Number of records currently in `log`
    pub fn len(&self, log: LogKind) -> usize {
        match log {
            LogKind::Feedback => self.feedback().len(),
            LogKind::Documents => self.documents().len(),
            LogKind::Queries => self.queries().len(),
            LogKind::Confidence => self.confidence_scores().len(),
        }
    }
}

fn decode_records<R: LogRecord>(items: Vec<Value>) -> Vec<R> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<R>(item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping malformed {} record at index {}: {}", R::LOG, index, e);
                None
            }
        })
        .collect()
}

impl std::fmt::Debug for EventLogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLogStore")
            .field("available", &self.is_available())
            .field("notifier", &self.notifier)
            .finish()
    }
}
