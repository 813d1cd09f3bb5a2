//! Core data types for the Prism analytics engine
//!
//! The dashboard is fed by four independent append-only logs: feedback
//! votes, uploaded documents, submitted queries, and per-citation
//! confidence scores. Records are immutable once written; the field names
//! on the wire are camelCase so logs exported from the browser dashboard
//! stay readable.

use chrono::Utc;
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Current instant as epoch milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Unique identifier for log records
///
/// New records get a UUID v4. Older logs carry millisecond-timestamp ids,
/// so the id is kept as an opaque string and never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub String);

impl EntryId {
    /// Create a new random entry ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Change notification channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Channel {
    /// Fired after a feedback vote is stored
    FeedbackUpdated,
    /// Fired after a document, query, or confidence score is stored
    DataUpdated,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::FeedbackUpdated, Channel::DataUpdated];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::FeedbackUpdated => "feedback-updated",
            Channel::DataUpdated => "data-updated",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four logical logs kept by the event log store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    Feedback,
    Documents,
    Queries,
    Confidence,
}

impl LogKind {
    pub const ALL: [LogKind; 4] = [
        LogKind::Feedback,
        LogKind::Documents,
        LogKind::Queries,
        LogKind::Confidence,
    ];

    /// Stable key under which the log is persisted
    pub fn storage_key(&self) -> &'static str {
        match self {
            LogKind::Feedback => "prism_feedback",
            LogKind::Documents => "prism_documents",
            LogKind::Queries => "prism_queries",
            LogKind::Confidence => "prism_confidence",
        }
    }

    /// Channel notified after a successful append to this log
    pub fn channel(&self) -> Channel {
        match self {
            LogKind::Feedback => Channel::FeedbackUpdated,
            _ => Channel::DataUpdated,
        }
    }
}

impl std::fmt::Display for LogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogKind::Feedback => write!(f, "feedback"),
            LogKind::Documents => write!(f, "documents"),
            LogKind::Queries => write!(f, "queries"),
            LogKind::Confidence => write!(f, "confidence"),
        }
    }
}

/// A record that lives in one of the append-only logs
pub trait LogRecord: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Log this record type is appended to
    const LOG: LogKind;

    fn id(&self) -> &EntryId;

    /// Creation instant, epoch milliseconds
    fn timestamp(&self) -> i64;

    /// Whether this record repeats `last` (the most recently appended
    /// record) and must be dropped instead of stored
    fn repeats(&self, _last: &Self) -> bool {
        false
    }

    /// Normalize the record before it is written. `Err` carries the reason
    /// the record is rejected.
    fn prepare(self) -> std::result::Result<Self, String> {
        Ok(self)
    }
}

/// Direction of a feedback vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    Positive,
    Negative,
}

impl std::fmt::Display for FeedbackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedbackKind::Positive => write!(f, "positive"),
            FeedbackKind::Negative => write!(f, "negative"),
        }
    }
}

impl std::str::FromStr for FeedbackKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positive" | "up" | "+" => Ok(FeedbackKind::Positive),
            "negative" | "down" | "-" => Ok(FeedbackKind::Negative),
            other => Err(format!("unknown feedback kind: {}", other)),
        }
    }
}

/// One user vote on a chat answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub id: EntryId,
    #[serde(rename = "type")]
    pub kind: FeedbackKind,
    pub timestamp: i64,
}

impl FeedbackEntry {
    pub fn new(kind: FeedbackKind) -> Self {
        Self::at(kind, now_millis())
    }

    pub fn at(kind: FeedbackKind, timestamp: i64) -> Self {
        Self {
            id: EntryId::new(),
            kind,
            timestamp,
        }
    }
}

impl LogRecord for FeedbackEntry {
    const LOG: LogKind = LogKind::Feedback;

    fn id(&self) -> &EntryId {
        &self.id
    }

    fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

/// One selected upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub id: EntryId,
    pub name: String,
    #[serde(rename = "size")]
    pub size_bytes: u64,
    pub timestamp: i64,
}

impl DocumentEntry {
    pub fn new(name: impl Into<String>, size_bytes: u64) -> Self {
        Self::at(name, size_bytes, now_millis())
    }

    pub fn at(name: impl Into<String>, size_bytes: u64, timestamp: i64) -> Self {
        Self {
            id: EntryId::new(),
            name: name.into(),
            size_bytes,
            timestamp,
        }
    }
}

impl LogRecord for DocumentEntry {
    const LOG: LogKind = LogKind::Documents;

    fn id(&self) -> &EntryId {
        &self.id
    }

    fn timestamp(&self) -> i64 {
        self.timestamp
    }

    // Adjacency only: a later re-upload of the same file is a new record.
    fn repeats(&self, last: &Self) -> bool {
        self.name == last.name
    }
}

/// One submitted chat question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryEntry {
    pub id: EntryId,
    #[serde(rename = "query")]
    pub text: String,
    pub timestamp: i64,
}

impl QueryEntry {
    pub fn new(text: impl Into<String>) -> Self {
        Self::at(text, now_millis())
    }

    pub fn at(text: impl Into<String>, timestamp: i64) -> Self {
        Self {
            id: EntryId::new(),
            text: text.into(),
            timestamp,
        }
    }
}

impl LogRecord for QueryEntry {
    const LOG: LogKind = LogKind::Queries;

    fn id(&self) -> &EntryId {
        &self.id
    }

    fn timestamp(&self) -> i64 {
        self.timestamp
    }

    fn prepare(self) -> std::result::Result<Self, String> {
        if self.text.trim().is_empty() {
            return Err("query text is empty".to_string());
        }
        Ok(self)
    }
}

/// Lowest and highest storable confidence score
pub const SCORE_MIN: i64 = 0;
pub const SCORE_MAX: i64 = 100;

/// One citation or result card surfaced to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceEntry {
    pub id: EntryId,
    #[serde(deserialize_with = "deserialize_score")]
    pub score: i64,
    pub timestamp: i64,
}

impl ConfidenceEntry {
    /// Build an entry from a raw workflow score. Fractional values are
    /// rounded and the result clamped to `[0, 100]`.
    pub fn new(score: f64) -> Self {
        Self::at(score, now_millis())
    }

    pub fn at(score: f64, timestamp: i64) -> Self {
        Self {
            id: EntryId::new(),
            score: clamp_score(round_score(score)),
            timestamp,
        }
    }
}

impl LogRecord for ConfidenceEntry {
    const LOG: LogKind = LogKind::Confidence;

    fn id(&self) -> &EntryId {
        &self.id
    }

    fn timestamp(&self) -> i64 {
        self.timestamp
    }

    fn prepare(mut self) -> std::result::Result<Self, String> {
        self.score = clamp_score(self.score);
        Ok(self)
    }
}

fn clamp_score(score: i64) -> i64 {
    score.clamp(SCORE_MIN, SCORE_MAX)
}

fn round_score(score: f64) -> i64 {
    if score.is_nan() {
        return SCORE_MIN;
    }
    (score + 0.5).floor() as i64
}

// Browser logs may hold fractional scores; read them rounded, unclamped.
fn deserialize_score<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    Ok(round_score(raw))
}
