//! Chat consumer
//!
//! Writes to the event logs on behalf of the chat view: one query event per
//! submitted question, one confidence event per result card surfaced, and
//! feedback votes on answers. It never reads the logs.
//!
//! The workflow engine answers in several shapes; [`parse_reply`] turns any
//! of them into display text plus result cards.

use crate::error::{PrismError, Result};
use crate::services::drive::{DriveClient, DriveUpload};
use crate::services::workflow::{ChatQuery, ProxyReply, WorkflowClient};
use crate::store::{AppendOutcome, EventLogStore};
use crate::types::{now_millis, FeedbackKind};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Confidence used for a card whose score is missing or zero
pub const DEFAULT_CARD_CONFIDENCE: f64 = 75.0;

const UNPARSEABLE_REPLY: &str =
    "I received a response but couldn't parse it. Please try again.";

/// Audit state the workflow attached to a card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Verified,
    Pending,
}

/// Label shown next to a card's confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn of(score: f64) -> Self {
        if score >= 90.0 {
            ConfidenceLevel::High
        } else if score >= 70.0 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

impl std::fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfidenceLevel::High => write!(f, "High"),
            ConfidenceLevel::Medium => write!(f, "Medium"),
            ConfidenceLevel::Low => write!(f, "Low"),
        }
    }
}

/// One piece of evidence returned for a question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultCard {
    pub page: u32,
    pub paragraph: u32,
    pub confidence: f64,
    pub text: String,
    pub relevance_note: String,
    pub audit_status: AuditStatus,
    pub audit_note: String,
}

impl ResultCard {
    pub fn level(&self) -> ConfidenceLevel {
        ConfidenceLevel::of(self.confidence)
    }

    fn from_item(item: &Value, index: usize) -> Self {
        let text = match item {
            Value::String(s) => s.clone(),
            _ => first_str(item, &["extracted_text", "text"]).unwrap_or_else(|| item.to_string()),
        };

        Self {
            page: first_number(item, &["page_number", "page"])
                .map(|n| n as u32)
                .unwrap_or(index as u32 + 1),
            paragraph: first_number(item, &["paragraph"])
                .map(|n| n as u32)
                .unwrap_or(1),
            confidence: first_number(item, &["confidence_score", "confidence"])
                .unwrap_or(DEFAULT_CARD_CONFIDENCE),
            text,
            relevance_note: first_str(item, &["explanation_of_relevance", "relevanceNote"])
                .unwrap_or_default(),
            audit_status: match item.get("audit_status").and_then(Value::as_str) {
                Some("verified") => AuditStatus::Verified,
                _ => AuditStatus::Pending,
            },
            audit_note: first_str(item, &["audit_reasoning", "auditNote"]).unwrap_or_default(),
        }
    }
}

/// Interpreted workflow answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub content: String,
    pub results: Vec<ResultCard>,
}

// First field holding a non-zero number
fn first_number(item: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .filter_map(|key| item.get(*key).and_then(Value::as_f64))
        .find(|n| *n != 0.0 && !n.is_nan())
}

// First field holding a non-empty string
fn first_str(item: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| item.get(*key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn cards(items: &[Value]) -> Vec<ResultCard> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| ResultCard::from_item(item, i))
        .collect()
}

/// Turn the `data` of a workflow reply into text and result cards.
///
/// Accepted shapes, in order:
/// - an array of result items
/// - an object with a `results` array (text from `answer` or `message`)
/// - an object with one of `answer`, `message`, `output`, `response`, `text`
/// - anything else, shown verbatim
pub fn parse_reply(data: &Value) -> ChatReply {
    if let Value::Array(items) = data {
        let results = cards(items);
        return ChatReply {
            content: format!(
                "I found {} relevant section(s) in your document. Here are the results ranked by confidence:",
                results.len()
            ),
            results,
        };
    }

    if let Some(Value::Array(items)) = data.get("results") {
        let results = cards(items);
        let content = first_str(data, &["answer", "message"])
            .unwrap_or_else(|| format!("I found {} relevant section(s):", results.len()));
        return ChatReply { content, results };
    }

    let content = match data {
        Value::Null | Value::Bool(false) => UNPARSEABLE_REPLY.to_string(),
        Value::String(s) if s.is_empty() => UNPARSEABLE_REPLY.to_string(),
        Value::String(s) => s.clone(),
        _ => first_str(data, &["answer", "message", "output", "response", "text"])
            .unwrap_or_else(|| serde_json::to_string_pretty(data).unwrap_or_default()),
    };

    ChatReply {
        content,
        results: Vec::new(),
    }
}

/// Record a selected document, then forward it to the workflow.
///
/// The document event is written before the upload starts, so a failed
/// upload still appears in the document list.
pub async fn upload_document(
    client: &WorkflowClient,
    store: &EventLogStore,
    file_name: &str,
    file_type: Option<&str>,
    bytes: Vec<u8>,
) -> Result<ProxyReply> {
    if file_name.is_empty() {
        return Err(PrismError::InvalidInput("No file provided".to_string()));
    }
    store.add_document(file_name, bytes.len() as u64);
    client.upload(file_name, file_type, bytes).await
}

/// Record a selected document, then put it in the knowledge-base folder.
///
/// Same ordering as [`upload_document`]: the document event is written
/// first, whether or not the provider accepts the file.
pub async fn upload_to_drive(
    client: &DriveClient,
    store: &EventLogStore,
    file_name: &str,
    file_type: Option<&str>,
    bytes: Vec<u8>,
) -> Result<DriveUpload> {
    if file_name.is_empty() {
        return Err(PrismError::InvalidInput("No file provided".to_string()));
    }
    store.add_document(file_name, bytes.len() as u64);
    client.upload_file(file_name, file_type, bytes).await
}

/// Session identifier for the workflow's conversation memory:
/// `prism-<millis>-<6 base36 chars>`
pub fn new_session_id() -> String {
    const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("prism-{}-{}", now_millis(), suffix)
}

/// One chat conversation, bound to a session id for its lifetime
#[derive(Debug, Clone)]
pub struct ChatSession {
    session_id: String,
    file_name: Option<String>,
    client: WorkflowClient,
    store: Arc<EventLogStore>,
}

impl ChatSession {
    pub fn new(client: WorkflowClient, store: Arc<EventLogStore>) -> Self {
        Self {
            session_id: new_session_id(),
            file_name: None,
            client,
            store,
        }
    }

    /// Ask questions about a specific uploaded document
    pub fn with_document(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Submit a question.
    ///
    /// The query is recorded before the workflow is called, so a failed
    /// call still counts as a submitted question. Each returned card
    /// records one confidence score.
    pub async fn ask(&self, question: &str) -> Result<ChatReply> {
        let text = question.trim();
        if text.is_empty() {
            return Err(PrismError::InvalidInput("No query provided".to_string()));
        }

        self.store.add_query(text);

        let reply = self
            .client
            .chat(&ChatQuery {
                query: text.to_string(),
                file_name: self.file_name.clone(),
                session_id: self.session_id.clone(),
            })
            .await?;

        let parsed = parse_reply(&reply.data);
        for card in &parsed.results {
            self.store.add_confidence_score(card.confidence);
        }
        debug!(
            "Chat reply with {} result card(s) for session {}",
            parsed.results.len(),
            self.session_id
        );
        Ok(parsed)
    }

    /// Record a vote on an answer
    pub fn record_feedback(&self, kind: FeedbackKind) -> AppendOutcome {
        self.store.add_feedback(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_array_reply() {
        let data = json!([
            {
                "extracted_text": "Either party may terminate with 30 days notice.",
                "page_number": 12,
                "explanation_of_relevance": "Defines termination",
                "confidence_score": 94,
                "audit_status": "verified",
                "audit_reasoning": "Quoted verbatim"
            },
            { "text": "Renewal is automatic.", "confidence": 0 }
        ]);

        let reply = parse_reply(&data);
        assert_eq!(reply.results.len(), 2);
        assert!(reply.content.starts_with("I found 2 relevant section(s) in your document."));

        let first = &reply.results[0];
        assert_eq!(first.page, 12);
        assert_eq!(first.paragraph, 1);
        assert_eq!(first.confidence, 94.0);
        assert_eq!(first.audit_status, AuditStatus::Verified);
        assert_eq!(first.level(), ConfidenceLevel::High);

        let second = &reply.results[1];
        assert_eq!(second.page, 2);
        assert_eq!(second.confidence, DEFAULT_CARD_CONFIDENCE);
        assert_eq!(second.text, "Renewal is automatic.");
        assert_eq!(second.audit_status, AuditStatus::Pending);
    }

    #[test]
    fn test_parse_results_object() {
        let data = json!({
            "answer": "Termination requires notice.",
            "results": [{ "text": "30 days", "confidence_score": 81 }]
        });
        let reply = parse_reply(&data);
        assert_eq!(reply.content, "Termination requires notice.");
        assert_eq!(reply.results[0].level(), ConfidenceLevel::Medium);

        let bare = parse_reply(&json!({ "results": [] }));
        assert_eq!(bare.content, "I found 0 relevant section(s):");
    }

    #[test]
    fn test_parse_text_reply() {
        assert_eq!(parse_reply(&json!({ "output": "Plain answer" })).content, "Plain answer");
        assert_eq!(
            parse_reply(&json!({ "message": "", "response": "From response" })).content,
            "From response"
        );
        assert_eq!(parse_reply(&json!("just text")).content, "just text");
        assert_eq!(parse_reply(&Value::Null).content, UNPARSEABLE_REPLY);
    }

    #[test]
    fn test_parse_unknown_object_shown_verbatim() {
        let reply = parse_reply(&json!({ "status": "queued" }));
        assert!(reply.content.contains("\"status\": \"queued\""));
        assert!(reply.results.is_empty());
    }

    #[test]
    fn test_session_id_shape() {
        let id = new_session_id();
        let parts: Vec<_> = id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "prism");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 6);
        assert!(parts[2].chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_confidence_level_edges() {
        assert_eq!(ConfidenceLevel::of(90.0), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::of(89.9), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::of(70.0), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::of(69.0), ConfidenceLevel::Low);
    }
}
