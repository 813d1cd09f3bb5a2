//! Direct event recording commands (`feedback`, `score`, `query`, `document`)

use prism_core::{error::Result, FeedbackKind, PrismConfig};
use std::path::Path;
use tracing::debug;

use super::helpers::{open_store, report_outcome};

/// Record a feedback vote
pub fn feedback(kind: FeedbackKind, config: &PrismConfig) -> Result<()> {
    let store = open_store(config);
    report_outcome(&format!("{} feedback", kind), store.add_feedback(kind))
}

/// Record a confidence score (clamped to 0-100)
pub fn score(value: f64, config: &PrismConfig) -> Result<()> {
    let store = open_store(config);
    report_outcome("confidence score", store.add_confidence_score(value))
}

/// Record a submitted query without sending it anywhere
pub fn query(text: &str, config: &PrismConfig) -> Result<()> {
    let store = open_store(config);
    report_outcome("query", store.add_query(text))
}

/// Record a document by name and size, without uploading it
pub fn document(path: &Path, config: &PrismConfig) -> Result<()> {
    let metadata = std::fs::metadata(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    debug!("Recording document {} ({} bytes)", name, metadata.len());

    let store = open_store(config);
    report_outcome(&name, store.add_document(name.as_str(), metadata.len()))
}
