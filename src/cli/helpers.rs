//! Shared helper functions for CLI commands
//!
//! Configuration loading, store construction, and file reading used by
//! several subcommands.

use prism_core::{
    error::{PrismError, Result},
    AppendOutcome, ChangeNotifier, EventLogStore, FileStorage, PrismConfig,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Load configuration, letting `--data-dir` win over every other source
pub fn load_config(config_path: Option<&Path>, data_dir: Option<PathBuf>) -> Result<PrismConfig> {
    let mut config = PrismConfig::load(config_path)?;
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }
    debug!("Using data directory: {}", config.data_dir.display());
    Ok(config)
}

/// Event log store over the configured data directory
pub fn open_store(config: &PrismConfig) -> Arc<EventLogStore> {
    let backend = FileStorage::open(config.data_dir.clone());
    Arc::new(EventLogStore::new(
        Arc::new(backend),
        ChangeNotifier::default(),
    ))
}

/// Read a file for upload, returning its display name and contents
pub fn read_document(path: &Path) -> Result<(String, Vec<u8>)> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| PrismError::InvalidInput(format!("not a file: {}", path.display())))?;
    let bytes = std::fs::read(path)?;
    Ok((name, bytes))
}

/// MIME type from a file extension, for the types the dashboard accepts
pub fn guess_file_type(name: &str) -> Option<&'static str> {
    let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some("application/pdf"),
        "txt" => Some("text/plain"),
        "md" => Some("text/markdown"),
        "csv" => Some("text/csv"),
        "json" => Some("application/json"),
        "doc" => Some("application/msword"),
        "docx" => Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
        _ => None,
    }
}

/// Report an append outcome; anything but `Stored` or `Duplicate` is an error
pub fn report_outcome(what: &str, outcome: AppendOutcome) -> Result<()> {
    match outcome {
        AppendOutcome::Stored(id) => {
            println!("✓ Recorded {} ({})", what, id);
            Ok(())
        }
        AppendOutcome::Duplicate => {
            println!("  {} already recorded as the latest entry", what);
            Ok(())
        }
        AppendOutcome::Rejected(reason) => Err(PrismError::InvalidInput(reason)),
        AppendOutcome::Unavailable => Err(PrismError::Storage(
            "event log storage is unavailable".to_string(),
        )),
        AppendOutcome::Failed => Err(PrismError::Storage(format!(
            "failed to record {}",
            what
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_file_type() {
        assert_eq!(guess_file_type("contract.PDF"), Some("application/pdf"));
        assert_eq!(guess_file_type("notes.txt"), Some("text/plain"));
        assert_eq!(guess_file_type("archive.zip"), None);
        assert_eq!(guess_file_type("README"), None);
    }

    #[test]
    fn test_report_outcome() {
        assert!(report_outcome("query", AppendOutcome::Duplicate).is_ok());
        assert!(matches!(
            report_outcome("query", AppendOutcome::Rejected("empty".into())),
            Err(PrismError::InvalidInput(_))
        ));
        assert!(report_outcome("query", AppendOutcome::Unavailable).is_err());
    }

    #[test]
    fn test_read_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lease.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let (name, bytes) = read_document(&path).unwrap();
        assert_eq!(name, "lease.pdf");
        assert_eq!(bytes.len(), 8);
        assert!(read_document(&dir.path().join("missing.pdf")).is_err());
    }
}
