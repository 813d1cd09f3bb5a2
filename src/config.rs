//! Configuration for Prism
//!
//! Values are layered, later sources winning:
//! 1. Built-in defaults
//! 2. TOML file (`--config`, or `prism.toml` in the data directory)
//! 3. `PRISM_*` environment variables (`PRISM_DATA_DIR`, `PRISM_CHAT_URL`, ...)
//! 4. Deployment variables kept from the web dashboard
//!    (`N8N_CHAT_WEBHOOK_URL`, `N8N_WEBHOOK_URL`, `N8N_UPLOAD_WEBHOOK_URL`,
//!    `GOOGLE_DRIVE_FOLDER_ID`, `GOOGLE_DRIVE_ACCESS_TOKEN`)

use crate::error::Result;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Workflow webhook used when nothing else is configured
pub const DEFAULT_WEBHOOK_URL: &str = "https://trinitycore.app.n8n.cloud/webhook/upload-analyze";

/// Knowledge-base folder on the storage provider
pub const DEFAULT_DRIVE_FOLDER_ID: &str = "16b4BM1C0zxnmyQ98WumWMJMO5PVT6ypO";

/// Storage provider multipart upload endpoint
pub const DEFAULT_DRIVE_UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";

const CONFIG_FILE_NAME: &str = "prism.toml";

// (variable, config key)
const LEGACY_ENV: [(&str, &str); 5] = [
    ("N8N_CHAT_WEBHOOK_URL", "chat_url"),
    ("N8N_WEBHOOK_URL", "upload_url"),
    ("N8N_UPLOAD_WEBHOOK_URL", "drive_fallback_url"),
    ("GOOGLE_DRIVE_FOLDER_ID", "drive_folder_id"),
    ("GOOGLE_DRIVE_ACCESS_TOKEN", "drive_access_token"),
];

/// Resolved configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PrismConfig {
    /// Directory holding the event logs
    pub data_dir: PathBuf,

    /// Workflow webhook receiving chat messages
    pub chat_url: String,

    /// Workflow webhook receiving document uploads
    pub upload_url: String,

    /// Workflow webhook used when the storage provider has no quota
    #[serde(default)]
    pub drive_fallback_url: Option<String>,

    pub drive_folder_id: String,

    #[serde(default)]
    pub drive_access_token: Option<String>,

    pub drive_upload_url: String,

    /// Per-request timeout; unset leaves the HTTP client default
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl PrismConfig {
    /// Load configuration, reading `path` if given (it must exist) or the
    /// optional `prism.toml` in the default data directory
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("data_dir", default_data_dir().to_string_lossy().to_string())?
            .set_default("chat_url", DEFAULT_WEBHOOK_URL)?
            .set_default("upload_url", DEFAULT_WEBHOOK_URL)?
            .set_default("drive_folder_id", DEFAULT_DRIVE_FOLDER_ID)?
            .set_default("drive_upload_url", DEFAULT_DRIVE_UPLOAD_URL)?;

        builder = match path {
            Some(path) => {
                debug!("Loading configuration from {}", path.display());
                builder.add_source(File::from(path.to_path_buf()).required(true))
            }
            None => builder
                .add_source(File::from(default_data_dir().join(CONFIG_FILE_NAME)).required(false)),
        };

        builder = builder.add_source(Environment::with_prefix("PRISM"));

        for (var, key) in LEGACY_ENV {
            if let Ok(value) = env::var(var) {
                if !value.is_empty() {
                    debug!("Using {} for {}", var, key);
                    builder = builder.set_override(key, value)?;
                }
            }
        }

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Defaults with a specific data directory
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// HTTP client honoring the configured timeout
    pub fn http_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.request_timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(builder.build()?)
    }
}

impl Default for PrismConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            chat_url: DEFAULT_WEBHOOK_URL.to_string(),
            upload_url: DEFAULT_WEBHOOK_URL.to_string(),
            drive_fallback_url: None,
            drive_folder_id: DEFAULT_DRIVE_FOLDER_ID.to_string(),
            drive_access_token: None,
            drive_upload_url: DEFAULT_DRIVE_UPLOAD_URL.to_string(),
            request_timeout_secs: None,
        }
    }
}

/// Platform data directory for Prism, or `./.prism` when none exists
pub fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("app", "prism", "prism")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".prism"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = PrismConfig::with_data_dir("/tmp/prism-test");
        assert_eq!(config.data_dir, PathBuf::from("/tmp/prism-test"));
        assert_eq!(config.chat_url, DEFAULT_WEBHOOK_URL);
        assert!(config.request_timeout().is_none());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
data_dir = "/var/lib/prism"
chat_url = "http://localhost:5678/webhook/chat"
request_timeout_secs = 30
"#
        )
        .unwrap();

        let config = PrismConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/prism"));
        assert_eq!(config.chat_url, "http://localhost:5678/webhook/chat");
        assert_eq!(config.upload_url, DEFAULT_WEBHOOK_URL);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        assert!(PrismConfig::load(Some(Path::new("/nonexistent/prism.toml"))).is_err());
    }
}
