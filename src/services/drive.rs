//! Storage-provider upload
//!
//! Puts a document (or pasted text) into the knowledge-base folder the
//! workflow engine indexes. When the provider refuses for lack of storage
//! quota, which happens when a service account uploads outside a shared
//! drive, the document is sent to the workflow's upload webhook instead
//! and the result reports `fallback: "n8n-webhook"`.

use super::workflow::{upload_form, DEFAULT_FILE_TYPE};
use crate::config::PrismConfig;
use crate::error::{PrismError, Result};
use crate::types::now_millis;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Fallback tag reported when the workflow webhook took the upload
pub const WEBHOOK_FALLBACK: &str = "n8n-webhook";

const QUOTA_HELP: &str = "Service accounts cannot upload to My Drive directly. Use a Shared Drive folder or configure N8N_UPLOAD_WEBHOOK_URL to upload via your n8n Google Drive credentials.";

/// Outcome of a storage-provider upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveUpload {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_view_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl DriveUpload {
    pub fn is_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedFile {
    id: String,
    name: String,
    #[serde(default)]
    web_view_link: Option<String>,
}

/// Whether a provider error means the account has no storage quota
pub fn is_quota_error(message: &str) -> bool {
    message.contains("storage quota")
}

/// File name for pasted text: unsafe characters replaced by `_`, `.txt`
/// appended
pub fn pasted_text_name(file_name: Option<&str>) -> String {
    static UNSAFE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"[^a-zA-Z0-9._-]").expect("Valid file name regex"));

    let base = match file_name {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("pasted-text-{}", now_millis()),
    };
    format!("{}.txt", UNSAFE.replace_all(&base, "_"))
}

/// Uploader for the knowledge-base folder
#[derive(Debug, Clone)]
pub struct DriveClient {
    client: reqwest::Client,
    upload_url: String,
    folder_id: String,
    access_token: Option<String>,
    fallback_url: Option<String>,
}

impl DriveClient {
    pub fn new(
        client: reqwest::Client,
        upload_url: impl Into<String>,
        folder_id: impl Into<String>,
        access_token: Option<String>,
        fallback_url: Option<String>,
    ) -> Self {
        Self {
            client,
            upload_url: upload_url.into(),
            folder_id: folder_id.into(),
            access_token,
            fallback_url: fallback_url.filter(|url| !url.is_empty()),
        }
    }

    pub fn from_config(config: &PrismConfig) -> Result<Self> {
        Ok(Self::new(
            config.http_client()?,
            config.drive_upload_url.clone(),
            config.drive_folder_id.clone(),
            config.drive_access_token.clone(),
            config.drive_fallback_url.clone(),
        ))
    }

    /// Upload pasted text as a `.txt` document
    pub async fn upload_text(&self, text: &str, file_name: Option<&str>) -> Result<DriveUpload> {
        if text.trim().is_empty() {
            return Err(PrismError::InvalidInput("No text provided".to_string()));
        }
        let name = pasted_text_name(file_name);
        self.upload(&name, "text/plain", text.as_bytes().to_vec())
            .await
    }

    /// Upload a selected file
    pub async fn upload_file(
        &self,
        file_name: &str,
        file_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<DriveUpload> {
        if file_name.is_empty() {
            return Err(PrismError::InvalidInput("No file provided".to_string()));
        }
        self.upload(file_name, file_type.unwrap_or(DEFAULT_FILE_TYPE), bytes)
            .await
    }

    async fn upload(&self, file_name: &str, file_type: &str, bytes: Vec<u8>) -> Result<DriveUpload> {
        match self.create_file(file_name, file_type, bytes.clone()).await {
            Ok(created) => {
                info!("Stored {} as {}", created.name, created.id);
                Ok(DriveUpload {
                    success: true,
                    file_id: Some(created.id),
                    file_name: Some(created.name),
                    web_view_link: created.web_view_link,
                    fallback: None,
                    data: None,
                })
            }
            Err(e) if is_quota_error(&e.to_string()) => {
                warn!("Storage provider has no quota, falling back to workflow webhook");
                self.upload_via_webhook(file_name, file_type, bytes).await
            }
            Err(e) => Err(e),
        }
    }

    async fn create_file(
        &self,
        file_name: &str,
        file_type: &str,
        bytes: Vec<u8>,
    ) -> Result<CreatedFile> {
        let token = self
            .access_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                PrismError::Provider("storage provider access token is missing".to_string())
            })?;

        let boundary = format!("prism-{}", Uuid::new_v4().simple());
        let metadata = json!({ "name": file_name, "parents": [self.folder_id] });
        let body = related_body(&boundary, &metadata, file_type, &bytes);

        debug!("Creating {} in folder {}", file_name, self.folder_id);
        let response = self
            .client
            .post(&self.upload_url)
            .query(&[
                ("uploadType", "multipart"),
                ("supportsAllDrives", "true"),
                ("fields", "id,name,webViewLink"),
            ])
            .bearer_auth(token)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", boundary),
            )
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            return Err(PrismError::Provider(provider_message(&raw, status.as_u16())));
        }

        Ok(response.json().await?)
    }

    async fn upload_via_webhook(
        &self,
        file_name: &str,
        file_type: &str,
        bytes: Vec<u8>,
    ) -> Result<DriveUpload> {
        let url = self.fallback_url.as_deref().ok_or_else(|| {
            PrismError::Provider(format!(
                "storage quota exceeded and no fallback webhook is configured. {}",
                QUOTA_HELP
            ))
        })?;

        let form = upload_form(file_name, file_type, bytes)?;
        let response = self.client.post(url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(PrismError::Workflow {
                status: status.as_u16(),
                message: format!("n8n upload failed ({}): {}", status.as_u16(), text),
            });
        }

        let raw = response.text().await.unwrap_or_default();
        let data = serde_json::from_str(&raw).unwrap_or_else(|_| json!({}));
        Ok(DriveUpload {
            success: true,
            file_id: None,
            file_name: None,
            web_view_link: None,
            fallback: Some(WEBHOOK_FALLBACK.to_string()),
            data: Some(data),
        })
    }
}

/// `multipart/related` body: JSON metadata part, then the media part
fn related_body(boundary: &str, metadata: &Value, file_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(bytes.len() + 512);
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{}\r\n",
            boundary, metadata
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("--{}\r\nContent-Type: {}\r\n\r\n", boundary, file_type).as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}

/// Provider error text: `error.message` from a JSON body, else the raw body
fn provider_message(raw: &str, status: u16) -> String {
    let message = serde_json::from_str::<Value>(raw)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| raw.to_string());
    format!("upload failed ({}): {}", status, message)
}
