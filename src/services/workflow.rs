//! Workflow engine client
//!
//! The workflow engine does all document work (extraction, chunking,
//! embedding, retrieval, answering). This client only speaks its two
//! webhooks and normalizes what comes back:
//! - chat: JSON message in, JSON or plain text out, always returned as
//!   `{success, data}`
//! - upload: multipart form in, JSON out (`{}` when the body is not JSON)
//!
//! A non-2xx status becomes [`PrismError::Workflow`] carrying the status.
//! There is no retry.

use crate::config::PrismConfig;
use crate::error::{PrismError, Result};
use crate::types::now_millis;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

/// MIME type assumed for uploads that do not declare one
pub const DEFAULT_FILE_TYPE: &str = "application/pdf";

/// Chat request as accepted from the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatQuery {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default)]
    pub session_id: String,
}

/// Message forwarded to the chat webhook
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatMessage<'a> {
    chat_input: &'a str,
    session_id: String,
    action: &'static str,
    file_name: &'a str,
}

/// Successful proxy reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyReply {
    pub success: bool,
    pub data: Value,
}

impl ProxyReply {
    fn ok(data: Value) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Failed proxy reply, `{error, status}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyError {
    pub error: String,
    pub status: u16,
}

impl From<&PrismError> for ProxyError {
    fn from(err: &PrismError) -> Self {
        let error = match err {
            PrismError::Workflow { message, .. } => message.clone(),
            PrismError::InvalidInput(message) => message.clone(),
            other => other.to_string(),
        };
        Self {
            error,
            status: err.status(),
        }
    }
}

/// Interpret a webhook body: JSON when it parses, otherwise
/// `{"output": <text>}`
pub fn normalize_body(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| json!({ "output": raw }))
}

/// Multipart form the workflow webhooks expect: `data` (the file),
/// `fileName`, `fileType`
pub(crate) fn upload_form(file_name: &str, file_type: &str, bytes: Vec<u8>) -> Result<Form> {
    let part = Part::bytes(bytes)
        .file_name(file_name.to_string())
        .mime_str(file_type)?;
    Ok(Form::new()
        .part("data", part)
        .text("fileName", file_name.to_string())
        .text("fileType", file_type.to_string()))
}

/// Client for the workflow engine's chat and upload webhooks
#[derive(Debug, Clone)]
pub struct WorkflowClient {
    client: reqwest::Client,
    chat_url: String,
    upload_url: String,
}

impl WorkflowClient {
    pub fn new(
        client: reqwest::Client,
        chat_url: impl Into<String>,
        upload_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            chat_url: chat_url.into(),
            upload_url: upload_url.into(),
        }
    }

    pub fn from_config(config: &PrismConfig) -> Result<Self> {
        Ok(Self::new(
            config.http_client()?,
            config.chat_url.clone(),
            config.upload_url.clone(),
        ))
    }

    /// Send a chat message and return the normalized reply
    pub async fn chat(&self, query: &ChatQuery) -> Result<ProxyReply> {
        if query.query.trim().is_empty() {
            return Err(PrismError::InvalidInput("No query provided".to_string()));
        }

        let session_id = if query.session_id.is_empty() {
            format!("session-{}", now_millis())
        } else {
            query.session_id.clone()
        };

        let message = ChatMessage {
            chat_input: &query.query,
            session_id,
            action: "sendMessage",
            file_name: query.file_name.as_deref().unwrap_or(""),
        };

        debug!("Sending chat message for session {}", message.session_id);
        let response = self.client.post(&self.chat_url).json(&message).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Workflow chat error: {} {}", status, body);
            return Err(PrismError::Workflow {
                status: status.as_u16(),
                message: format!("n8n returned {}", status.as_u16()),
            });
        }

        let raw = response.text().await?;
        Ok(ProxyReply::ok(normalize_body(&raw)))
    }

    /// Forward a document to the upload webhook
    pub async fn upload(
        &self,
        file_name: &str,
        file_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<ProxyReply> {
        if file_name.is_empty() {
            return Err(PrismError::InvalidInput("No file provided".to_string()));
        }
        let file_type = file_type.unwrap_or(DEFAULT_FILE_TYPE);

        debug!("Uploading {} ({} bytes) to workflow", file_name, bytes.len());
        let form = upload_form(file_name, file_type, bytes)?;
        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Workflow upload error: {} {}", status, body);
            return Err(PrismError::Workflow {
                status: status.as_u16(),
                message: format!("n8n webhook returned {}", status.as_u16()),
            });
        }

        let raw = response.text().await.unwrap_or_default();
        let data = serde_json::from_str(&raw).unwrap_or_else(|_| json!({}));
        Ok(ProxyReply::ok(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_json_body() {
        assert_eq!(normalize_body(r#"{"answer":"42"}"#), json!({"answer": "42"}));
        assert_eq!(normalize_body("[1,2]"), json!([1, 2]));
    }

    #[test]
    fn test_normalize_plain_text_body() {
        assert_eq!(
            normalize_body("The clause allows termination."),
            json!({"output": "The clause allows termination."})
        );
    }

    #[test]
    fn test_chat_message_wire_format() {
        let message = ChatMessage {
            chat_input: "summarize",
            session_id: "prism-1-abc".to_string(),
            action: "sendMessage",
            file_name: "",
        };
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["chatInput"], "summarize");
        assert_eq!(value["sessionId"], "prism-1-abc");
        assert_eq!(value["action"], "sendMessage");
        assert_eq!(value["fileName"], "");
    }

    #[test]
    fn test_proxy_error_from_workflow_error() {
        let err = PrismError::Workflow {
            status: 404,
            message: "n8n returned 404".to_string(),
        };
        let shape = ProxyError::from(&err);
        assert_eq!(shape.error, "n8n returned 404");
        assert_eq!(shape.status, 404);
    }

    #[tokio::test]
    async fn test_blank_query_rejected_before_network() {
        let client = WorkflowClient::new(
            reqwest::Client::new(),
            "http://127.0.0.1:9/chat",
            "http://127.0.0.1:9/upload",
        );
        let err = client
            .chat(&ChatQuery {
                query: "   ".to_string(),
                file_name: None,
                session_id: String::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PrismError::InvalidInput(_)));
    }
}
