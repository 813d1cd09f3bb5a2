//! Storage-provider uploads and the quota fallback to the workflow webhook

mod common;

use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use common::{memory_store, spawn_server};
use prism_core::chat::upload_to_drive;
use prism_core::services::drive::WEBHOOK_FALLBACK;
use prism_core::{DriveClient, PrismError};
use serde_json::{json, Value};

async fn created(headers: HeaderMap) -> (StatusCode, Json<Value>) {
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == "Bearer test-token");
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": { "code": 401, "message": "Invalid Credentials" } })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "id": "file-123",
            "name": "notes.txt",
            "webViewLink": "https://drive.example/file-123"
        })),
    )
}

async fn no_quota() -> (StatusCode, Json<Value>) {
    (
        StatusCode::FORBIDDEN,
        Json(json!({
            "error": { "code": 403, "message": "Service Accounts do not have storage quota." }
        })),
    )
}

async fn webhook() -> Json<Value> {
    Json(json!({ "stored": true }))
}

async fn server() -> String {
    let app = Router::new()
        .route("/ok/files", post(created))
        .route("/full/files", post(no_quota))
        .route("/webhook", post(webhook));
    spawn_server(app).await
}

fn client(upload_url: String, token: Option<&str>, fallback: Option<String>) -> DriveClient {
    DriveClient::new(
        reqwest::Client::new(),
        upload_url,
        "folder-1",
        token.map(str::to_string),
        fallback,
    )
}

#[tokio::test]
async fn test_text_upload_creates_file() {
    let base = server().await;
    let drive = client(format!("{}/ok/files", base), Some("test-token"), None);

    let result = drive.upload_text("Meeting notes", Some("notes")).await.unwrap();
    assert!(result.success);
    assert!(!result.is_fallback());
    assert_eq!(result.file_id.as_deref(), Some("file-123"));
    assert_eq!(
        result.web_view_link.as_deref(),
        Some("https://drive.example/file-123")
    );
}

#[tokio::test]
async fn test_rejected_token_is_provider_error() {
    let base = server().await;
    let drive = client(format!("{}/ok/files", base), Some("wrong"), None);

    let err = drive.upload_text("Meeting notes", None).await.unwrap_err();
    match err {
        PrismError::Provider(message) => assert!(message.contains("Invalid Credentials")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_quota_error_falls_back_to_webhook() {
    let base = server().await;
    let drive = client(
        format!("{}/full/files", base),
        Some("test-token"),
        Some(format!("{}/webhook", base)),
    );

    let result = drive
        .upload_file("contract.pdf", None, b"%PDF-1.4".to_vec())
        .await
        .unwrap();
    assert!(result.success);
    assert_eq!(result.fallback.as_deref(), Some(WEBHOOK_FALLBACK));
    assert_eq!(result.data, Some(json!({ "stored": true })));
}

#[tokio::test]
async fn test_quota_error_without_fallback_explains() {
    let base = server().await;
    let drive = client(format!("{}/full/files", base), Some("test-token"), None);

    let err = drive
        .upload_file("contract.pdf", None, b"%PDF-1.4".to_vec())
        .await
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("no fallback webhook"));
    assert!(message.contains("Shared Drive"));
}

#[tokio::test]
async fn test_file_upload_records_document() {
    let base = server().await;
    let store = memory_store();
    let drive = client(
        format!("{}/full/files", base),
        Some("test-token"),
        Some(format!("{}/webhook", base)),
    );

    let result = upload_to_drive(&drive, &store, "contract.pdf", None, b"%PDF-1.4".to_vec())
        .await
        .unwrap();
    assert!(result.is_fallback());

    let docs = store.documents();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].name, "contract.pdf");
    assert_eq!(docs[0].size_bytes, 8);
}

#[tokio::test]
async fn test_rejected_drive_upload_still_records_document() {
    let base = server().await;
    let store = memory_store();
    let drive = client(format!("{}/ok/files", base), Some("wrong"), None);

    assert!(upload_to_drive(&drive, &store, "lease.pdf", None, b"bytes".to_vec())
        .await
        .is_err());
    assert_eq!(store.documents().len(), 1);
}
