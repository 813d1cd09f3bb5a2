//! Common test utilities and helpers

#![allow(dead_code)]

use axum::Router;
use prism_core::{ChangeNotifier, EventLogStore, FileStorage, WorkflowClient};
use std::path::Path;
use std::sync::Arc;

/// Store over a fresh in-memory backend
pub fn memory_store() -> Arc<EventLogStore> {
    Arc::new(EventLogStore::in_memory())
}

/// Store over a directory, as the CLI opens it
pub fn file_store(dir: &Path) -> Arc<EventLogStore> {
    Arc::new(EventLogStore::new(
        Arc::new(FileStorage::open(dir)),
        ChangeNotifier::default(),
    ))
}

/// Serve `app` on a random local port and return its base URL
pub async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test server");
    let addr = listener.local_addr().expect("Test server has no address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Test server failed");
    });
    format!("http://{}", addr)
}

/// Workflow client pointed at `<base>/chat` and `<base>/upload`
pub fn workflow_client(base: &str) -> WorkflowClient {
    WorkflowClient::new(
        reqwest::Client::new(),
        format!("{}/chat", base),
        format!("{}/upload", base),
    )
}
