//! Document upload commands (`upload`, `drive`)

use prism_core::{
    chat::{upload_document, upload_to_drive},
    error::Result, DriveClient, PrismConfig, PrismError, WorkflowClient,
};
use std::path::Path;

use super::helpers::{guess_file_type, open_store, read_document};

/// Record a document and forward it to the workflow upload webhook
pub async fn workflow(path: &Path, config: &PrismConfig) -> Result<()> {
    let (name, bytes) = read_document(path)?;
    let store = open_store(config);
    let client = WorkflowClient::from_config(config)?;

    let reply = upload_document(&client, &store, &name, guess_file_type(&name), bytes).await?;
    println!("✓ Uploaded {}", name);
    println!("{}", serde_json::to_string_pretty(&reply.data)?);
    Ok(())
}

/// Put a file or pasted text into the knowledge-base folder
pub async fn drive(
    path: Option<&Path>,
    text: Option<&str>,
    name: Option<&str>,
    config: &PrismConfig,
) -> Result<()> {
    let client = DriveClient::from_config(config)?;

    let result = match (path, text) {
        (Some(path), None) => {
            let (file_name, bytes) = read_document(path)?;
            let file_name = name.map(str::to_string).unwrap_or(file_name);
            let store = open_store(config);
            upload_to_drive(&client, &store, &file_name, guess_file_type(&file_name), bytes)
                .await?
        }
        (None, Some(text)) => client.upload_text(text, name).await?,
        _ => {
            return Err(PrismError::InvalidInput(
                "provide either a file path or --text".to_string(),
            ))
        }
    };

    if result.is_fallback() {
        println!("✓ Uploaded via workflow webhook (storage provider has no quota)");
    } else {
        println!(
            "✓ Stored {} ({})",
            result.file_name.as_deref().unwrap_or("document"),
            result.file_id.as_deref().unwrap_or("")
        );
        if let Some(link) = &result.web_view_link {
            println!("  {}", link);
        }
    }
    Ok(())
}
