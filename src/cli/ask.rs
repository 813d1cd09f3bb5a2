//! Chat command: ask the workflow engine a question

use prism_core::{error::Result, ChatSession, PrismConfig, WorkflowClient};
use tracing::debug;

use super::helpers::open_store;

/// Ask one question and print the answer with its result cards
pub async fn handle(question: &str, file: Option<String>, config: &PrismConfig) -> Result<()> {
    let store = open_store(config);
    let client = WorkflowClient::from_config(config)?;

    let mut session = ChatSession::new(client, store);
    if let Some(name) = file {
        session = session.with_document(name);
    }
    debug!("Chat session {}", session.session_id());

    let reply = session.ask(question).await?;
    println!("{}", reply.content);

    for card in &reply.results {
        println!();
        println!(
            "  Page {}, paragraph {}  [{} confidence: {:.0}%]",
            card.page,
            card.paragraph,
            card.level(),
            card.confidence
        );
        println!("  {}", card.text);
        if !card.relevance_note.is_empty() {
            println!("  Why: {}", card.relevance_note);
        }
        if !card.audit_note.is_empty() {
            println!("  Audit ({:?}): {}", card.audit_status, card.audit_note);
        }
    }

    Ok(())
}
