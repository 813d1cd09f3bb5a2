//! Analytics summary command

use prism_core::{
    analytics::{format_size, format_time_ago, RECENT_DOCUMENTS},
    error::Result,
    types::now_millis,
    Analytics, PrismConfig,
};

use super::helpers::open_store;

/// Print the dashboard aggregates
pub fn handle(json: bool, config: &PrismConfig) -> Result<()> {
    let analytics = Analytics::new(open_store(config));
    let snapshot = analytics.snapshot();

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let now = now_millis();
    println!("Prism analytics");
    println!("  Quality index: {}", snapshot.quality_index);
    println!();

    let fb = &snapshot.feedback;
    println!(
        "Feedback: {} total, {} positive ({}%), {} negative ({}%)",
        fb.total, fb.positive, fb.positive_percent, fb.negative, fb.negative_percent
    );

    let conf = &snapshot.confidence;
    println!(
        "Confidence: average {} over {} scores (high {}%, medium {}%, low {}%, uncertain {}%)",
        conf.average, conf.total, conf.high, conf.medium, conf.low, conf.uncertain
    );

    println!();
    println!("Documents ({}):", snapshot.documents.len());
    if snapshot.documents.is_empty() {
        println!("  No documents uploaded yet");
    }
    for doc in snapshot.documents.iter().take(RECENT_DOCUMENTS) {
        println!(
            "  {}  {}  {}",
            doc.name,
            format_size(doc.size_bytes),
            format_time_ago(doc.timestamp, now)
        );
    }

    println!();
    println!("Top queries ({} total):", snapshot.total_queries);
    if snapshot.top_queries.is_empty() {
        println!("  No queries yet");
    }
    for (i, row) in snapshot.top_queries.iter().enumerate() {
        println!("  {}. {} ({})", i + 1, row.query, row.count);
    }

    Ok(())
}
