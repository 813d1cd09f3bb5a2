//! Prism - Document Q&A Dashboard Analytics
//!
//! Command-line front end: records dashboard events, talks to the workflow
//! engine, and prints the analytics the dashboard shows.

mod cli;

use clap::{Parser, Subcommand};
use prism_core::{error::Result, FeedbackKind};
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(name = "prism")]
#[command(about = "Document Q&A dashboard analytics", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Set log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Directory holding the event logs (overrides config and PRISM_DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a feedback vote on an answer
    Feedback {
        /// up|down (also positive|negative)
        kind: FeedbackKind,
    },

    /// Record a confidence score
    Score {
        /// Score between 0 and 100; out-of-range values are clamped
        #[arg(allow_hyphen_values = true)]
        value: f64,
    },

    /// Record a submitted query without sending it
    Query {
        /// Query text
        text: String,
    },

    /// Record a document by name and size without uploading it
    Document {
        /// Path to the document
        path: PathBuf,
    },

    /// Ask the workflow engine a question about your documents
    Ask {
        /// Question text
        question: String,

        /// Name of the uploaded document the question is about
        #[arg(short, long)]
        file: Option<String>,
    },

    /// Record a document and upload it to the workflow engine
    Upload {
        /// Path to the document
        path: PathBuf,
    },

    /// Put a document or pasted text into the knowledge-base folder
    Drive {
        /// Path to the document
        #[arg(conflicts_with = "text")]
        path: Option<PathBuf>,

        /// Upload this text as a .txt document instead of a file
        #[arg(short, long)]
        text: Option<String>,

        /// File name to store under
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Show the dashboard analytics
    Stats {
        /// Output the full snapshot as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Our crates at the requested level, dependencies quieter
    let level = level.as_str().to_lowercase();
    let filter = EnvFilter::new(format!(
        "prism={level},prism_core={level},reqwest=warn,hyper=warn",
        level = level
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr) // Logs to stderr, output to stdout
        .init();

    debug!("Prism v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = cli::helpers::load_config(cli.config.as_deref(), cli.data_dir)?;

    match cli.command {
        Commands::Feedback { kind } => cli::record::feedback(kind, &config),
        Commands::Score { value } => cli::record::score(value, &config),
        Commands::Query { text } => cli::record::query(&text, &config),
        Commands::Document { path } => cli::record::document(&path, &config),
        Commands::Ask { question, file } => cli::ask::handle(&question, file, &config).await,
        Commands::Upload { path } => cli::upload::workflow(&path, &config).await,
        Commands::Drive { path, text, name } => {
            cli::upload::drive(path.as_deref(), text.as_deref(), name.as_deref(), &config).await
        }
        Commands::Stats { json } => cli::stats::handle(json, &config),
    }
}
