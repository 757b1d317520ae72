use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// FinRAG - Ask grounded questions about a financial report
#[derive(Parser, Debug)]
#[command(name = "finrag")]
#[command(about = "Retrieval-augmented question answering for financial reports", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract a document and show its structure analytics
    Inspect(InspectArgs),

    /// Index a document and answer one question about it
    Ask(AskArgs),

    /// Index a document and answer questions interactively
    Chat(ChatArgs),
}

#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Path to the PDF document
    pub file: PathBuf,
}

#[derive(Parser, Debug)]
pub struct AskArgs {
    /// Path to the PDF document
    pub file: PathBuf,

    /// The question to ask
    pub question: String,

    /// Number of chunks retrieved per question
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Minimum similarity for a chunk to ground the answer
    #[arg(long)]
    pub floor: Option<f32>,
}

#[derive(Parser, Debug)]
pub struct ChatArgs {
    /// Path to the PDF document
    pub file: PathBuf,
}
