// Ingestion of order lines from disk
pub mod csv_reader;
pub mod jsonl;

pub use csv_reader::{parse_csv_file, parse_csv_reader};
pub use jsonl::{parse_jsonl_file, parse_jsonl_reader};

use crate::models::OrderLine;
use std::path::Path;
use tracing::info;

/// Error type for ingestion. Only whole-file failures reach the caller;
/// per-row failures are logged and counted in [`ParsedOrders::skipped_rows`].
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read file: {0}")]
    Read(String),

    #[error("Failed to parse CSV: {0}")]
    Csv(String),

    #[error("Failed to parse JSON: {0}")]
    Json(String),

    #[error("Expected {expected} columns, found {found}")]
    MissingColumns { expected: usize, found: usize },

    #[error("Invalid value '{value}' in column '{column}'")]
    InvalidField { column: &'static str, value: String },
}

/// Result of ingesting one file.
#[derive(Debug, Clone, Default)]
pub struct ParsedOrders {
    pub records: Vec<OrderLine>,
    pub total_rows: usize,
    pub parsed_rows: usize,
    pub skipped_rows: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Jsonl,
}

impl InputFormat {
    /// `.jsonl` and `.json` files are JSON lines; anything else is CSV.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("jsonl") | Some("json") => InputFormat::Jsonl,
            _ => InputFormat::Csv,
        }
    }
}

/// Load order lines from `path`, picking the format from its extension.
pub fn load_orders(path: &Path) -> Result<ParsedOrders, IngestError> {
    let parsed = match InputFormat::from_path(path) {
        InputFormat::Csv => parse_csv_file(path)?,
        InputFormat::Jsonl => parse_jsonl_file(path)?,
    };

    info!(
        path = %path.display(),
        total = parsed.total_rows,
        parsed = parsed.parsed_rows,
        skipped = parsed.skipped_rows,
        "ingested order lines"
    );

    Ok(parsed)
}
