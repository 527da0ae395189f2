//! Inspect command implementation.

use super::open_store;
use chrono::NaiveDate;
use doclog_core::{inspect_journal, DocCache, DocumentStore, JournalStore};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Store inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Store path.
    pub path: String,
    /// Journal file size in bytes.
    pub journal_size: u64,
    /// Number of commit records.
    pub commit_records: usize,
    /// Bytes of an incomplete trailing record.
    pub torn_bytes: u64,
    /// Number of documents.
    pub document_count: usize,
    /// The genesis document.
    pub genesis: Option<String>,
    /// The latest document.
    pub latest: Option<String>,
    /// Sequence of the last commit.
    pub sequence: u64,
    /// Documents per day (if requested).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days: Option<Vec<DayCount>>,
}

/// Document count for one day.
#[derive(Debug, Serialize)]
pub struct DayCount {
    /// UTC day.
    pub day: NaiveDate,
    /// Documents created that day.
    pub documents: usize,
}

/// Runs the inspect command.
pub fn run(path: &Path, show_days: bool, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let journal_path = JournalStore::journal_path_for(path);
    if !journal_path.exists() {
        return Err(format!("No store found at {:?}", path).into());
    }

    // Read the framing before opening, since opening truncates a torn tail.
    let report = inspect_journal(&journal_path)?;
    let journal_size = fs::metadata(&journal_path)?.len();
    let store = open_store(path)?;

    let documents = store.documents()?;
    let mut result = InspectResult {
        path: path.display().to_string(),
        journal_size,
        commit_records: report.records,
        torn_bytes: report.torn_bytes,
        document_count: documents.len(),
        genesis: documents
            .iter()
            .find(|d| d.is_genesis())
            .map(|d| d.id.to_string()),
        latest: store.latest_document_id()?.map(|id| id.to_string()),
        sequence: store.committed_sequence().as_u64(),
        days: None,
    };

    if show_days {
        let cache = DocCache::load(&store)?;
        result.days = Some(
            cache
                .days()
                .map(|(day, documents)| DayCount { day, documents })
                .collect(),
        );
    }

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("doclog Store Inspection");
    println!("=======================");
    println!();
    println!("Path: {}", result.path);
    println!();
    println!("Journal:");
    println!("  Size:           {} bytes", result.journal_size);
    println!("  Commit records: {}", result.commit_records);
    if result.torn_bytes > 0 {
        println!("  Torn tail:      {} bytes (discarded on open)", result.torn_bytes);
    }
    println!();
    println!("Documents:");
    println!("  Count:    {}", result.document_count);
    println!("  Genesis:  {}", result.genesis.as_deref().unwrap_or("-"));
    println!("  Latest:   {}", result.latest.as_deref().unwrap_or("-"));
    println!("  Sequence: {}", result.sequence);

    if let Some(days) = &result.days {
        println!();
        println!("Days:");
        for day in days {
            println!("  {} {}", day.day.format("%Y-%m-%d"), day.documents);
        }
    }
}
