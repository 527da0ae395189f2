//! Dump command implementation.

use super::open_store;
use doclog_core::{short_type_name, DocumentStore};
use serde::Serialize;
use std::path::Path;

/// Document representation for output.
#[derive(Debug, Serialize)]
pub struct DocumentInfo {
    /// Position in commit order.
    pub position: usize,
    /// Document id.
    pub id: String,
    /// Predecessor id (if any).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<String>,
    /// Creation time (RFC 3339).
    pub created: String,
    /// Payload type name.
    pub payload_type: String,
    /// Payload size in bytes.
    pub payload_size: usize,
    /// Description (if any).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Runs the dump command.
pub fn run(
    path: &Path,
    limit: Option<usize>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(path)?;
    let documents: Vec<DocumentInfo> = store
        .documents()?
        .into_iter()
        .take(limit.unwrap_or(usize::MAX))
        .enumerate()
        .map(|(position, doc)| DocumentInfo {
            position,
            id: doc.id.to_string(),
            required: doc.required_document_id.map(|id| id.to_string()),
            created: doc.date_created_utc.to_rfc3339(),
            payload_type: doc.payload_type_name,
            payload_size: doc.payload_json.len(),
            description: doc.description,
        })
        .collect();

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&documents)?);
        }
        _ => {
            print_text_output(&documents);
        }
    }

    Ok(())
}

fn print_text_output(documents: &[DocumentInfo]) {
    println!("Documents ({} shown)", documents.len());
    println!("===================");
    println!();

    for doc in documents {
        println!(
            "[{:>5}] {} {} {} ({} bytes)",
            doc.position,
            doc.created,
            doc.id,
            short_type_name(&doc.payload_type),
            doc.payload_size
        );
        match &doc.required {
            Some(required) => println!("        after {required}"),
            None => println!("        genesis"),
        }
        if let Some(description) = &doc.description {
            println!("        {description}");
        }
    }
}
