//! Verify command implementation.

use doclog_core::{inspect_journal, read_journal_documents, Document, DocumentId, JournalStore};
use std::collections::HashSet;
use std::path::Path;

/// Runs the verify command.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("Verifying store at {:?}", path);
    println!();

    let journal_path = JournalStore::journal_path_for(path);
    if !journal_path.exists() {
        return Err(format!("No store found at {:?}", path).into());
    }

    println!("Checking journal...");
    let report = match inspect_journal(&journal_path) {
        Ok(report) => report,
        Err(e) => {
            println!("  ✗ {e}");
            println!();
            println!("✗ Store verification failed");
            return Err("Verification failed".into());
        }
    };
    println!("  Commit records: {}", report.records);
    println!("  Valid bytes:    {}", report.valid_bytes);
    if report.torn_bytes > 0 {
        println!(
            "  Torn tail:      {} bytes (left in place, discarded on next open)",
            report.torn_bytes
        );
    }

    println!("Checking chain...");
    let documents = read_journal_documents(&journal_path)?;
    let errors = check_chain(&documents);
    println!("  Documents checked: {}", documents.len());
    for error in &errors {
        println!("  ✗ {error}");
    }

    println!();
    if errors.is_empty() {
        println!("✓ Store verification passed");
        Ok(())
    } else {
        println!("✗ Store verification failed");
        Err("Verification failed".into())
    }
}

/// Checks documents in commit order: one genesis, every predecessor
/// committed earlier, no repeated ids.
pub fn check_chain(documents: &[Document]) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen: HashSet<DocumentId> = HashSet::new();
    let mut genesis_count = 0;

    for (index, doc) in documents.iter().enumerate() {
        match doc.required_document_id {
            None => {
                genesis_count += 1;
                if index > 0 {
                    errors.push(format!(
                        "document {} at position {index} has no predecessor",
                        doc.id
                    ));
                }
            }
            Some(required) if !seen.contains(&required) => {
                errors.push(format!(
                    "document {} requires {required}, which is not committed before it",
                    doc.id
                ));
            }
            Some(_) => {}
        }
        if !seen.insert(doc.id) {
            errors.push(format!("document {} appears twice", doc.id));
        }
    }

    if !documents.is_empty() && genesis_count == 0 {
        errors.push("no genesis document".to_string());
    }
    errors
}
