//! Export command implementation.

use super::open_store;
use doclog_sync::{export_store, SyncConfig};
use std::path::Path;

/// Runs the export command.
pub fn run(path: &Path, dir: &Path, compact: bool) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(path)?;
    let config = SyncConfig::default().with_pretty_json(!compact);
    let report = export_store(&store, dir, &config)?;

    println!("Exported {} document(s) to {:?}", report.exported.len(), dir);
    if !doclog_core::time::is_unset(report.watermark) {
        println!("Archived up to {}", report.watermark);
    }

    if report.export_aborted || report.export_failures > 0 {
        println!(
            "✗ Export incomplete: {} file(s) failed{}",
            report.export_failures,
            if report.export_aborted {
                ", stopped early"
            } else {
                ""
            }
        );
        return Err("Export incomplete".into());
    }

    println!("✓ Export complete");
    Ok(())
}
