//! Writing documents to a sync root.

use crate::config::SyncConfig;
use crate::naming;
use crate::report::SyncReport;
use doclog_core::{Document, DocumentId, DocumentStore};
use std::fs;
use std::path::Path;
use tracing::{error, warn};

/// Writes each document to `root/yyyyMMdd/{ticks}_{type}_{id}.json`.
///
/// A failed directory creation stops the export; a failed file write is
/// counted and skipped.
pub(crate) fn export_documents(
    store: &dyn DocumentStore,
    root: &Path,
    ids: &[DocumentId],
    config: &SyncConfig,
    report: &mut SyncReport,
) {
    for &id in ids {
        let document = match store.get_document(id) {
            Ok(Some(document)) => document,
            Ok(None) => {
                warn!(document_id = %id, "document vanished before export");
                report.export_failures += 1;
                continue;
            }
            Err(e) => {
                error!(document_id = %id, error = %e, "could not read document for export");
                report.export_failures += 1;
                continue;
            }
        };

        let dir = root.join(naming::day_dir_name(&document));
        if let Err(e) = fs::create_dir_all(&dir) {
            error!(
                dir = %dir.display(),
                error = %e,
                "could not create export directory, stopping export"
            );
            report.export_aborted = true;
            return;
        }

        let path = dir.join(naming::document_file_name(&document));
        match write_document(&path, &document, config.pretty_json) {
            Ok(()) => report.exported.push(id),
            Err(e) => {
                error!(path = %path.display(), error = %e, "could not write export file");
                report.export_failures += 1;
            }
        }
    }
}

fn write_document(path: &Path, document: &Document, pretty: bool) -> std::io::Result<()> {
    let json = if pretty {
        serde_json::to_vec_pretty(document)?
    } else {
        serde_json::to_vec(document)?
    };
    fs::write(path, json)
}
