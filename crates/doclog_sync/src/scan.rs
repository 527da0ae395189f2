//! Directory scanning.

use crate::error::{SyncError, SyncResult};
use crate::naming;
use chrono::{DateTime, NaiveDate, Utc};
use doclog_core::time::Ticks;
use doclog_core::DocumentId;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A document file found in a sync root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    /// Full path.
    pub path: PathBuf,
    /// Creation ticks from the file name.
    pub ticks: Ticks,
    /// Document id from the file name.
    pub id: DocumentId,
}

/// Everything of interest in a sync root.
#[derive(Debug, Clone, Default)]
pub struct DirectoryScan {
    /// Days named by archive markers.
    pub archived_days: Vec<NaiveDate>,
    /// Document files, one per id, in path order.
    pub files: Vec<ExportedFile>,
}

impl DirectoryScan {
    /// Documents created at or before this instant are out of scope.
    pub fn watermark(&self) -> DateTime<Utc> {
        naming::watermark(self.archived_days.iter().copied())
    }

    /// Ids that already have a file.
    pub fn exported_ids(&self) -> HashSet<DocumentId> {
        self.files.iter().map(|f| f.id).collect()
    }
}

/// Recursively scans `root` for archive markers and document files.
///
/// A missing root scans as empty.
pub fn scan_directory(root: &Path) -> SyncResult<DirectoryScan> {
    if !root.exists() {
        debug!(root = %root.display(), "sync root does not exist yet");
        return Ok(DirectoryScan::default());
    }
    if !root.is_dir() {
        return Err(SyncError::NotADirectory {
            path: root.to_path_buf(),
        });
    }

    let mut scan = DirectoryScan::default();
    let mut seen = HashSet::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };

        if let Some(day) = naming::archive_day(name) {
            scan.archived_days.push(day);
        } else if let Some(parsed) = naming::parse_document_file_name(name) {
            if !seen.insert(parsed.id) {
                warn!(
                    path = %entry.path().display(),
                    document_id = %parsed.id,
                    "ignoring second file for the same document"
                );
                continue;
            }
            scan.files.push(ExportedFile {
                path: entry.into_path(),
                ticks: parsed.ticks,
                id: parsed.id,
            });
        }
    }

    debug!(
        root = %root.display(),
        markers = scan.archived_days.len(),
        files = scan.files.len(),
        "sync root scanned"
    );
    Ok(scan)
}
