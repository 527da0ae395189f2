//! Outcome of a sync pass.

use chrono::{DateTime, Utc};
use doclog_core::{DocumentId, FailureReason};
use std::fmt;
use std::path::PathBuf;

/// Why an exported file was not imported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The file could not be read or is not a document.
    Unreadable {
        /// Error message.
        message: String,
    },
    /// The id inside the file differs from the id in its name.
    IdMismatch {
        /// Id found inside the file.
        embedded: DocumentId,
    },
    /// No payload type is registered under the file's type name.
    UnresolvedType {
        /// The type name found in the file.
        type_name: String,
    },
    /// The payload did not decode as the registered type.
    Undecodable {
        /// Error message.
        message: String,
    },
    /// The gateway refused the document.
    Rejected {
        /// Failure reason.
        reason: FailureReason,
        /// Failure messages.
        messages: Vec<String>,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Unreadable { message } => write!(f, "unreadable: {message}"),
            SkipReason::IdMismatch { embedded } => {
                write!(f, "file name does not match embedded id {embedded}")
            }
            SkipReason::UnresolvedType { type_name } => {
                write!(f, "unresolved payload type {type_name}")
            }
            SkipReason::Undecodable { message } => write!(f, "undecodable payload: {message}"),
            SkipReason::Rejected { reason, messages } => {
                write!(f, "rejected ({reason})")?;
                if !messages.is_empty() {
                    write!(f, ": {}", messages.join("; "))?;
                }
                Ok(())
            }
        }
    }
}

/// A file left out of an import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    /// File path.
    pub path: PathBuf,
    /// Id taken from the file name.
    pub id: DocumentId,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// Result of a sync pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Documents created at or before this instant were out of scope.
    pub watermark: DateTime<Utc>,
    /// Documents written to the directory.
    pub exported: Vec<DocumentId>,
    /// Export files that could not be written.
    pub export_failures: usize,
    /// True if a directory could not be created and the export stopped early.
    pub export_aborted: bool,
    /// Documents folded into the store, in the order they were accepted.
    pub imported: Vec<DocumentId>,
    /// Files that were not imported.
    pub skipped: Vec<SkippedFile>,
    /// Import passes run.
    pub passes: usize,
}

impl SyncReport {
    pub(crate) fn new(watermark: DateTime<Utc>) -> Self {
        Self {
            watermark,
            exported: Vec::new(),
            export_failures: 0,
            export_aborted: false,
            imported: Vec::new(),
            skipped: Vec::new(),
            passes: 0,
        }
    }

    /// Returns true if nothing failed or was skipped.
    pub fn is_clean(&self) -> bool {
        self.export_failures == 0 && !self.export_aborted && self.skipped.is_empty()
    }
}
