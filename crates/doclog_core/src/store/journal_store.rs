//! Durable store backed by a commit journal.

use super::dir::{journal_path_in, StoreDir};
use super::journal::Journal;
use super::state::StoreState;
use super::transaction::StoreCore;
use super::{DocumentStore, StoreTransaction};
use crate::config::StoreConfig;
use crate::document::{Document, DocumentId};
use crate::error::CoreResult;
use crate::types::SequenceNumber;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

/// A durable store in a locked directory.
///
/// Opening the store replays its journal. Each commit appends one record
/// before the changes become visible, so a crash loses at most the commit in
/// flight.
///
/// ```no_run
/// use doclog_core::{DocumentStore, JournalStore, StoreConfig};
/// use std::path::Path;
///
/// let store = JournalStore::open(Path::new("my_log"), StoreConfig::default())?;
/// println!("{} documents", store.document_count()?);
/// # Ok::<(), doclog_core::CoreError>(())
/// ```
pub struct JournalStore {
    dir: StoreDir,
    journal_path: PathBuf,
    core: StoreCore,
}

impl JournalStore {
    /// Opens or creates a store.
    ///
    /// # Errors
    ///
    /// - The directory is missing and `create_if_missing` is false
    /// - Another process has the store open
    /// - The journal holds a damaged record
    pub fn open(path: &Path, config: StoreConfig) -> CoreResult<Self> {
        let dir = StoreDir::open(path, config.create_if_missing)?;
        let journal_path = dir.journal_path();
        let (journal, batches) = Journal::open(&journal_path, config.sync_on_commit)?;

        let mut state = StoreState::default();
        for batch in batches {
            state.apply(batch);
        }

        info!(
            path = %dir.path().display(),
            documents = state.document_count(),
            sequence = %state.sequence(),
            "store opened"
        );

        Ok(Self {
            journal_path: journal.path().to_path_buf(),
            dir,
            core: StoreCore::new(state, Box::new(journal)),
        })
    }

    /// The store directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// The journal file.
    #[must_use]
    pub fn journal_path(&self) -> &Path {
        &self.journal_path
    }

    /// Where the journal of the store at `path` lives, without opening it.
    #[must_use]
    pub fn journal_path_for(path: &Path) -> PathBuf {
        journal_path_in(path)
    }
}

impl DocumentStore for JournalStore {
    fn begin(&self) -> CoreResult<Box<dyn StoreTransaction + '_>> {
        Ok(Box::new(self.core.begin()))
    }

    fn document_exists(&self, id: DocumentId) -> CoreResult<bool> {
        Ok(self.core.document_exists(id))
    }

    fn document_count(&self) -> CoreResult<usize> {
        Ok(self.core.document_count())
    }

    fn latest_document_id(&self) -> CoreResult<Option<DocumentId>> {
        Ok(self.core.latest_document_id())
    }

    fn documents_since(&self, after: DateTime<Utc>) -> CoreResult<Vec<DocumentId>> {
        Ok(self.core.documents_since(after))
    }

    fn get_document(&self, id: DocumentId) -> CoreResult<Option<Document>> {
        Ok(self.core.get_document(id))
    }

    fn documents(&self) -> CoreResult<Vec<Document>> {
        Ok(self.core.documents())
    }

    fn get_record(&self, collection: &str, key: Uuid) -> CoreResult<Option<Vec<u8>>> {
        Ok(self.core.get_record(collection, key))
    }

    fn committed_sequence(&self) -> SequenceNumber {
        self.core.committed_sequence()
    }
}
