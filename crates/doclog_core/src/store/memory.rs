//! In-memory store.

use super::state::StoreState;
use super::transaction::{NoopSink, StoreCore};
use super::{DocumentStore, StoreTransaction};
use crate::document::{Document, DocumentId};
use crate::error::CoreResult;
use crate::types::SequenceNumber;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A store that lives only as long as the process.
///
/// Transactions behave exactly as with [`JournalStore`](super::JournalStore),
/// minus durability.
pub struct MemoryStore {
    core: StoreCore,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            core: StoreCore::new(StoreState::default(), Box::new(NoopSink)),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for MemoryStore {
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
