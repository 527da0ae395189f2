//! Shared transaction machinery for the store implementations.

use super::state::{Changeset, CommitBatch, PendingWrite, StoreState};
use super::StoreTransaction;
use crate::document::{Document, DocumentId};
use crate::error::{CoreError, CoreResult};
use crate::types::SequenceNumber;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, MutexGuard, RwLock};
use tracing::debug;
use uuid::Uuid;

/// Persists a commit batch before it becomes visible.
pub(crate) trait CommitSink: Send + Sync {
    fn persist(&self, batch: &CommitBatch) -> CoreResult<()>;
}

/// State of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransactionState {
    Active,
    Committed,
    Aborted,
}

/// Committed state plus the single-writer lock.
pub(crate) struct StoreCore {
    state: RwLock<StoreState>,
    write_lock: Mutex<()>,
    sink: Box<dyn CommitSink>,
}

impl StoreCore {
    pub fn new(state: StoreState, sink: Box<dyn CommitSink>) -> Self {
        Self {
            state: RwLock::new(state),
            write_lock: Mutex::new(()),
            sink,
        }
    }

    /// Begins a write transaction, holding the writer lock until it ends.
    pub fn begin(&self) -> WriteTransaction<'_> {
        let guard = self.write_lock.lock();
        WriteTransaction {
            core: self,
            _guard: guard,
            changes: Changeset::default(),
            state: TransactionState::Active,
        }
    }

    pub fn document_exists(&self, id: DocumentId) -> bool {
        self.state.read().contains(id)
    }

    pub fn document_count(&self) -> usize {
        self.state.read().document_count()
    }

    pub fn latest_document_id(&self) -> Option<DocumentId> {
        self.state.read().latest_document().map(|doc| doc.id)
    }

    pub fn documents_since(&self, after: DateTime<Utc>) -> Vec<DocumentId> {
        self.state.read().documents_since(after)
    }

    pub fn get_document(&self, id: DocumentId) -> Option<Document> {
        self.state.read().get(id).cloned()
    }

    pub fn documents(&self) -> Vec<Document> {
        self.state.read().documents().to_vec()
    }

    pub fn get_record(&self, collection: &str, key: Uuid) -> Option<Vec<u8>> {
        self.state.read().record(collection, key).cloned()
    }

    pub fn committed_sequence(&self) -> SequenceNumber {
        self.state.read().sequence()
    }
}

/// A write transaction holding the store's writer lock.
///
/// Dropping it without committing rolls it back.
pub(crate) struct WriteTransaction<'a> {
    core: &'a StoreCore,
    _guard: MutexGuard<'a, ()>,
    changes: Changeset,
    state: TransactionState,
}

impl WriteTransaction<'_> {
    fn ensure_active(&self) -> CoreResult<()> {
        match self.state {
            TransactionState::Active => Ok(()),
            TransactionState::Committed => Err(CoreError::invalid_operation(
                "transaction already committed",
            )),
            TransactionState::Aborted => {
                Err(CoreError::invalid_operation("transaction already aborted"))
            }
        }
    }

    fn commit_inner(&mut self) -> CoreResult<SequenceNumber> {
        self.ensure_active()?;

        let current = self.core.committed_sequence();
        if self.changes.is_empty() {
            self.state = TransactionState::Committed;
            return Ok(current);
        }

        let sequence = current.next();
        let changes = std::mem::take(&mut self.changes);
        let batch = changes.into_batch(sequence);

        // Durable first, then visible.
        self.core.sink.persist(&batch)?;
        self.core.state.write().apply(batch);
        self.state = TransactionState::Committed;

        debug!(%sequence, "transaction committed");
        Ok(sequence)
    }
}

impl StoreTransaction for WriteTransaction<'_> {
    fn document_exists(&self, id: DocumentId) -> CoreResult<bool> {
        Ok(self.changes.contains_document(id) || self.core.document_exists(id))
    }

    fn document_count(&self) -> CoreResult<usize> {
        Ok(self.core.document_count() + self.changes.documents.len())
    }

    fn latest_document_id(&self) -> CoreResult<Option<DocumentId>> {
        let state = self.core.state.read();
        let mut latest = state
            .latest_document()
            .map(|doc| (doc.date_created_utc, doc.id));
        for doc in &self.changes.documents {
            if latest.map_or(true, |(date, _)| doc.date_created_utc >= date) {
                latest = Some((doc.date_created_utc, doc.id));
            }
        }
        Ok(latest.map(|(_, id)| id))
    }

    fn insert_document(&mut self, document: Document) -> CoreResult<()> {
        self.ensure_active()?;
        if self.document_exists(document.id)? {
            return Err(CoreError::DuplicateDocument(document.id));
        }
        self.changes.documents.push(document);
        Ok(())
    }

    fn get_record(&self, collection: &str, key: Uuid) -> CoreResult<Option<Vec<u8>>> {
        match self.changes.records.get(&(collection.to_string(), key)) {
            Some(PendingWrite::Put { value }) => Ok(Some(value.clone())),
            Some(PendingWrite::Delete) => Ok(None),
            None => Ok(self.core.get_record(collection, key)),
        }
    }

    fn put_record(&mut self, collection: &str, key: Uuid, value: Vec<u8>) -> CoreResult<()> {
        self.ensure_active()?;
        self.changes
            .records
            .insert((collection.to_string(), key), PendingWrite::Put { value });
        Ok(())
    }

    fn delete_record(&mut self, collection: &str, key: Uuid) -> CoreResult<()> {
        self.ensure_active()?;
        self.changes
            .records
            .insert((collection.to_string(), key), PendingWrite::Delete);
        Ok(())
    }

    fn pending_summary(&self) -> String {
        self.changes.summary()
    }

    fn commit(mut self: Box<Self>) -> CoreResult<SequenceNumber> {
        self.commit_inner()
    }

    fn rollback(mut self: Box<Self>) {
        self.abort();
    }
}

impl WriteTransaction<'_> {
    fn abort(&mut self) {
        if self.state == TransactionState::Active {
            debug!(pending = %self.changes.summary(), "transaction rolled back");
            self.changes = Changeset::default();
            self.state = TransactionState::Aborted;
        }
    }
}

impl Drop for WriteTransaction<'_> {
    fn drop(&mut self) {
        self.abort();
    }
}

/// A sink that keeps nothing.
pub(crate) struct NoopSink;

impl CommitSink for NoopSink {
    fn persist(&self, _batch: &CommitBatch) -> CoreResult<()> {
        Ok(())
    }
}
