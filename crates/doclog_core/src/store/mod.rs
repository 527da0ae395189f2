//! Transactional document stores.
//!
//! A store holds the append log (documents in commit order) and the domain
//! records that handlers write alongside it. Writes go through a
//! [`StoreTransaction`]; only one can be open per store at a time, and
//! dropping it without committing rolls it back.
//!
//! Two implementations are provided:
//!
//! - [`MemoryStore`]: process-local, for tests and ephemeral use
//! - [`JournalStore`]: durable, one framed commit record per transaction
//!
//! ```
//! use doclog_core::{DocumentStore, MemoryStore, TransactionExt};
//! use uuid::Uuid;
//!
//! let store = MemoryStore::new();
//! let key = Uuid::new_v4();
//!
//! let mut txn = store.begin().unwrap();
//! txn.put_json("users", key, &"alice").unwrap();
//! txn.commit().unwrap();
//!
//! assert!(store.get_record("users", key).unwrap().is_some());
//! ```

mod dir;
mod journal;
mod journal_store;
mod memory;
mod state;
mod transaction;

pub use journal::{
    inspect_journal, read_journal_documents, JournalReport, JOURNAL_MAGIC, JOURNAL_VERSION,
};
pub use journal_store::JournalStore;
pub use memory::MemoryStore;

use crate::document::{Document, DocumentId};
use crate::error::CoreResult;
use crate::types::SequenceNumber;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

/// Read access to committed state, and the entry point for writes.
pub trait DocumentStore: Send + Sync {
    /// Begins a write transaction. Blocks while another one is open.
    fn begin(&self) -> CoreResult<Box<dyn StoreTransaction + '_>>;

    /// Returns true if a document with this id is committed.
    fn document_exists(&self, id: DocumentId) -> CoreResult<bool>;

    /// Number of committed documents.
    fn document_count(&self) -> CoreResult<usize>;

    /// The committed document with the greatest creation time.
    ///
    /// Ties go to the later commit.
    fn latest_document_id(&self) -> CoreResult<Option<DocumentId>>;

    /// Ids of documents created strictly after `after`, in commit order.
    fn documents_since(&self, after: DateTime<Utc>) -> CoreResult<Vec<DocumentId>>;

    /// Fetches a committed document.
    fn get_document(&self, id: DocumentId) -> CoreResult<Option<Document>>;

    /// All committed documents, in commit order.
    fn documents(&self) -> CoreResult<Vec<Document>>;

    /// Fetches a committed domain record.
    fn get_record(&self, collection: &str, key: Uuid) -> CoreResult<Option<Vec<u8>>>;

    /// Sequence number of the last commit.
    fn committed_sequence(&self) -> SequenceNumber;
}

/// An open write transaction.
///
/// Reads observe committed state plus this transaction's own pending writes.
pub trait StoreTransaction {
    /// Returns true if the document is committed or pending in this transaction.
    fn document_exists(&self, id: DocumentId) -> CoreResult<bool>;

    /// Committed plus pending document count.
    fn document_count(&self) -> CoreResult<usize>;

    /// Latest document id, including pending documents.
    fn latest_document_id(&self) -> CoreResult<Option<DocumentId>>;

    /// Queues a document for append.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateDocument`](crate::CoreError::DuplicateDocument)
    /// if the id is already committed or pending.
    fn insert_document(&mut self, document: Document) -> CoreResult<()>;

    /// Reads a domain record, including pending writes.
    fn get_record(&self, collection: &str, key: Uuid) -> CoreResult<Option<Vec<u8>>>;

    /// Queues a domain record write.
    fn put_record(&mut self, collection: &str, key: Uuid, value: Vec<u8>) -> CoreResult<()>;

    /// Queues a domain record delete.
    fn delete_record(&mut self, collection: &str, key: Uuid) -> CoreResult<()>;

    /// One-line description of the pending writes, for diagnostics.
    fn pending_summary(&self) -> String;

    /// Commits all pending writes atomically.
    fn commit(self: Box<Self>) -> CoreResult<SequenceNumber>;

    /// Discards all pending writes.
    fn rollback(self: Box<Self>);
}

/// JSON helpers for domain records.
pub trait TransactionExt {
    /// Serializes `value` as JSON and queues it.
    fn put_json<T: Serialize + ?Sized>(
        &mut self,
        collection: &str,
        key: Uuid,
        value: &T,
    ) -> CoreResult<()>;

    /// Reads and decodes a JSON record.
    fn get_json<T: DeserializeOwned>(&self, collection: &str, key: Uuid) -> CoreResult<Option<T>>;
}

impl<S: StoreTransaction + ?Sized> TransactionExt for S {
    fn put_json<T: Serialize + ?Sized>(
        &mut self,
        collection: &str,
        key: Uuid,
        value: &T,
    ) -> CoreResult<()> {
        let bytes = serde_json::to_vec(value)?;
        self.put_record(collection, key, bytes)
    }

    fn get_json<T: DeserializeOwned>(&self, collection: &str, key: Uuid) -> CoreResult<Option<T>> {
        match self.get_record(collection, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}
