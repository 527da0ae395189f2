//! Committed store state and commit batches.

use crate::document::{Document, DocumentId};
use crate::types::SequenceNumber;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// Key of a domain record.
pub(crate) type RecordKey = (String, Uuid);

/// A domain record write inside a commit batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) enum RecordWrite {
    /// Insert or replace a record.
    Put {
        collection: String,
        key: Uuid,
        value: Vec<u8>,
    },
    /// Remove a record.
    Delete { collection: String, key: Uuid },
}

/// Everything one transaction commits. Journaled as a single record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct CommitBatch {
    pub sequence: SequenceNumber,
    pub documents: Vec<Document>,
    pub records: Vec<RecordWrite>,
}

/// A pending domain record write.
#[derive(Debug, Clone)]
pub(crate) enum PendingWrite {
    Put { value: Vec<u8> },
    Delete,
}

/// Writes queued by an open transaction.
#[derive(Debug, Default)]
pub(crate) struct Changeset {
    pub documents: Vec<Document>,
    pub records: BTreeMap<RecordKey, PendingWrite>,
}

impl Changeset {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty() && self.records.is_empty()
    }

    pub fn contains_document(&self, id: DocumentId) -> bool {
        self.documents.iter().any(|doc| doc.id == id)
    }

    pub fn into_batch(self, sequence: SequenceNumber) -> CommitBatch {
        let records = self
            .records
            .into_iter()
            .map(|((collection, key), write)| match write {
                PendingWrite::Put { value } => RecordWrite::Put {
                    collection,
                    key,
                    value,
                },
                PendingWrite::Delete => RecordWrite::Delete { collection, key },
            })
            .collect();
        CommitBatch {
            sequence,
            documents: self.documents,
            records,
        }
    }

    pub fn summary(&self) -> String {
        let mut puts = 0usize;
        let mut deletes = 0usize;
        for write in self.records.values() {
            match write {
                PendingWrite::Put { .. } => puts += 1,
                PendingWrite::Delete => deletes += 1,
            }
        }
        let ids: Vec<String> = self.documents.iter().map(|d| d.id.to_string()).collect();
        format!(
            "{} document(s) [{}], {} record put(s), {} record delete(s)",
            self.documents.len(),
            ids.join(", "),
            puts,
            deletes
        )
    }
}

/// Committed documents and records.
#[derive(Debug, Default)]
pub(crate) struct StoreState {
    documents: Vec<Document>,
    index: HashMap<DocumentId, usize>,
    records: HashMap<RecordKey, Vec<u8>>,
    latest: Option<usize>,
    sequence: SequenceNumber,
}

impl StoreState {
    pub fn sequence(&self) -> SequenceNumber {
        self.sequence
    }

    pub fn contains(&self, id: DocumentId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn latest_document(&self) -> Option<&Document> {
        self.latest.and_then(|i| self.documents.get(i))
    }

    pub fn get(&self, id: DocumentId) -> Option<&Document> {
        self.index.get(&id).and_then(|&i| self.documents.get(i))
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn documents_since(&self, after: DateTime<Utc>) -> Vec<DocumentId> {
        self.documents
            .iter()
            .filter(|doc| doc.date_created_utc > after)
            .map(|doc| doc.id)
            .collect()
    }

    pub fn record(&self, collection: &str, key: Uuid) -> Option<&Vec<u8>> {
        self.records.get(&(collection.to_string(), key))
    }

    /// Applies a committed batch. Batches must arrive in sequence order.
    pub fn apply(&mut self, batch: CommitBatch) {
        for document in batch.documents {
            let position = self.documents.len();
            let newer = self
                .latest_document()
                .map_or(true, |latest| document.date_created_utc >= latest.date_created_utc);
            self.index.insert(document.id, position);
            self.documents.push(document);
            if newer {
                self.latest = Some(position);
            }
        }
        for write in batch.records {
            match write {
                RecordWrite::Put {
                    collection,
                    key,
                    value,
                } => {
                    self.records.insert((collection, key), value);
                }
                RecordWrite::Delete { collection, key } => {
                    self.records.remove(&(collection, key));
                }
            }
        }
        if batch.sequence > self.sequence {
            self.sequence = batch.sequence;
        }
    }
}
