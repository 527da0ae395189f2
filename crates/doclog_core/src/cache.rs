//! In-memory index of known documents.
//!
//! The cache never evicts; it grows with the log for the life of the
//! process. It has no internal locking. The gateway keeps it behind a mutex
//! and updates it after every commit.

use crate::document::DocumentId;
use crate::error::CoreResult;
use crate::notify::VersionUpdated;
use crate::store::DocumentStore;
use crate::time;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap};

/// Summary of a cached document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocInfo {
    /// Document id.
    pub id: DocumentId,
    /// Creation time.
    pub date_created_utc: DateTime<Utc>,
}

/// Document ids by id and by UTC creation day.
#[derive(Debug, Default)]
pub struct DocCache {
    by_id: HashMap<DocumentId, DocInfo>,
    by_day: BTreeMap<NaiveDate, Vec<DocInfo>>,
}

impl DocCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a cache from every committed document of `store`.
    pub fn load(store: &dyn DocumentStore) -> CoreResult<Self> {
        let mut cache = Self::new();
        for doc in store.documents()? {
            cache.add(doc.id, doc.date_created_utc);
        }
        Ok(cache)
    }

    /// Adds a document. Adding a known id is a no-op.
    pub fn add(&mut self, id: DocumentId, date_created_utc: DateTime<Utc>) {
        if self.by_id.contains_key(&id) {
            return;
        }
        let info = DocInfo {
            id,
            date_created_utc,
        };
        self.by_id.insert(id, info);
        self.by_day
            .entry(time::day_of(date_created_utc))
            .or_default()
            .push(info);
    }

    /// Adds the document announced by a version notification.
    pub fn observe(&mut self, event: &VersionUpdated) {
        if let Some(date) = event.ticks.to_datetime() {
            self.add(event.document_id, date);
        }
    }

    /// Returns true if the id is cached.
    #[must_use]
    pub fn contains(&self, id: DocumentId) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Returns true if any cached document was created on `day`.
    #[must_use]
    pub fn has_docs(&self, day: NaiveDate) -> bool {
        self.by_day.get(&day).is_some_and(|docs| !docs.is_empty())
    }

    /// Documents created on `day`, in the order they were added.
    #[must_use]
    pub fn docs_for_day(&self, day: NaiveDate) -> &[DocInfo] {
        self.by_day.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Days with at least one document, ascending, with their counts.
    pub fn days(&self) -> impl Iterator<Item = (NaiveDate, usize)> + '_ {
        self.by_day.iter().map(|(day, docs)| (*day, docs.len()))
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Number of cached documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::Ticks;
    use crate::types::SequenceNumber;
    use chrono::TimeZone;

    #[test]
    fn add_is_idempotent() {
        let mut cache = DocCache::new();
        assert!(cache.is_empty());

        let id = DocumentId::new();
        let date = Utc.with_ymd_and_hms(2024, 2, 29, 10, 0, 0).unwrap();
        cache.add(id, date);
        cache.add(id, date);

        assert_eq!(cache.len(), 1);
        assert!(cache.contains(id));
        assert_eq!(cache.docs_for_day(date.date_naive()).len(), 1);
    }

    #[test]
    fn day_index_ignores_time_of_day() {
        let mut cache = DocCache::new();
        let morning = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 1).unwrap();
        let night = Utc.with_ymd_and_hms(2024, 3, 1, 23, 59, 59).unwrap();
        let next = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();
        cache.add(DocumentId::new(), morning);
        cache.add(DocumentId::new(), night);
        cache.add(DocumentId::new(), next);

        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert!(cache.has_docs(day));
        assert_eq!(cache.docs_for_day(day).len(), 2);
        assert!(!cache.has_docs(NaiveDate::from_ymd_opt(2024, 2, 28).unwrap()));
        assert!(cache.docs_for_day(NaiveDate::from_ymd_opt(2024, 2, 28).unwrap()).is_empty());
        assert_eq!(cache.days().collect::<Vec<_>>().len(), 2);
    }

    #[test]
    fn observe_uses_event_ticks() {
        let mut cache = DocCache::new();
        let date = Utc.with_ymd_and_hms(2022, 7, 4, 12, 30, 0).unwrap();
        let event = VersionUpdated {
            document_id: DocumentId::new(),
            ticks: Ticks::from_datetime(date),
            sequence: SequenceNumber::new(1),
        };
        cache.observe(&event);
        assert!(cache.contains(event.document_id));
        assert!(cache.has_docs(date.date_naive()));
    }
}
