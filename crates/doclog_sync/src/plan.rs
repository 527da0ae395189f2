//! Export and import diffs.

use crate::config::SyncConfig;
use crate::error::SyncResult;
use crate::scan::{DirectoryScan, ExportedFile};
use chrono::{DateTime, Utc};
use doclog_core::time::Ticks;
use doclog_core::{DocumentId, DocumentStore};
use std::collections::HashSet;

/// What a sync pass will move in each direction.
#[derive(Debug, Clone)]
pub struct SyncPlan {
    /// Cutoff derived from archive markers.
    pub watermark: DateTime<Utc>,
    /// Store documents without a file, in commit order.
    pub to_export: Vec<DocumentId>,
    /// Files whose document the store lacks.
    pub to_import: Vec<ExportedFile>,
}

impl SyncPlan {
    /// Diffs the store against a directory scan.
    ///
    /// Only documents and files created after the watermark take part. With
    /// `sort_imports`, imports are ordered by creation ticks, then id.
    pub fn compute(
        store: &dyn DocumentStore,
        scan: DirectoryScan,
        config: &SyncConfig,
    ) -> SyncResult<Self> {
        let watermark = scan.watermark();
        let cutoff = Ticks::from_datetime(watermark);

        let known = store.documents_since(watermark)?;
        let exported = scan.exported_ids();
        let to_export = known
            .iter()
            .copied()
            .filter(|id| !exported.contains(id))
            .collect();

        let known: HashSet<DocumentId> = known.into_iter().collect();
        let mut to_import: Vec<ExportedFile> = scan
            .files
            .into_iter()
            .filter(|f| f.ticks > cutoff && !known.contains(&f.id))
            .collect();
        if config.sort_imports {
            to_import.sort_by_key(|f| (f.ticks, f.id));
        }

        Ok(Self {
            watermark,
            to_export,
            to_import,
        })
    }

    /// Returns true if there is nothing to move.
    pub fn is_empty(&self) -> bool {
        self.to_export.is_empty() && self.to_import.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use doclog_core::{Document, MemoryStore};
    use std::path::PathBuf;
    use uuid::Uuid;

    fn insert(store: &MemoryStore, created: DateTime<Utc>) -> DocumentId {
        let id = DocumentId::new();
        let mut txn = store.begin().unwrap();
        txn.insert_document(Document {
            id,
            required_document_id: None,
            user_id: Some(Uuid::new_v4()),
            date_created_utc: created,
            payload_type_name: "tests::Note".into(),
            payload_json: "{}".into(),
            description: None,
        })
        .unwrap();
        txn.commit().unwrap();
        id
    }

    fn file(id: DocumentId, created: DateTime<Utc>) -> ExportedFile {
        ExportedFile {
            path: PathBuf::from(format!("{id}.json")),
            ticks: Ticks::from_datetime(created),
            id,
        }
    }

    #[test]
    fn diffs_both_directions() {
        let store = MemoryStore::new();
        let day = |d| Utc.with_ymd_and_hms(2024, 3, d, 12, 0, 0).unwrap();
        let local_only = insert(&store, day(1));
        let both = insert(&store, day(2));

        let remote_late = DocumentId::new();
        let remote_early = DocumentId::new();
        let scan = DirectoryScan {
            archived_days: Vec::new(),
            files: vec![
                file(remote_late, day(5)),
                file(both, day(2)),
                file(remote_early, day(3)),
            ],
        };

        let plan = SyncPlan::compute(&store, scan, &SyncConfig::default()).unwrap();
        assert_eq!(plan.to_export, vec![local_only]);
        let imports: Vec<_> = plan.to_import.iter().map(|f| f.id).collect();
        assert_eq!(imports, vec![remote_early, remote_late]);
    }

    #[test]
    fn unsorted_imports_keep_scan_order() {
        let store = MemoryStore::new();
        let day = |d| Utc.with_ymd_and_hms(2024, 3, d, 12, 0, 0).unwrap();
        let (late, early) = (DocumentId::new(), DocumentId::new());
        let scan = DirectoryScan {
            archived_days: Vec::new(),
            files: vec![file(late, day(5)), file(early, day(3))],
        };

        let config = SyncConfig::default().with_sort_imports(false);
        let plan = SyncPlan::compute(&store, scan, &config).unwrap();
        let imports: Vec<_> = plan.to_import.iter().map(|f| f.id).collect();
        assert_eq!(imports, vec![late, early]);
    }

    #[test]
    fn archived_days_are_out_of_scope() {
        let store = MemoryStore::new();
        let archived = insert(&store, Utc.with_ymd_and_hms(2024, 1, 31, 23, 0, 0).unwrap());
        let fresh = insert(&store, Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 1).unwrap());
        let old_file = DocumentId::new();

        let scan = DirectoryScan {
            archived_days: vec![NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()],
            files: vec![file(
                old_file,
                Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap(),
            )],
        };

        let plan = SyncPlan::compute(&store, scan, &SyncConfig::default()).unwrap();
        assert_eq!(plan.to_export, vec![fresh]);
        assert!(!plan.to_export.contains(&archived));
        assert!(plan.to_import.is_empty());
    }
}
