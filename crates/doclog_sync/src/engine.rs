//! The sync pass.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::export::export_documents;
use crate::import::import_files;
use crate::plan::SyncPlan;
use crate::report::SyncReport;
use crate::scan::scan_directory;
use doclog_core::{DocumentStore, Gateway};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Reconciles a gateway's store with a directory of document files.
///
/// A pass holds the gateway's write lock from planning to the last import,
/// so pushes from other threads wait for it.
#[derive(Debug, Clone)]
pub struct FileSync {
    gateway: Arc<Gateway>,
    config: SyncConfig,
}

impl FileSync {
    /// Creates a sync engine with the default configuration.
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self::with_config(gateway, SyncConfig::default())
    }

    /// Creates a sync engine with a custom configuration.
    pub fn with_config(gateway: Arc<Gateway>, config: SyncConfig) -> Self {
        Self { gateway, config }
    }

    /// The gateway.
    pub fn gateway(&self) -> &Arc<Gateway> {
        &self.gateway
    }

    /// The configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Exports missing documents to `root` and imports files the store lacks.
    ///
    /// # Errors
    ///
    /// Fails only if the directory cannot be scanned or the store cannot be
    /// read while planning. Per-file problems are recorded in the report.
    pub fn sync_documents(&self, root: &Path) -> SyncResult<SyncReport> {
        let guard = self.gateway.lock();

        let scan = scan_directory(root)?;
        let plan = SyncPlan::compute(self.gateway.store().as_ref(), scan, &self.config)?;
        info!(
            root = %root.display(),
            watermark = %plan.watermark,
            to_export = plan.to_export.len(),
            to_import = plan.to_import.len(),
            "sync planned"
        );

        let mut report = SyncReport::new(plan.watermark);
        export_documents(
            self.gateway.store().as_ref(),
            root,
            &plan.to_export,
            &self.config,
            &mut report,
        );
        info!(
            exported = report.exported.len(),
            failures = report.export_failures,
            aborted = report.export_aborted,
            "export finished"
        );

        import_files(
            &self.gateway,
            &guard,
            plan.to_import,
            &self.config,
            &mut report,
        );
        info!(
            imported = report.imported.len(),
            skipped = report.skipped.len(),
            passes = report.passes,
            "import finished"
        );

        Ok(report)
    }

    /// Runs [`sync_documents`](Self::sync_documents) on the blocking thread
    /// pool.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn sync_documents_async(&self, root: impl Into<PathBuf>) -> SyncResult<SyncReport> {
        let sync = self.clone();
        let root = root.into();
        tokio::task::spawn_blocking(move || sync.sync_documents(&root))
            .await
            .map_err(|e| SyncError::task_failed(e.to_string()))?
    }
}

/// Exports a store to `root` without importing anything.
///
/// Honors archive markers and skips documents that already have a file. No
/// payload registry is needed.
///
/// # Errors
///
/// Fails if the directory cannot be scanned or the store cannot be read.
pub fn export_store(
    store: &dyn DocumentStore,
    root: &Path,
    config: &SyncConfig,
) -> SyncResult<SyncReport> {
    let scan = scan_directory(root)?;
    let plan = SyncPlan::compute(store, scan, config)?;
    let mut report = SyncReport::new(plan.watermark);
    export_documents(store, root, &plan.to_export, config, &mut report);
    info!(
        root = %root.display(),
        exported = report.exported.len(),
        failures = report.export_failures,
        "export finished"
    );
    Ok(report)
}
