//! # doclog sync
//!
//! File-based reconciliation between a doclog store and a directory.
//!
//! A sync pass:
//! 1. Scans the directory for archive markers (`YYYYMMDD.zip` / `.7z`) and
//!    document files
//! 2. Derives the watermark from the latest marker
//! 3. Exports store documents created after the watermark that have no file
//! 4. Imports files whose document the store lacks, through the gateway
//!
//! Two stores syncing through the same directory converge on the same
//! document set.
//!
//! ```no_run
//! use doclog_core::{Gateway, JournalStore, PayloadRegistry, StoreConfig};
//! use doclog_sync::FileSync;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let store = JournalStore::open(Path::new("my_log"), StoreConfig::default())?;
//! let gateway = Gateway::builder(Arc::new(store))
//!     .registry(PayloadRegistry::new())
//!     .build()?;
//!
//! let report = FileSync::new(Arc::new(gateway)).sync_documents(Path::new("shared"))?;
//! println!("{} out, {} in", report.exported.len(), report.imported.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod engine;
mod error;
mod export;
mod import;
pub mod naming;
mod plan;
mod report;
mod scan;

pub use config::SyncConfig;
pub use engine::{export_store, FileSync};
pub use error::{SyncError, SyncResult};
pub use plan::SyncPlan;
pub use report::{SkipReason, SkippedFile, SyncReport};
pub use scan::{scan_directory, DirectoryScan, ExportedFile};
