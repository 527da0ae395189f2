//! CLI command implementations.

pub mod dump;
pub mod export;
pub mod inspect;
pub mod verify;

use doclog_core::{JournalStore, StoreConfig};
use std::path::Path;

/// Opens an existing store without creating it.
pub fn open_store(path: &Path) -> Result<JournalStore, Box<dyn std::error::Error>> {
    let config = StoreConfig::default()
        .create_if_missing(false)
        .sync_on_commit(false);
    Ok(JournalStore::open(path, config)?)
}
