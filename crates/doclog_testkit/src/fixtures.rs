//! Gateway fixtures.
//!
//! Provides gateways over fresh stores with the sample registry installed,
//! plus helpers for building chains.

use crate::payloads::{registry, SamplePayload};
use doclog_core::{
    Dto, DocumentId, Gateway, GatewayConfig, GatewayResponse, JournalStore, MemoryStore, Payload,
    StoreConfig,
};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

/// A test gateway with automatic cleanup.
pub struct TestGateway {
    /// The gateway.
    pub gateway: Arc<Gateway>,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: Option<TempDir>,
}

impl TestGateway {
    /// A gateway over an in-memory store.
    pub fn memory() -> Self {
        Self::memory_with(GatewayConfig::default())
    }

    /// A gateway over an in-memory store with a custom configuration.
    pub fn memory_with(config: GatewayConfig) -> Self {
        let gateway = Gateway::builder(Arc::new(MemoryStore::new()))
            .registry(registry())
            .config(config)
            .build()
            .expect("Failed to build gateway");
        Self {
            gateway: Arc::new(gateway),
            _temp_dir: None,
        }
    }

    /// A gateway over a journal store in a temporary directory.
    pub fn journal() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let gateway = journal_gateway(&temp_dir.path().join("store"));
        Self {
            gateway,
            _temp_dir: Some(temp_dir),
        }
    }

    /// Returns the store directory if journal-backed.
    pub fn path(&self) -> Option<std::path::PathBuf> {
        self._temp_dir.as_ref().map(|d| d.path().join("store"))
    }
}

impl std::ops::Deref for TestGateway {
    type Target = Gateway;

    fn deref(&self) -> &Self::Target {
        &self.gateway
    }
}

/// Opens a journal store at `path` and wraps it in a gateway with the sample
/// registry.
pub fn journal_gateway(path: &Path) -> Arc<Gateway> {
    let store = JournalStore::open(path, StoreConfig::default().sync_on_commit(false))
        .expect("Failed to open journal store");
    let gateway = Gateway::builder(Arc::new(store))
        .registry(registry())
        .build()
        .expect("Failed to build gateway");
    Arc::new(gateway)
}

/// A DTO chained to the gateway's latest document, with an author.
pub fn authored_dto<P: Payload>(gateway: &Gateway, payload: P) -> Dto<P> {
    gateway
        .create_dto(payload)
        .expect("Failed to read latest document")
        .with_user(Uuid::new_v4())
}

/// Pushes `count` chained sample documents and returns their ids.
pub fn push_chain(gateway: &Gateway, count: usize) -> Vec<DocumentId> {
    (0..count)
        .map(|i| {
            let dto = authored_dto(gateway, SamplePayload::valid(i as i32));
            let id = dto.id();
            let response = gateway.push(dto);
            assert!(
                matches!(response, GatewayResponse::Success { .. }),
                "chain push {i} failed: {response:?}"
            );
            id
        })
        .collect()
}
