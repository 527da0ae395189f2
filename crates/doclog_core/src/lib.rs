//! # doclog core
//!
//! A document-oriented append log. Clients submit DTOs that are validated,
//! chained to a causal predecessor, applied by a registered handler, and
//! appended as immutable [`Document`]s, all inside one store transaction.
//!
//! ```
//! use doclog_core::{
//!     Constrained, Gateway, GatewayResponse, HandlerResponse, MemoryStore, Payload,
//!     PayloadRegistry, Rules,
//! };
//! use serde::{Deserialize, Serialize};
//! use std::sync::Arc;
//! use uuid::Uuid;
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct Note {
//!     text: String,
//! }
//!
//! impl Constrained for Note {
//!     fn constraints(&self, rules: &mut Rules) {
//!         rules.required_text("Text", &self.text).max_length("Text", &self.text, 140);
//!     }
//! }
//!
//! impl Payload for Note {
//!     const TYPE_NAME: &'static str = "demo::Note";
//! }
//!
//! let registry = PayloadRegistry::new()
//!     .with::<Note, _>(|_note, _carrier, _txn| Ok(HandlerResponse::success()));
//! let gateway = Gateway::builder(Arc::new(MemoryStore::new()))
//!     .registry(registry)
//!     .build()?;
//!
//! let dto = gateway
//!     .create_dto(Note { text: "first".into() })?
//!     .with_user(Uuid::new_v4());
//! assert!(matches!(gateway.push(dto), GatewayResponse::Success { .. }));
//! # Ok::<(), doclog_core::CoreError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod config;
mod document;
mod dto;
mod error;
mod gateway;
mod notify;
mod payload;
mod registry;
mod response;
pub mod store;
pub mod time;
mod types;
mod validator;

pub use cache::{DocCache, DocInfo};
pub use config::{GatewayConfig, StoreConfig};
pub use document::{Document, DocumentId};
pub use dto::{Dto, DtoHeader, ErasedDto};
pub use error::{CoreError, CoreResult};
pub use gateway::{Gateway, GatewayBuilder, WriteGuard};
pub use notify::{VersionFeed, VersionUpdated};
pub use payload::{short_type_name, AnyPayload, Payload};
pub use registry::PayloadRegistry;
pub use response::{FailureReason, GatewayResponse, HandlerResponse};
pub use store::{
    inspect_journal, read_journal_documents, DocumentStore, JournalReport, JournalStore,
    MemoryStore, StoreTransaction, TransactionExt,
};
pub use time::Ticks;
pub use types::SequenceNumber;
pub use validator::{validate, Constrained, Rules};

/// Crate version, for diagnostics.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
