//! The push pipeline.
//!
//! [`Gateway::push`] is the only way documents enter a store:
//!
//! 1. Validate the DTO (no store access)
//! 2. Take the gateway's write lock and open a store transaction
//! 3. Reject duplicate ids
//! 4. Check the predecessor chain
//! 5. Dispatch the payload to its registered handler
//! 6. Append the document, commit, and notify observers
//!
//! Every rejection after step 2 rolls the transaction back, so a failed push
//! leaves neither a document nor any handler side effect behind.

use crate::cache::DocCache;
use crate::config::GatewayConfig;
use crate::document::{Document, DocumentId};
use crate::dto::{Dto, DtoHeader, ErasedDto};
use crate::error::{CoreError, CoreResult};
use crate::notify::{VersionFeed, VersionUpdated};
use crate::payload::Payload;
use crate::registry::PayloadRegistry;
use crate::response::{FailureReason, GatewayResponse, HandlerResponse};
use crate::store::{DocumentStore, StoreTransaction};
use crate::types::SequenceNumber;
use crate::validator;
use parking_lot::{Mutex, MutexGuard};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use tracing::{debug, error};

/// Proof that the caller holds a gateway's write lock.
///
/// Obtained from [`Gateway::lock`]. Other pushes and syncs on the same gateway
/// block until it is dropped.
pub struct WriteGuard<'a> {
    owner: &'a Gateway,
    _guard: MutexGuard<'a, ()>,
}

impl fmt::Debug for WriteGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteGuard").finish_non_exhaustive()
    }
}

/// What the checks and handler decided, before commit.
enum Step {
    Commit(Option<Document>),
    Reject(GatewayResponse),
}

/// Validates, chains and appends documents to a store.
///
/// A gateway owns its write lock, so independent gateways (and stores) do
/// not contend with each other.
pub struct Gateway {
    store: Arc<dyn DocumentStore>,
    registry: PayloadRegistry,
    config: GatewayConfig,
    feed: VersionFeed,
    cache: Option<Mutex<DocCache>>,
    write_lock: Mutex<()>,
}

impl Gateway {
    /// Starts building a gateway over `store`.
    pub fn builder(store: Arc<dyn DocumentStore>) -> GatewayBuilder {
        GatewayBuilder {
            store,
            registry: PayloadRegistry::new(),
            config: GatewayConfig::default(),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// The payload registry.
    pub fn registry(&self) -> &PayloadRegistry {
        &self.registry
    }

    /// The configuration.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Subscribes to version notifications.
    pub fn subscribe(&self) -> Receiver<VersionUpdated> {
        self.feed.subscribe()
    }

    /// Notifications after `cursor`, from the bounded history.
    pub fn poll_versions(&self, cursor: SequenceNumber, limit: usize) -> Vec<VersionUpdated> {
        self.feed.poll(cursor, limit)
    }

    /// Runs `f` against the document cache, if caching is enabled.
    pub fn with_cache<R>(&self, f: impl FnOnce(&DocCache) -> R) -> Option<R> {
        self.cache.as_ref().map(|cache| f(&cache.lock()))
    }

    /// Wraps `payload` in a DTO chained to the store's latest document.
    ///
    /// The predecessor is left unset when the store is empty.
    pub fn create_dto<P: Payload>(&self, payload: P) -> CoreResult<Dto<P>> {
        let latest = self.store.latest_document_id()?;
        Ok(Dto::new(payload).with_required_document(latest))
    }

    /// Takes the write lock.
    ///
    /// Use with [`push_locked`](Self::push_locked) to apply several DTOs
    /// without other writers interleaving.
    pub fn lock(&self) -> WriteGuard<'_> {
        WriteGuard {
            owner: self,
            _guard: self.write_lock.lock(),
        }
    }

    /// Pushes a typed DTO.
    pub fn push<P: Payload>(&self, dto: Dto<P>) -> GatewayResponse {
        self.push_erased(dto.erase())
    }

    /// Pushes an erased DTO.
    pub fn push_erased(&self, dto: ErasedDto) -> GatewayResponse {
        if let Some(rejected) = self.validate(&dto) {
            return rejected;
        }
        let _guard = self.write_lock.lock();
        self.apply(&dto)
    }

    /// Pushes while the caller already holds the write lock.
    pub fn push_locked(&self, guard: &WriteGuard<'_>, dto: ErasedDto) -> GatewayResponse {
        if !std::ptr::eq(guard.owner, self) {
            return GatewayResponse::failure(
                FailureReason::DatabaseError,
                vec!["write guard belongs to a different gateway".to_string()],
            );
        }
        if let Some(rejected) = self.validate(&dto) {
            return rejected;
        }
        self.apply(&dto)
    }

    /// Runs [`push`](Self::push) on the blocking thread pool.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn push_async<P: Payload>(self: &Arc<Self>, dto: Dto<P>) -> GatewayResponse {
        let gateway = Arc::clone(self);
        let dto = dto.erase();
        match tokio::task::spawn_blocking(move || gateway.push_erased(dto)).await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "push task failed");
                GatewayResponse::failure(
                    FailureReason::DatabaseError,
                    vec![format!("push task failed: {e}")],
                )
            }
        }
    }

    fn validate(&self, dto: &ErasedDto) -> Option<GatewayResponse> {
        let messages = validator::validate(
            dto.header(),
            dto.payload().as_ref(),
            self.config.allow_missing_user_id,
        );
        if messages.is_empty() {
            return None;
        }
        debug!(
            document_id = %dto.id(),
            violations = messages.len(),
            "push rejected by validation"
        );
        Some(GatewayResponse::failure(
            FailureReason::ValidationFailed,
            messages,
        ))
    }

    /// Runs the transactional part of a push. The write lock must be held.
    fn apply(&self, dto: &ErasedDto) -> GatewayResponse {
        let mut txn = match self.store.begin() {
            Ok(txn) => txn,
            Err(e) => {
                error!(document_id = %dto.id(), error = %e, "could not begin transaction");
                return GatewayResponse::failure(FailureReason::DatabaseError, vec![e.to_string()]);
            }
        };

        match self.decide(dto, txn.as_mut()) {
            Ok(Step::Reject(response)) => {
                txn.rollback();
                debug!(
                    document_id = %dto.id(),
                    reason = ?response.reason(),
                    "push rejected"
                );
                response
            }
            Ok(Step::Commit(document)) => self.commit(txn, dto.header(), document),
            Err(e) => {
                let mut messages = vec![e.to_string()];
                if cfg!(debug_assertions) {
                    messages.push(format!("pending changes: {}", txn.pending_summary()));
                }
                txn.rollback();
                error!(document_id = %dto.id(), error = %e, "push rolled back");
                GatewayResponse::failure(FailureReason::DatabaseError, messages)
            }
        }
    }

    fn decide(&self, dto: &ErasedDto, txn: &mut dyn StoreTransaction) -> CoreResult<Step> {
        let header = dto.header();

        if self.is_known(txn, header.id)? {
            return Ok(Step::Reject(GatewayResponse::failure(
                FailureReason::DocumentExists,
                vec![format!("document {} already exists", header.id)],
            )));
        }

        match header.required_document_id {
            Some(required) => {
                if !self.is_known(txn, required)? {
                    return Ok(Step::Reject(GatewayResponse::failure(
                        FailureReason::RequiredDocumentNotExists,
                        vec![format!("required document {required} does not exist")],
                    )));
                }
            }
            None => {
                if txn.document_count()? > 0 {
                    return Ok(Step::Reject(GatewayResponse::failure(
                        FailureReason::RequiredDocumentNotSpecified,
                        vec!["a required document must be specified on a non-empty store"
                            .to_string()],
                    )));
                }
            }
        }

        let payload = dto.payload().as_ref();
        let dispatched = panic::catch_unwind(AssertUnwindSafe(|| {
            self.registry.dispatch(payload, header, &mut *txn)
        }))
        .map_err(|cause| CoreError::handler(panic_message(cause.as_ref())))?;

        let outcome = match dispatched {
            Some(result) => result?,
            None => {
                return Ok(Step::Reject(GatewayResponse::failure(
                    FailureReason::PayloadHandlerNotFound,
                    vec![format!(
                        "no handler registered for payload type {}",
                        payload.type_name()
                    )],
                )));
            }
        };

        match outcome {
            HandlerResponse::Success {
                skip_document_creation: true,
            } => Ok(Step::Commit(None)),
            HandlerResponse::Success {
                skip_document_creation: false,
            } => {
                let document = dto.to_document()?;
                txn.insert_document(document.clone())?;
                Ok(Step::Commit(Some(document)))
            }
            HandlerResponse::Failure { reason, messages } => {
                Ok(Step::Reject(GatewayResponse::failure(reason, messages)))
            }
            HandlerResponse::Other(_) => Ok(Step::Reject(GatewayResponse::failure(
                FailureReason::UnknownResultType,
                vec![format!(
                    "handler for {} returned an unrecognized result",
                    payload.type_name()
                )],
            ))),
        }
    }

    fn commit(
        &self,
        txn: Box<dyn StoreTransaction + '_>,
        header: &DtoHeader,
        document: Option<Document>,
    ) -> GatewayResponse {
        let sequence = match txn.commit() {
            Ok(sequence) => sequence,
            Err(e) => {
                error!(document_id = %header.id, error = %e, "commit failed");
                return GatewayResponse::failure(FailureReason::DatabaseError, vec![e.to_string()]);
            }
        };

        let Some(document) = document else {
            debug!(document_id = %header.id, %sequence, "handler applied without document");
            return GatewayResponse::Success {
                applied: header.clone(),
                document_created: false,
            };
        };

        let event = VersionUpdated {
            document_id: document.id,
            ticks: document.ticks(),
            sequence,
        };
        if let Some(cache) = &self.cache {
            cache.lock().observe(&event);
        }
        self.feed.emit(event);

        debug!(document_id = %document.id, %sequence, "document appended");
        GatewayResponse::Success {
            applied: header.clone(),
            document_created: true,
        }
    }

    fn is_known(&self, txn: &dyn StoreTransaction, id: DocumentId) -> CoreResult<bool> {
        if let Some(cache) = &self.cache {
            if cache.lock().contains(id) {
                return Ok(true);
            }
        }
        txn.document_exists(id)
    }
}

impl fmt::Debug for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateway")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn panic_message(cause: &(dyn Any + Send)) -> String {
    if let Some(text) = cause.downcast_ref::<&str>() {
        format!("handler panicked: {text}")
    } else if let Some(text) = cause.downcast_ref::<String>() {
        format!("handler panicked: {text}")
    } else {
        "handler panicked".to_string()
    }
}

/// Builder for [`Gateway`].
pub struct GatewayBuilder {
    store: Arc<dyn DocumentStore>,
    registry: PayloadRegistry,
    config: GatewayConfig,
}

impl GatewayBuilder {
    /// Sets the payload registry.
    #[must_use]
    pub fn registry(mut self, registry: PayloadRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: GatewayConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the gateway, loading the cache if enabled.
    pub fn build(self) -> CoreResult<Gateway> {
        let cache = if self.config.use_cache {
            Some(Mutex::new(DocCache::load(self.store.as_ref())?))
        } else {
            None
        };
        Ok(Gateway {
            feed: VersionFeed::with_max_history(self.config.notification_history),
            store: self.store,
            registry: self.registry,
            config: self.config,
            cache,
            write_lock: Mutex::new(()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::validator::{Constrained, Rules};
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Debug, Serialize, Deserialize)]
    struct Noop;

    impl Constrained for Noop {
        fn constraints(&self, _rules: &mut Rules) {}
    }

    impl Payload for Noop {
        const TYPE_NAME: &'static str = "tests::Noop";
    }

    fn gateway() -> Gateway {
        let registry =
            PayloadRegistry::new().with::<Noop, _>(|_, _, _| Ok(HandlerResponse::success()));
        Gateway::builder(Arc::new(MemoryStore::new()))
            .registry(registry)
            .build()
            .unwrap()
    }

    #[test]
    fn create_dto_chains_to_latest() {
        let gateway = gateway();
        let first = gateway.create_dto(Noop).unwrap().with_user(Uuid::new_v4());
        assert!(first.header().required_document_id.is_none());
        let first_id = first.id();
        assert!(gateway.push(first).is_success());

        let second = gateway.create_dto(Noop).unwrap();
        assert_eq!(second.header().required_document_id, Some(first_id));
    }

    #[test]
    fn guard_from_other_gateway_is_refused() {
        let a = gateway();
        let b = gateway();
        let guard = b.lock();
        let dto = Dto::new(Noop).with_user(Uuid::new_v4()).erase();
        let response = a.push_locked(&guard, dto);
        assert_eq!(response.reason(), Some(FailureReason::DatabaseError));
    }

    #[test]
    fn panic_message_extracts_text() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "handler panicked: boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "handler panicked: bang");
        let boxed: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(boxed.as_ref()), "handler panicked");
    }
}
