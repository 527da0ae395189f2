//! Payload registry: type name to decoder and handler.
//!
//! Registering a payload type records, in one step, how to decode it from a
//! document's JSON and which handler applies it. The gateway dispatches by
//! the payload's type name; the importer decodes by the document's
//! `PayloadTypeName`.

use crate::dto::DtoHeader;
use crate::error::{CoreError, CoreResult};
use crate::payload::{AnyPayload, Payload};
use crate::response::{FailureReason, HandlerResponse};
use crate::store::StoreTransaction;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

type DecodeFn = fn(&str) -> CoreResult<Box<dyn AnyPayload>>;

type DispatchFn = Box<
    dyn Fn(&dyn AnyPayload, &DtoHeader, &mut dyn StoreTransaction) -> CoreResult<HandlerResponse>
        + Send
        + Sync,
>;

struct Registration {
    decode: DecodeFn,
    dispatch: DispatchFn,
}

fn decode_as<P: Payload>(json: &str) -> CoreResult<Box<dyn AnyPayload>> {
    let payload: P = serde_json::from_str(json)?;
    Ok(Box::new(payload))
}

/// Maps payload type names to decoders and handlers.
///
/// ```
/// use doclog_core::{Constrained, HandlerResponse, Payload, PayloadRegistry, Rules};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Serialize, Deserialize)]
/// struct Rename { name: String }
///
/// impl Constrained for Rename {
///     fn constraints(&self, rules: &mut Rules) {
///         rules.required_text("Name", &self.name);
///     }
/// }
///
/// impl Payload for Rename {
///     const TYPE_NAME: &'static str = "demo::Rename";
/// }
///
/// let mut registry = PayloadRegistry::new();
/// registry.register::<Rename, _>(|_payload, _carrier, _txn| Ok(HandlerResponse::success()));
/// assert!(registry.contains("demo::Rename"));
/// ```
#[derive(Default)]
pub struct PayloadRegistry {
    entries: HashMap<&'static str, Registration>,
}

impl PayloadRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `P` with its handler, replacing any earlier registration.
    pub fn register<P, F>(&mut self, handler: F) -> &mut Self
    where
        P: Payload,
        F: Fn(&P, &DtoHeader, &mut dyn StoreTransaction) -> CoreResult<HandlerResponse>
            + Send
            + Sync
            + 'static,
    {
        let dispatch: DispatchFn = Box::new(
            move |payload: &dyn AnyPayload,
                  carrier: &DtoHeader,
                  txn: &mut dyn StoreTransaction| {
                match payload.as_any().downcast_ref::<P>() {
                    Some(typed) => handler(typed, carrier, txn),
                    None => Ok(HandlerResponse::failure(
                        FailureReason::PayloadHandlerNotFound,
                        vec![format!(
                            "payload registered as {} has a different type",
                            P::TYPE_NAME
                        )],
                    )),
                }
            },
        );

        if self
            .entries
            .insert(
                P::TYPE_NAME,
                Registration {
                    decode: decode_as::<P>,
                    dispatch,
                },
            )
            .is_some()
        {
            debug!(type_name = P::TYPE_NAME, "payload handler replaced");
        }
        self
    }

    /// Builder form of [`register`](Self::register).
    #[must_use]
    pub fn with<P, F>(mut self, handler: F) -> Self
    where
        P: Payload,
        F: Fn(&P, &DtoHeader, &mut dyn StoreTransaction) -> CoreResult<HandlerResponse>
            + Send
            + Sync
            + 'static,
    {
        self.register::<P, F>(handler);
        self
    }

    /// Returns true if `type_name` is registered.
    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.entries.contains_key(type_name)
    }

    /// Registered type names, sorted.
    #[must_use]
    pub fn type_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decodes a payload from JSON by its registered type name.
    ///
    /// # Errors
    ///
    /// [`CoreError::UnknownPayloadType`] if the name is not registered, or a
    /// JSON error if the text does not match the type.
    pub fn decode(&self, type_name: &str, json: &str) -> CoreResult<Box<dyn AnyPayload>> {
        let entry = self
            .entries
            .get(type_name)
            .ok_or_else(|| CoreError::unknown_payload_type(type_name))?;
        (entry.decode)(json)
    }

    /// Runs the handler registered for the payload's type.
    ///
    /// Returns `None` if no handler is registered; the transaction is not
    /// touched in that case.
    pub fn dispatch(
        &self,
        payload: &dyn AnyPayload,
        carrier: &DtoHeader,
        txn: &mut dyn StoreTransaction,
    ) -> Option<CoreResult<HandlerResponse>> {
        let entry = self.entries.get(payload.type_name())?;
        Some((entry.dispatch)(payload, carrier, txn))
    }
}

impl fmt::Debug for PayloadRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PayloadRegistry")
            .field("types", &self.type_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DocumentStore, MemoryStore, TransactionExt};
    use crate::validator::{Constrained, Rules};
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Tag {
        key: Uuid,
        label: String,
    }

    impl Constrained for Tag {
        fn constraints(&self, _rules: &mut Rules) {}
    }

    impl Payload for Tag {
        const TYPE_NAME: &'static str = "tests::Tag";
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct Other;

    impl Constrained for Other {
        fn constraints(&self, _rules: &mut Rules) {}
    }

    impl Payload for Other {
        const TYPE_NAME: &'static str = "tests::Other";
    }

    fn registry() -> PayloadRegistry {
        PayloadRegistry::new().with::<Tag, _>(|tag, _carrier, txn| {
            txn.put_json("tags", tag.key, &tag.label)?;
            Ok(HandlerResponse::success())
        })
    }

    #[test]
    fn decode_by_type_name() {
        let registry = registry();
        let key = Uuid::new_v4();
        let json = serde_json::to_string(&Tag {
            key,
            label: "red".into(),
        })
        .unwrap();

        let payload = registry.decode("tests::Tag", &json).unwrap();
        assert_eq!(payload.type_name(), "tests::Tag");
        let tag = payload.as_any().downcast_ref::<Tag>().unwrap();
        assert_eq!(tag.key, key);
    }

    #[test]
    fn decode_unknown_type_fails() {
        let registry = registry();
        let err = registry.decode("tests::Missing", "{}").unwrap_err();
        assert!(matches!(err, CoreError::UnknownPayloadType { .. }));
    }

    #[test]
    fn decode_mismatched_json_fails() {
        let registry = registry();
        let err = registry.decode("tests::Tag", r#"{"nope":1}"#).unwrap_err();
        assert!(matches!(err, CoreError::Json(_)));
    }

    #[test]
    fn dispatch_runs_typed_handler() {
        let registry = registry();
        let store = MemoryStore::new();
        let tag = Tag {
            key: Uuid::new_v4(),
            label: "blue".into(),
        };

        let mut txn = store.begin().unwrap();
        let result = registry
            .dispatch(&tag, &DtoHeader::new(), txn.as_mut())
            .unwrap()
            .unwrap();
        assert!(matches!(
            result,
            HandlerResponse::Success {
                skip_document_creation: false
            }
        ));
        assert_eq!(
            txn.get_json::<String>("tags", tag.key).unwrap().as_deref(),
            Some("blue")
        );
    }

    #[test]
    fn dispatch_unregistered_is_none() {
        let registry = registry();
        let store = MemoryStore::new();
        let mut txn = store.begin().unwrap();
        assert!(registry
            .dispatch(&Other, &DtoHeader::new(), txn.as_mut())
            .is_none());
        assert_eq!(txn.pending_summary(), "0 document(s) [], 0 record put(s), 0 record delete(s)");
    }

    #[test]
    fn type_names_are_sorted() {
        let mut registry = registry();
        registry.register::<Other, _>(|_, _, _| Ok(HandlerResponse::success()));
        assert_eq!(registry.type_names(), vec!["tests::Other", "tests::Tag"]);
        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());
    }
}
