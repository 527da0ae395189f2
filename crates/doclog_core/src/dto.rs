//! DTOs: client-side envelopes that become documents once accepted.

use crate::document::{Document, DocumentId};
use crate::error::CoreResult;
use crate::payload::{AnyPayload, Payload};
use crate::time::{self, Ticks};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// The document fields of a DTO, without the payload.
///
/// Payload checks and handlers receive the header as the payload's carrier:
/// a read-only view of the DTO the payload is attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DtoHeader {
    /// Unique identity.
    pub id: DocumentId,
    /// Causal predecessor.
    pub required_document_id: Option<DocumentId>,
    /// Author, if known.
    pub user_id: Option<Uuid>,
    /// Creation time.
    pub date_created_utc: DateTime<Utc>,
    /// Free text.
    pub description: Option<String>,
}

impl DtoHeader {
    /// Creates a header with a fresh id and the current time.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: DocumentId::new(),
            required_document_id: None,
            user_id: None,
            date_created_utc: time::now_utc(),
            description: None,
        }
    }

    /// Creates a header with every field unset.
    #[must_use]
    pub fn unset() -> Self {
        Self {
            id: DocumentId::nil(),
            required_document_id: None,
            user_id: None,
            date_created_utc: time::unset_timestamp(),
            description: None,
        }
    }

    /// Creation time as a tick count.
    #[must_use]
    pub fn ticks(&self) -> Ticks {
        Ticks::from_datetime(self.date_created_utc)
    }

    /// Copies the header fields of a stored document.
    #[must_use]
    pub fn from_document(document: &Document) -> Self {
        Self {
            id: document.id,
            required_document_id: document.required_document_id,
            user_id: document.user_id,
            date_created_utc: document.date_created_utc,
            description: document.description.clone(),
        }
    }
}

impl Default for DtoHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// A DTO carrying a typed payload.
///
/// The payload is attached once, at construction, and cannot be swapped.
#[derive(Debug, Clone)]
pub struct Dto<P> {
    header: DtoHeader,
    payload: P,
}

/// A DTO whose payload type has been erased.
pub type ErasedDto = Dto<Box<dyn AnyPayload>>;

impl<P> Dto<P> {
    /// Wraps a payload with a fresh id and the current time.
    pub fn new(payload: P) -> Self {
        Self::from_parts(DtoHeader::new(), payload)
    }

    /// Builds a DTO from an existing header.
    pub fn from_parts(header: DtoHeader, payload: P) -> Self {
        Self { header, payload }
    }

    /// Sets the predecessor.
    #[must_use]
    pub fn with_required_document(mut self, id: Option<DocumentId>) -> Self {
        self.header.required_document_id = id;
        self
    }

    /// Sets the author.
    #[must_use]
    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.header.user_id = Some(user_id);
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.header.description = Some(description.into());
        self
    }

    /// Overrides the id.
    #[must_use]
    pub fn with_id(mut self, id: DocumentId) -> Self {
        self.header.id = id;
        self
    }

    /// Overrides the creation time. Precision below 100 ns is dropped.
    #[must_use]
    pub fn with_date_created(mut self, value: DateTime<Utc>) -> Self {
        self.header.date_created_utc = time::truncate_to_ticks(value);
        self
    }

    /// The header.
    pub fn header(&self) -> &DtoHeader {
        &self.header
    }

    /// The payload.
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// The id.
    pub fn id(&self) -> DocumentId {
        self.header.id
    }
}

impl<P: Payload> Dto<P> {
    /// Erases the payload type.
    pub fn erase(self) -> ErasedDto {
        Dto {
            header: self.header,
            payload: Box::new(self.payload),
        }
    }
}

impl ErasedDto {
    /// The payload's registered type name.
    pub fn type_name(&self) -> &'static str {
        self.payload.type_name()
    }

    /// Builds the document row for this DTO.
    pub fn to_document(&self) -> CoreResult<Document> {
        Ok(Document {
            id: self.header.id,
            required_document_id: self.header.required_document_id,
            user_id: self.header.user_id,
            date_created_utc: self.header.date_created_utc,
            payload_type_name: self.payload.type_name().to_string(),
            payload_json: self.payload.to_json()?,
            description: self.header.description.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::{Constrained, Rules};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Ping {
        n: u32,
    }

    impl Constrained for Ping {
        fn constraints(&self, _rules: &mut Rules) {}
    }

    impl Payload for Ping {
        const TYPE_NAME: &'static str = "tests::Ping";
    }

    #[test]
    fn new_dto_has_fresh_id_and_time() {
        let a = Dto::new(Ping { n: 1 });
        let b = Dto::new(Ping { n: 2 });
        assert_ne!(a.id(), b.id());
        assert!(!time::is_unset(a.header().date_created_utc));
        assert!(a.header().required_document_id.is_none());
    }

    #[test]
    fn unset_header_is_all_zero() {
        let header = DtoHeader::unset();
        assert!(header.id.is_nil());
        assert!(time::is_unset(header.date_created_utc));
    }

    #[test]
    fn to_document_copies_header_and_encodes_payload() {
        let previous = DocumentId::new();
        let user = Uuid::new_v4();
        let dto = Dto::new(Ping { n: 7 })
            .with_required_document(Some(previous))
            .with_user(user)
            .with_description("seven")
            .erase();

        let doc = dto.to_document().unwrap();
        assert_eq!(doc.id, dto.id());
        assert_eq!(doc.required_document_id, Some(previous));
        assert_eq!(doc.user_id, Some(user));
        assert_eq!(doc.date_created_utc, dto.header().date_created_utc);
        assert_eq!(doc.payload_type_name, "tests::Ping");
        assert_eq!(doc.payload_json, r#"{"n":7}"#);
        assert_eq!(doc.description.as_deref(), Some("seven"));
        assert_eq!(DtoHeader::from_document(&doc), *dto.header());
    }
}
