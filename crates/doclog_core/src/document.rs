//! Documents: the immutable entries of the append log.

use crate::time::Ticks;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a document.
///
/// Document IDs are client-generated UUIDs that are:
/// - Globally unique within a store
/// - Immutable once assigned
/// - Never reused
///
/// The nil UUID means "unset" and is rejected by validation.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Creates a new random document ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The nil (unset) ID.
    #[must_use]
    pub const fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// Creates a document ID from a UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns true for the nil ID.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// Parses a document ID from its hyphenated text form.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        Uuid::parse_str(text).ok().map(Self)
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentId({})", self.0)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for DocumentId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<DocumentId> for Uuid {
    fn from(id: DocumentId) -> Self {
        id.0
    }
}

/// A committed log entry.
///
/// The serialized form uses PascalCase field names and is the on-disk format
/// of exported document files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Document {
    /// Unique identity.
    pub id: DocumentId,
    /// Causal predecessor. `None` only for the genesis document.
    #[serde(default)]
    pub required_document_id: Option<DocumentId>,
    /// Author, if known.
    #[serde(default)]
    pub user_id: Option<Uuid>,
    /// Client-assigned creation time. Chain and ordering key.
    pub date_created_utc: DateTime<Utc>,
    /// Registered name of the payload type.
    pub payload_type_name: String,
    /// JSON encoding of the payload.
    pub payload_json: String,
    /// Free text.
    #[serde(default)]
    pub description: Option<String>,
}

impl Document {
    /// Returns true if this document has no predecessor.
    #[must_use]
    pub fn is_genesis(&self) -> bool {
        self.required_document_id.is_none()
    }

    /// Creation time as a tick count.
    #[must_use]
    pub fn ticks(&self) -> Ticks {
        Ticks::from_datetime(self.date_created_utc)
    }
}
