//! Error types for doclog core.
//!
//! These cover infrastructure failures (I/O, codecs, journal damage, locking).
//! Outcomes of a push are never errors; they are reported through
//! [`GatewayResponse`](crate::GatewayResponse).

use crate::document::DocumentId;
use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in doclog core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON encode/decode error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CBOR encode/decode error in the journal.
    #[error("CBOR error: {message}")]
    Cbor {
        /// Description of the failure.
        message: String,
    },

    /// Journal is corrupted or invalid.
    #[error("journal corruption: {message}")]
    JournalCorruption {
        /// Description of the corruption.
        message: String,
    },

    /// Checksum mismatch detected in a journal record.
    #[error("checksum mismatch at offset {offset}: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// Byte offset of the record.
        offset: u64,
        /// Stored checksum.
        expected: u32,
        /// Computed checksum.
        actual: u32,
    },

    /// Store directory is held by another process.
    #[error("store locked: another process has exclusive access")]
    StoreLocked,

    /// A document with this id is already stored.
    #[error("document already exists: {0}")]
    DuplicateDocument(DocumentId),

    /// Document not found.
    #[error("document not found: {0}")]
    DocumentNotFound(DocumentId),

    /// Payload type is not registered.
    #[error("unknown payload type: {type_name}")]
    UnknownPayloadType {
        /// The unresolved type name.
        type_name: String,
    },

    /// A handler reported an error while applying a payload.
    #[error("handler error: {message}")]
    Handler {
        /// Description of the failure.
        message: String,
    },

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates a journal corruption error.
    pub fn journal_corruption(message: impl Into<String>) -> Self {
        Self::JournalCorruption {
            message: message.into(),
        }
    }

    /// Creates a CBOR error.
    pub fn cbor(message: impl Into<String>) -> Self {
        Self::Cbor {
            message: message.into(),
        }
    }

    /// Creates a handler error.
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Creates an unknown payload type error.
    pub fn unknown_payload_type(type_name: impl Into<String>) -> Self {
        Self::UnknownPayloadType {
            type_name: type_name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let err = CoreError::journal_corruption("bad magic at offset 12");
        assert_eq!(err.to_string(), "journal corruption: bad magic at offset 12");

        let err = CoreError::ChecksumMismatch {
            offset: 40,
            expected: 0xDEAD_BEEF,
            actual: 0x0000_0001,
        };
        assert_eq!(
            err.to_string(),
            "checksum mismatch at offset 40: expected deadbeef, got 00000001"
        );
    }

    #[test]
    fn io_errors_convert() {
        let io = io::Error::new(io::ErrorKind::NotFound, "gone");
        let err: CoreError = io.into();
        assert!(matches!(err, CoreError::Io(_)));
    }
}
