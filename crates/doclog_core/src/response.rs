//! Push outcomes.

use crate::dto::DtoHeader;
use std::any::Any;
use std::fmt;

/// Why a push was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureReason {
    /// One or more constraint violations.
    ValidationFailed,
    /// A document with the same id is already stored.
    DocumentExists,
    /// The declared predecessor is not stored.
    RequiredDocumentNotExists,
    /// No predecessor on a non-empty store.
    RequiredDocumentNotSpecified,
    /// No handler is registered for the payload type.
    PayloadHandlerNotFound,
    /// The transaction failed and was rolled back.
    DatabaseError,
    /// The handler returned an unrecognized result.
    UnknownResultType,
    /// Reserved for layers built on the gateway.
    OtherReasons,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ValidationFailed => "ValidationFailed",
            Self::DocumentExists => "DocumentExists",
            Self::RequiredDocumentNotExists => "RequiredDocumentNotExists",
            Self::RequiredDocumentNotSpecified => "RequiredDocumentNotSpecified",
            Self::PayloadHandlerNotFound => "PayloadHandlerNotFound",
            Self::DatabaseError => "DatabaseError",
            Self::UnknownResultType => "UnknownResultType",
            Self::OtherReasons => "OtherReasons",
        };
        f.write_str(name)
    }
}

/// The result of a push.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayResponse {
    /// The DTO was applied.
    Success {
        /// Header of the applied DTO.
        applied: DtoHeader,
        /// False when the handler asked to skip document creation.
        document_created: bool,
    },
    /// The DTO was rejected. Nothing was committed.
    Failure {
        /// Failure category.
        reason: FailureReason,
        /// Human-readable details.
        messages: Vec<String>,
    },
}

impl GatewayResponse {
    /// Creates a failure response.
    pub fn failure(reason: FailureReason, messages: Vec<String>) -> Self {
        Self::Failure { reason, messages }
    }

    /// Returns true on success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The failure reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<FailureReason> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { reason, .. } => Some(*reason),
        }
    }

    /// The failure messages. Empty on success.
    #[must_use]
    pub fn messages(&self) -> &[String] {
        match self {
            Self::Success { .. } => &[],
            Self::Failure { messages, .. } => messages,
        }
    }

    /// The applied header, on success.
    #[must_use]
    pub fn applied(&self) -> Option<&DtoHeader> {
        match self {
            Self::Success { applied, .. } => Some(applied),
            Self::Failure { .. } => None,
        }
    }
}

/// What a handler returns after applying a payload.
#[derive(Debug)]
pub enum HandlerResponse {
    /// The payload was applied.
    Success {
        /// Commit the handler's writes without appending a document.
        skip_document_creation: bool,
    },
    /// The payload was rejected. The transaction is rolled back.
    Failure {
        /// Failure category.
        reason: FailureReason,
        /// Human-readable details.
        messages: Vec<String>,
    },
    /// Anything else. Treated as a handler bug and rolled back.
    Other(Box<dyn Any + Send>),
}

impl HandlerResponse {
    /// Plain success.
    pub fn success() -> Self {
        Self::Success {
            skip_document_creation: false,
        }
    }

    /// Success without a document row.
    pub fn skip_document() -> Self {
        Self::Success {
            skip_document_creation: true,
        }
    }

    /// Failure with a reason and messages.
    pub fn failure(reason: FailureReason, messages: Vec<String>) -> Self {
        Self::Failure { reason, messages }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_accessors() {
        let response = GatewayResponse::failure(
            FailureReason::DocumentExists,
            vec!["duplicate".to_string()],
        );
        assert!(!response.is_success());
        assert_eq!(response.reason(), Some(FailureReason::DocumentExists));
        assert_eq!(response.messages(), ["duplicate"]);
        assert!(response.applied().is_none());
    }

    #[test]
    fn success_accessors() {
        let header = DtoHeader::new();
        let response = GatewayResponse::Success {
            applied: header.clone(),
            document_created: true,
        };
        assert!(response.is_success());
        assert_eq!(response.reason(), None);
        assert!(response.messages().is_empty());
        assert_eq!(response.applied(), Some(&header));
    }

    #[test]
    fn reason_display() {
        assert_eq!(
            FailureReason::RequiredDocumentNotSpecified.to_string(),
            "RequiredDocumentNotSpecified"
        );
    }
}
