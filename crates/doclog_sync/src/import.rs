//! Folding exported files back into a store.
//!
//! Every file goes through the gateway, so imported documents meet the same
//! uniqueness, chain and handler rules as local ones. Files whose predecessor
//! has not arrived yet are retried in later passes while passes keep making
//! progress.

use crate::config::SyncConfig;
use crate::report::{SkipReason, SkippedFile, SyncReport};
use crate::scan::ExportedFile;
use doclog_core::{
    CoreError, Document, Dto, DtoHeader, FailureReason, Gateway, GatewayResponse, WriteGuard,
};
use std::fs;
use tracing::{debug, error, warn};

enum Outcome {
    Imported,
    Waiting(Vec<String>),
    Skipped(SkipReason),
}

pub(crate) fn import_files(
    gateway: &Gateway,
    guard: &WriteGuard<'_>,
    files: Vec<ExportedFile>,
    config: &SyncConfig,
    report: &mut SyncReport,
) {
    let mut waiting: Vec<(ExportedFile, Vec<String>)> =
        files.into_iter().map(|f| (f, Vec::new())).collect();

    for pass in 1..=config.import_passes() {
        if waiting.is_empty() {
            break;
        }
        report.passes = pass;
        let imported_before = report.imported.len();

        let mut next = Vec::new();
        for (file, _) in waiting {
            match import_file(gateway, guard, &file) {
                Outcome::Imported => report.imported.push(file.id),
                Outcome::Waiting(messages) => next.push((file, messages)),
                Outcome::Skipped(reason) => report.skipped.push(SkippedFile {
                    path: file.path,
                    id: file.id,
                    reason,
                }),
            }
        }
        waiting = next;

        debug!(
            pass,
            imported = report.imported.len() - imported_before,
            waiting = waiting.len(),
            "import pass finished"
        );
        if report.imported.len() == imported_before {
            break;
        }
    }

    for (file, messages) in waiting {
        warn!(
            path = %file.path.display(),
            document_id = %file.id,
            "predecessor never arrived, file not imported"
        );
        report.skipped.push(SkippedFile {
            path: file.path,
            id: file.id,
            reason: SkipReason::Rejected {
                reason: FailureReason::RequiredDocumentNotExists,
                messages,
            },
        });
    }
}

fn import_file(gateway: &Gateway, guard: &WriteGuard<'_>, file: &ExportedFile) -> Outcome {
    let document = match read_document(file) {
        Ok(document) => document,
        Err(message) => {
            warn!(path = %file.path.display(), error = %message, "unreadable document file");
            return Outcome::Skipped(SkipReason::Unreadable { message });
        }
    };

    if document.id != file.id {
        warn!(
            path = %file.path.display(),
            embedded = %document.id,
            "document id does not match file name"
        );
        return Outcome::Skipped(SkipReason::IdMismatch {
            embedded: document.id,
        });
    }

    let payload = match gateway
        .registry()
        .decode(&document.payload_type_name, &document.payload_json)
    {
        Ok(payload) => payload,
        Err(CoreError::UnknownPayloadType { type_name }) => {
            error!(
                path = %file.path.display(),
                type_name = %type_name,
                "payload type cannot be resolved"
            );
            return Outcome::Skipped(SkipReason::UnresolvedType { type_name });
        }
        Err(e) => {
            error!(path = %file.path.display(), error = %e, "payload does not decode");
            return Outcome::Skipped(SkipReason::Undecodable {
                message: e.to_string(),
            });
        }
    };

    let dto = Dto::from_parts(DtoHeader::from_document(&document), payload);
    match gateway.push_locked(guard, dto) {
        GatewayResponse::Success { .. } => Outcome::Imported,
        GatewayResponse::Failure {
            reason: FailureReason::RequiredDocumentNotExists,
            messages,
        } => Outcome::Waiting(messages),
        GatewayResponse::Failure { reason, messages } => {
            warn!(
                path = %file.path.display(),
                document_id = %file.id,
                %reason,
                "import rejected"
            );
            Outcome::Skipped(SkipReason::Rejected { reason, messages })
        }
    }
}

fn read_document(file: &ExportedFile) -> Result<Document, String> {
    let bytes = fs::read(&file.path).map_err(|e| e.to_string())?;
    serde_json::from_slice(&bytes).map_err(|e| e.to_string())
}
