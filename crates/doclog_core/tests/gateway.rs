//! Push pipeline behavior over a memory store.

use doclog_core::{
    Constrained, CoreError, DocumentId, DocumentStore, Dto, DtoHeader, FailureReason, Gateway,
    GatewayConfig, GatewayResponse, HandlerResponse, MemoryStore, Payload, Rules,
    SequenceNumber, TransactionExt,
};
use chrono::{TimeZone, Utc};
use doclog_testkit::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread;
use uuid::Uuid;

/// Writes a record, then lets the test pick how the handler ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Faulty {
    key: Uuid,
    mode: u8,
}

const FAULTY_ERROR: u8 = 0;
const FAULTY_PANIC: u8 = 1;
const FAULTY_OTHER: u8 = 2;

impl Constrained for Faulty {
    fn constraints(&self, _rules: &mut Rules) {}
}

impl Payload for Faulty {
    const TYPE_NAME: &'static str = "tests::Faulty";
}

fn faulty_gateway() -> Gateway {
    let registry = registry().with::<Faulty, _>(|payload, _, txn| {
        txn.put_json("scratch", payload.key, &"written")?;
        match payload.mode {
            FAULTY_ERROR => Err(CoreError::handler("refused after writing")),
            FAULTY_PANIC => panic!("boom"),
            _ => Ok(HandlerResponse::Other(Box::new(42_u8))),
        }
    });
    Gateway::builder(Arc::new(MemoryStore::new()))
        .registry(registry)
        .build()
        .expect("Failed to build gateway")
}

fn count(gateway: &Gateway) -> usize {
    gateway.store().document_count().unwrap()
}

#[test]
fn test_genesis_then_chain() {
    let gateway = TestGateway::memory();

    let a = authored_dto(&gateway, SamplePayload::valid(1));
    assert!(a.header().required_document_id.is_none());
    let a_id = a.id();
    let response = gateway.push(a);
    assert!(matches!(
        response,
        GatewayResponse::Success {
            document_created: true,
            ..
        }
    ));
    assert_eq!(response.applied().map(|h| h.id), Some(a_id));

    let b = authored_dto(&gateway, SamplePayload::valid(2));
    assert_eq!(b.header().required_document_id, Some(a_id));
    assert!(gateway.push(b).is_success());
    assert_eq!(count(&gateway), 2);
}

#[test]
fn test_chain_rejections() {
    let gateway = TestGateway::memory();
    let ids = push_chain(&gateway, 2);
    let (a, b) = (ids[0], ids[1]);

    // Duplicate id.
    let dup = authored_dto(&gateway, SamplePayload::valid(3)).with_id(b);
    assert_eq!(
        gateway.push(dup).reason(),
        Some(FailureReason::DocumentExists)
    );

    // Predecessor that was never stored.
    let dangling = authored_dto(&gateway, SamplePayload::valid(4))
        .with_required_document(Some(DocumentId::new()));
    assert_eq!(
        gateway.push(dangling).reason(),
        Some(FailureReason::RequiredDocumentNotExists)
    );

    // No predecessor on a non-empty store.
    let orphan = authored_dto(&gateway, SamplePayload::valid(5)).with_required_document(None);
    assert_eq!(
        gateway.push(orphan).reason(),
        Some(FailureReason::RequiredDocumentNotSpecified)
    );

    // Any stored document is an acceptable predecessor, not only the latest.
    let branch = authored_dto(&gateway, SamplePayload::valid(6)).with_required_document(Some(a));
    assert!(gateway.push(branch).is_success());
    assert_eq!(count(&gateway), 3);
}

#[test]
fn test_stored_document_matches_dto() {
    let gateway = TestGateway::memory();
    let dto = authored_dto(&gateway, SamplePayload::valid(42)).with_description("answer");
    let header = dto.header().clone();
    assert!(gateway.push(dto).is_success());

    let doc = gateway.store().get_document(header.id).unwrap().unwrap();
    assert_eq!(doc.user_id, header.user_id);
    assert_eq!(doc.date_created_utc, header.date_created_utc);
    assert_eq!(doc.description.as_deref(), Some("answer"));
    assert_eq!(doc.payload_type_name, SamplePayload::TYPE_NAME);
    let payload: SamplePayload = serde_json::from_str(&doc.payload_json).unwrap();
    assert_eq!(payload, SamplePayload::valid(42));
    assert!(doc.is_genesis());
}

#[test]
fn test_validation_reports_every_violation() {
    let gateway = TestGateway::memory();
    let dto = authored_dto(
        &gateway,
        SamplePayload {
            some_int_value: -10,
            some_string_value: "x".repeat(11),
        },
    );
    let response = gateway.push(dto);

    assert_eq!(response.reason(), Some(FailureReason::ValidationFailed));
    assert_eq!(
        response.messages(),
        [
            "The field SomeIntValue must be between 0 and 100.",
            "The field SomeStringValue must be a string with a maximum length of 10.",
        ]
    );
    assert_eq!(count(&gateway), 0);
}

#[test]
fn test_structural_checks_on_unset_header() {
    let gateway = TestGateway::memory();
    let dto = Dto::from_parts(DtoHeader::unset(), SamplePayload::valid(1));
    let response = gateway.push(dto);

    assert_eq!(response.reason(), Some(FailureReason::ValidationFailed));
    assert_eq!(
        response.messages(),
        [
            "Id: must not be empty",
            "UserId: must not be empty",
            "DateCreatedUtc: must not be empty",
        ]
    );
}

#[test]
fn test_far_future_date_is_rejected_not_panicking() {
    let gateway = TestGateway::memory();
    let far = Utc.with_ymd_and_hms(40000, 1, 1, 0, 0, 0).unwrap();
    let dto = authored_dto(&gateway, SamplePayload::valid(1)).with_date_created(far);

    let response = gateway.push(dto);

    assert_eq!(response.reason(), Some(FailureReason::ValidationFailed));
    assert_eq!(response.messages(), ["DateCreatedUtc: is out of range"]);
    assert_eq!(count(&gateway), 0);
}

#[test]
fn test_missing_user_allowed_when_configured() {
    let strict = TestGateway::memory();
    let response = strict.push(strict.create_dto(SamplePayload::valid(1)).unwrap());
    assert_eq!(response.messages(), ["UserId: must not be empty"]);

    let bootstrap = TestGateway::memory_with(GatewayConfig::default().allow_missing_user_id(true));
    let response = bootstrap.push(bootstrap.create_dto(SamplePayload::valid(1)).unwrap());
    assert!(response.is_success());
}

#[test]
fn test_wrapped_and_custom_checks() {
    let gateway = TestGateway::memory();

    let dto = authored_dto(&gateway, CreateUser::new("", "not-an-address"));
    let response = gateway.push(dto);
    assert_eq!(
        response.messages(),
        [
            "The Name field is required.",
            "Email: is not a valid address",
        ]
    );

    let request = CreateUser::new("ann", "ann@example.com");
    let own_id = request.user.id;
    let dto = gateway.create_dto(request).unwrap().with_user(own_id);
    assert_eq!(
        gateway.push(dto).messages(),
        ["User: cannot be created by itself"]
    );
}

#[test]
fn test_list_items_are_validated() {
    let gateway = TestGateway::memory();

    let empty = authored_dto(&gateway, PlaceOrder::new(Vec::new()));
    assert_eq!(
        gateway.push(empty).messages(),
        ["The field Lines must contain at least 1 item(s)."]
    );

    let lines = vec![
        OrderLine::new("AB-1", 2),
        OrderLine::new("", 0),
        OrderLine::new("CD-2", 0),
    ];
    let response = gateway.push(authored_dto(&gateway, PlaceOrder::new(lines)));
    // The repeated quantity violation is reported once.
    assert_eq!(
        response.messages(),
        [
            "The Sku field is required.",
            "The field Quantity must be between 1 and 1000.",
        ]
    );
}

#[test]
fn test_handler_writes_commit_with_document() {
    let gateway = TestGateway::memory();
    let request = CreateUser::new("ann", "ann@example.com");
    let user_id = request.user.id;

    assert!(gateway.push(authored_dto(&gateway, request.clone())).is_success());
    let stored = gateway.store().get_record(USERS, user_id).unwrap().unwrap();
    let user: User = serde_json::from_slice(&stored).unwrap();
    assert_eq!(user, request.user);

    // The handler refuses the same user twice; nothing is appended.
    let response = gateway.push(authored_dto(&gateway, request));
    assert_eq!(response.reason(), Some(FailureReason::OtherReasons));
    assert_eq!(count(&gateway), 1);
}

#[test]
fn test_handler_error_rolls_back_writes() {
    let gateway = faulty_gateway();
    let key = Uuid::new_v4();
    let dto = gateway
        .create_dto(Faulty {
            key,
            mode: FAULTY_ERROR,
        })
        .unwrap()
        .with_user(Uuid::new_v4());

    let response = gateway.push(dto);
    assert_eq!(response.reason(), Some(FailureReason::DatabaseError));
    assert!(response.messages()[0].contains("refused after writing"));
    assert!(gateway.store().get_record("scratch", key).unwrap().is_none());
    assert_eq!(count(&gateway), 0);
}

#[test]
fn test_handler_panic_rolls_back_writes() {
    let gateway = faulty_gateway();
    let key = Uuid::new_v4();
    let dto = gateway
        .create_dto(Faulty {
            key,
            mode: FAULTY_PANIC,
        })
        .unwrap()
        .with_user(Uuid::new_v4());

    let response = gateway.push(dto);
    assert_eq!(response.reason(), Some(FailureReason::DatabaseError));
    assert!(response.messages()[0].contains("boom"));
    assert!(gateway.store().get_record("scratch", key).unwrap().is_none());

    // The write lock was released.
    assert!(gateway
        .push(authored_dto(&gateway, SamplePayload::valid(1)))
        .is_success());
}

#[test]
fn test_unrecognized_handler_result_rolls_back() {
    let gateway = faulty_gateway();
    let key = Uuid::new_v4();
    let dto = gateway
        .create_dto(Faulty {
            key,
            mode: FAULTY_OTHER,
        })
        .unwrap()
        .with_user(Uuid::new_v4());

    let response = gateway.push(dto);
    assert_eq!(response.reason(), Some(FailureReason::UnknownResultType));
    assert!(gateway.store().get_record("scratch", key).unwrap().is_none());
    assert_eq!(count(&gateway), 0);
}

#[test]
fn test_missing_handler() {
    let gateway = Gateway::builder(Arc::new(MemoryStore::new()))
        .build()
        .unwrap();
    let dto = gateway
        .create_dto(SamplePayload::valid(1))
        .unwrap()
        .with_user(Uuid::new_v4());

    let response = gateway.push(dto);
    assert_eq!(response.reason(), Some(FailureReason::PayloadHandlerNotFound));
    assert!(response.messages()[0].contains(SamplePayload::TYPE_NAME));
}

#[test]
fn test_skip_document_commits_writes_without_document() {
    let gateway = TestGateway::memory();
    push_chain(&gateway, 1);
    let events = gateway.subscribe();

    let key = Uuid::new_v4();
    let dto = authored_dto(
        &gateway,
        SetSetting {
            key,
            value: "dark".into(),
        },
    );
    let response = gateway.push(dto);

    assert!(matches!(
        response,
        GatewayResponse::Success {
            document_created: false,
            ..
        }
    ));
    assert_eq!(count(&gateway), 1);
    assert!(gateway.store().get_record(SETTINGS, key).unwrap().is_some());
    assert!(events.try_recv().is_err());
}

#[test]
fn test_notifications_follow_commits() {
    let gateway = TestGateway::memory();
    let events = gateway.subscribe();

    let ids = push_chain(&gateway, 3);

    let received: Vec<_> = events.try_iter().collect();
    assert_eq!(
        received.iter().map(|e| e.document_id).collect::<Vec<_>>(),
        ids
    );
    assert!(received.windows(2).all(|w| w[0].sequence < w[1].sequence));

    let polled = gateway.poll_versions(received[0].sequence, 10);
    assert_eq!(polled.len(), 2);
    assert_eq!(polled[0].document_id, ids[1]);
    assert_eq!(gateway.poll_versions(SequenceNumber::new(0), 1).len(), 1);
}

#[test]
fn test_rejected_push_is_not_notified() {
    let gateway = TestGateway::memory();
    let events = gateway.subscribe();
    let dto = authored_dto(&gateway, SamplePayload::valid(1))
        .with_required_document(Some(DocumentId::new()));
    assert!(!gateway.push(dto).is_success());
    assert!(events.try_recv().is_err());
}

#[test]
fn test_cache_tracks_pushes() {
    let gateway = TestGateway::memory_with(GatewayConfig::default().use_cache(true));
    let ids = push_chain(&gateway, 3);

    assert_eq!(gateway.with_cache(|cache| cache.len()), Some(3));
    assert_eq!(
        gateway.with_cache(|cache| ids.iter().all(|id| cache.contains(*id))),
        Some(true)
    );

    let dup = authored_dto(&gateway, SamplePayload::valid(9)).with_id(ids[0]);
    assert_eq!(
        gateway.push(dup).reason(),
        Some(FailureReason::DocumentExists)
    );
}

#[test]
fn test_cache_loads_existing_documents() {
    let store = Arc::new(MemoryStore::new());
    let first = Gateway::builder(store.clone())
        .registry(registry())
        .build()
        .unwrap();
    push_chain(&first, 2);

    let second = Gateway::builder(store)
        .registry(registry())
        .config(GatewayConfig::default().use_cache(true))
        .build()
        .unwrap();
    assert_eq!(second.with_cache(|cache| cache.len()), Some(2));
    assert!(TestGateway::memory().with_cache(|_| ()).is_none());
}

#[test]
fn test_concurrent_pushes_all_land() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 10;

    let gateway = TestGateway::memory();
    let genesis = push_chain(&gateway, 1)[0];

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let gateway = Arc::clone(&gateway.gateway);
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    let dto = Dto::new(SamplePayload::valid((t * PER_THREAD + i) as i32))
                        .with_required_document(Some(genesis))
                        .with_user(Uuid::new_v4());
                    assert!(gateway.push(dto).is_success());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(count(&gateway), 1 + THREADS * PER_THREAD);
}

#[test]
fn test_locked_pushes_share_one_guard() {
    let gateway = TestGateway::memory();
    let guard = gateway.lock();

    let first = Dto::new(SamplePayload::valid(1)).with_user(Uuid::new_v4());
    let first_id = first.id();
    assert!(gateway.push_locked(&guard, first.erase()).is_success());

    let second = Dto::new(SamplePayload::valid(2))
        .with_required_document(Some(first_id))
        .with_user(Uuid::new_v4());
    assert!(gateway.push_locked(&guard, second.erase()).is_success());
    drop(guard);

    assert_eq!(count(&gateway), 2);
}

#[tokio::test]
async fn test_push_async() {
    let gateway = TestGateway::memory();
    let dto = authored_dto(&gateway, SamplePayload::valid(5));
    let id = dto.id();

    let response = gateway.gateway.push_async(dto).await;
    assert!(response.is_success());
    assert!(gateway.store().document_exists(id).unwrap());
}
