//! Property-based test generators using proptest.

use crate::payloads::{OrderLine, SamplePayload};
use doclog_core::DocumentId;
use proptest::prelude::*;
use uuid::Uuid;

/// Strategy for generating document ids (never nil).
pub fn document_id_strategy() -> impl Strategy<Value = DocumentId> {
    any::<u128>()
        .prop_filter("id must not be nil", |n| *n != 0)
        .prop_map(|n| DocumentId::from_uuid(Uuid::from_u128(n)))
}

/// Strategy for sample payloads that pass validation.
pub fn valid_sample_strategy() -> impl Strategy<Value = SamplePayload> {
    (0..=100i32, "[a-z0-9]{0,10}").prop_map(|(some_int_value, some_string_value)| {
        SamplePayload {
            some_int_value,
            some_string_value,
        }
    })
}

/// Strategy for integers outside the sample range.
pub fn out_of_range_int_strategy() -> impl Strategy<Value = i32> {
    prop_oneof![i32::MIN..0i32, 101..=i32::MAX]
}

/// Strategy for strings too long for the sample payload.
pub fn long_string_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z]{11,40}"
}

/// Strategy for valid order lines.
pub fn order_line_strategy() -> impl Strategy<Value = OrderLine> {
    ("[A-Z]{2}-[0-9]{1,4}", 1..=1000u32).prop_map(|(sku, quantity)| OrderLine { sku, quantity })
}

/// Strategy for a non-empty list of valid order lines.
pub fn order_lines_strategy() -> impl Strategy<Value = Vec<OrderLine>> {
    prop::collection::vec(order_line_strategy(), 1..8)
}
