//! Sample payloads and their handlers.
//!
//! | Payload | Rules | Handler |
//! |---|---|---|
//! | [`SamplePayload`] | `SomeIntValue` in 0..=100, `SomeStringValue` ≤ 10 chars | accepts |
//! | [`CreateUser`] | wraps a [`User`]; email must contain `@` | writes `users` record |
//! | [`PlaceOrder`] | at least one line; each line checked | writes `orders` record |
//! | [`SetSetting`] | key required | writes `settings`, skips the document |

use doclog_core::{
    Constrained, CoreResult, DtoHeader, FailureReason, HandlerResponse, Payload,
    PayloadRegistry, Rules, StoreTransaction, TransactionExt,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Collection written by [`CreateUser`].
pub const USERS: &str = "users";
/// Collection written by [`PlaceOrder`].
pub const ORDERS: &str = "orders";
/// Collection written by [`SetSetting`].
pub const SETTINGS: &str = "settings";

/// A payload with one range rule and one length rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SamplePayload {
    /// Must be within 0..=100.
    pub some_int_value: i32,
    /// At most 10 characters.
    pub some_string_value: String,
}

impl SamplePayload {
    /// A payload that passes every rule.
    pub fn valid(n: i32) -> Self {
        Self {
            some_int_value: n.rem_euclid(101),
            some_string_value: format!("v{}", n.rem_euclid(1000)),
        }
    }
}

impl Constrained for SamplePayload {
    fn constraints(&self, rules: &mut Rules) {
        rules
            .range("SomeIntValue", self.some_int_value, 0, 100)
            .max_length("SomeStringValue", &self.some_string_value, 10);
    }
}

impl Payload for SamplePayload {
    const TYPE_NAME: &'static str = "doclog_testkit::SamplePayload";
}

/// A domain user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct User {
    /// User id.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
}

impl Constrained for User {
    fn constraints(&self, rules: &mut Rules) {
        rules
            .required_text("Name", &self.name)
            .max_length("Name", &self.name, 50)
            .required_text("Email", &self.email);
    }
}

/// Creates a [`User`]. The user is checked as a wrapped value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateUser {
    /// The user to create.
    pub user: User,
}

impl CreateUser {
    /// A valid request for a fresh user.
    pub fn new(name: &str, email: &str) -> Self {
        Self {
            user: User {
                id: Uuid::new_v4(),
                name: name.to_string(),
                email: email.to_string(),
            },
        }
    }
}

impl Constrained for CreateUser {
    fn constraints(&self, _rules: &mut Rules) {}
}

impl Payload for CreateUser {
    const TYPE_NAME: &'static str = "doclog_testkit::CreateUser";

    fn wrapped(&self) -> Option<&dyn Constrained> {
        Some(&self.user)
    }

    fn validate(&self, carrier: &DtoHeader, report: &mut dyn FnMut(&str, &str)) {
        if !self.user.email.is_empty() && !self.user.email.contains('@') {
            report("Email", "is not a valid address");
        }
        if carrier.user_id == Some(self.user.id) {
            report("User", "cannot be created by itself");
        }
    }
}

/// One order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrderLine {
    /// Stock keeping unit.
    pub sku: String,
    /// Must be within 1..=1000.
    pub quantity: u32,
}

impl OrderLine {
    /// A valid line.
    pub fn new(sku: &str, quantity: u32) -> Self {
        Self {
            sku: sku.to_string(),
            quantity,
        }
    }
}

impl Constrained for OrderLine {
    fn constraints(&self, rules: &mut Rules) {
        rules
            .required_text("Sku", &self.sku)
            .range("Quantity", self.quantity, 1, 1000);
    }
}

/// Places an order with at least one line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlaceOrder {
    /// Order id.
    pub order_id: Uuid,
    /// Order lines.
    pub lines: Vec<OrderLine>,
}

impl PlaceOrder {
    /// An order with the given lines.
    pub fn new(lines: Vec<OrderLine>) -> Self {
        Self {
            order_id: Uuid::new_v4(),
            lines,
        }
    }
}

impl Constrained for PlaceOrder {
    fn constraints(&self, rules: &mut Rules) {
        rules.min_items("Lines", &self.lines, 1).each(&self.lines);
    }
}

impl Payload for PlaceOrder {
    const TYPE_NAME: &'static str = "doclog_testkit::PlaceOrder";
}

/// Sets a key/value setting without appending a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SetSetting {
    /// Setting key.
    pub key: Uuid,
    /// Setting value.
    pub value: String,
}

impl Constrained for SetSetting {
    fn constraints(&self, rules: &mut Rules) {
        rules.required_text("Value", &self.value);
    }
}

impl Payload for SetSetting {
    const TYPE_NAME: &'static str = "doclog_testkit::SetSetting";
}

fn create_user(
    payload: &CreateUser,
    _carrier: &DtoHeader,
    txn: &mut dyn StoreTransaction,
) -> CoreResult<HandlerResponse> {
    if txn.get_record(USERS, payload.user.id)?.is_some() {
        return Ok(HandlerResponse::failure(
            FailureReason::OtherReasons,
            vec![format!("user {} already exists", payload.user.id)],
        ));
    }
    txn.put_json(USERS, payload.user.id, &payload.user)?;
    Ok(HandlerResponse::success())
}

fn place_order(
    payload: &PlaceOrder,
    _carrier: &DtoHeader,
    txn: &mut dyn StoreTransaction,
) -> CoreResult<HandlerResponse> {
    txn.put_json(ORDERS, payload.order_id, &payload.lines)?;
    Ok(HandlerResponse::success())
}

fn set_setting(
    payload: &SetSetting,
    _carrier: &DtoHeader,
    txn: &mut dyn StoreTransaction,
) -> CoreResult<HandlerResponse> {
    txn.put_json(SETTINGS, payload.key, &payload.value)?;
    Ok(HandlerResponse::skip_document())
}

/// A registry with every sample payload and its handler.
pub fn registry() -> PayloadRegistry {
    PayloadRegistry::new()
        .with::<SamplePayload, _>(|_, _, _| Ok(HandlerResponse::success()))
        .with::<CreateUser, _>(create_user)
        .with::<PlaceOrder, _>(place_order)
        .with::<SetSetting, _>(set_setting)
}
