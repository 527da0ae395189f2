//! Constraint validation for DTOs and payloads.
//!
//! Validation runs before any store access and accumulates every violation:
//!
//! 1. Structural checks on the DTO header (`Id`, `UserId`, `DateCreatedUtc`)
//! 2. Declarative rules on the payload ([`Constrained`])
//! 3. Declarative rules on a wrapped value object, if the payload exposes one
//! 4. Element-wise rules on sequence fields (via [`Rules::each`])
//! 5. The payload's custom check, reported as `"field: message"`
//!
//! The result is an ordered list of messages with duplicates removed.

use crate::dto::DtoHeader;
use crate::payload::AnyPayload;
use crate::time;
use std::collections::HashSet;
use std::fmt::Display;

/// A value with declarative field constraints.
pub trait Constrained {
    /// Declares this value's constraints against `rules`.
    fn constraints(&self, rules: &mut Rules);
}

/// Collects constraint violations.
///
/// Every rule method records at most one message and returns `&mut Self`
/// so declarations can be chained.
#[derive(Debug, Default)]
pub struct Rules {
    violations: Vec<String>,
}

impl Rules {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The field must hold a value.
    pub fn required<T>(&mut self, field: &str, value: &Option<T>) -> &mut Self {
        if value.is_none() {
            self.violations.push(format!("The {field} field is required."));
        }
        self
    }

    /// The text must not be empty or whitespace.
    pub fn required_text(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.violations.push(format!("The {field} field is required."));
        }
        self
    }

    /// The value must lie within `min..=max`.
    pub fn range<T>(&mut self, field: &str, value: T, min: T, max: T) -> &mut Self
    where
        T: PartialOrd + Display,
    {
        if value < min || value > max {
            self.violations.push(format!(
                "The field {field} must be between {min} and {max}."
            ));
        }
        self
    }

    /// The text must have at most `max` characters.
    pub fn max_length(&mut self, field: &str, value: &str, max: usize) -> &mut Self {
        if value.chars().count() > max {
            self.violations.push(format!(
                "The field {field} must be a string with a maximum length of {max}."
            ));
        }
        self
    }

    /// The text must have at least `min` characters.
    pub fn min_length(&mut self, field: &str, value: &str, min: usize) -> &mut Self {
        if value.chars().count() < min {
            self.violations.push(format!(
                "The field {field} must be a string with a minimum length of {min}."
            ));
        }
        self
    }

    /// The sequence must contain at least `min` elements.
    pub fn min_items<T>(&mut self, field: &str, items: &[T], min: usize) -> &mut Self {
        if items.len() < min {
            self.violations.push(format!(
                "The field {field} must contain at least {min} item(s)."
            ));
        }
        self
    }

    /// Evaluates every element's own constraints and merges the results.
    pub fn each<T: Constrained>(&mut self, items: &[T]) -> &mut Self {
        for item in items {
            item.constraints(self);
        }
        self
    }

    /// Evaluates a nested value's constraints.
    pub fn nested<T: Constrained + ?Sized>(&mut self, value: &T) -> &mut Self {
        value.constraints(self);
        self
    }

    /// Records a free-form violation as `"field: message"`.
    pub fn custom(&mut self, field: &str, message: &str) -> &mut Self {
        self.violations.push(format!("{field}: {message}"));
        self
    }

    /// Returns true if no violation has been recorded.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns the violations recorded so far, in order.
    #[must_use]
    pub fn violations(&self) -> &[String] {
        &self.violations
    }

    /// Consumes the collector, returning messages with duplicates removed.
    #[must_use]
    pub fn into_messages(self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.violations
            .into_iter()
            .filter(|message| seen.insert(message.clone()))
            .collect()
    }
}

/// Validates a DTO header and its payload.
///
/// `allow_missing_user_id` skips the `UserId` structural check.
#[must_use]
pub fn validate(
    header: &DtoHeader,
    payload: &dyn AnyPayload,
    allow_missing_user_id: bool,
) -> Vec<String> {
    let mut rules = Rules::new();

    if header.id.is_nil() {
        rules.custom("Id", "must not be empty");
    }
    if !allow_missing_user_id && header.user_id.map_or(true, |id| id.is_nil()) {
        rules.custom("UserId", "must not be empty");
    }
    if time::is_unset(header.date_created_utc) {
        rules.custom("DateCreatedUtc", "must not be empty");
    } else if time::is_out_of_range(header.date_created_utc) {
        rules.custom("DateCreatedUtc", "is out of range");
    }

    payload.declare(&mut rules);
    if let Some(wrapped) = payload.wrapped_value() {
        rules.nested(wrapped);
    }

    payload.run_custom(header, &mut |field: &str, message: &str| {
        rules.custom(field, message);
    });

    rules.into_messages()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Line {
        sku: String,
        quantity: i32,
    }

    impl Constrained for Line {
        fn constraints(&self, rules: &mut Rules) {
            rules
                .required_text("Sku", &self.sku)
                .range("Quantity", self.quantity, 1, 99);
        }
    }

    #[test]
    fn range_message_matches_annotation_wording() {
        let mut rules = Rules::new();
        rules.range("SomeIntValue", -10, 0, 100);
        assert_eq!(
            rules.violations(),
            ["The field SomeIntValue must be between 0 and 100."]
        );
    }

    #[test]
    fn length_rules() {
        let mut rules = Rules::new();
        rules
            .max_length("Name", "abcdefghijk", 10)
            .min_length("Code", "a", 2)
            .max_length("Ok", "abc", 10);
        assert_eq!(
            rules.violations(),
            [
                "The field Name must be a string with a maximum length of 10.",
                "The field Code must be a string with a minimum length of 2.",
            ]
        );
    }

    #[test]
    fn required_rules() {
        let mut rules = Rules::new();
        let missing: Option<u32> = None;
        rules
            .required("Owner", &missing)
            .required_text("Title", "   ")
            .required("Present", &Some(1));
        assert_eq!(
            rules.violations(),
            ["The Owner field is required.", "The Title field is required."]
        );
    }

    #[test]
    fn each_merges_element_violations() {
        let lines = vec![
            Line {
                sku: "A-1".into(),
                quantity: 1,
            },
            Line {
                sku: String::new(),
                quantity: 0,
            },
        ];
        let mut rules = Rules::new();
        rules.min_items("Lines", &lines, 1).each(&lines);
        assert_eq!(
            rules.violations(),
            [
                "The Sku field is required.",
                "The field Quantity must be between 1 and 99.",
            ]
        );
    }

    #[test]
    fn min_items_rejects_empty() {
        let lines: Vec<Line> = Vec::new();
        let mut rules = Rules::new();
        rules.min_items("Lines", &lines, 1).each(&lines);
        assert_eq!(
            rules.violations(),
            ["The field Lines must contain at least 1 item(s)."]
        );
    }

    #[test]
    fn duplicates_are_removed_in_order() {
        let mut rules = Rules::new();
        rules
            .custom("A", "bad")
            .custom("B", "bad")
            .custom("A", "bad");
        assert_eq!(rules.into_messages(), vec!["A: bad", "B: bad"]);
    }
}
