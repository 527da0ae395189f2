//! Payload capability.
//!
//! A [`Payload`] is the application data carried by a DTO. It is typed at the
//! call site and erased to [`AnyPayload`] inside the pipeline, where it is
//! validated, dispatched by type name, and encoded as JSON.

use crate::dto::DtoHeader;
use crate::error::CoreResult;
use crate::validator::{Constrained, Rules};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::Any;
use std::fmt;

/// Application data that can be pushed through a gateway.
///
/// `TYPE_NAME` is written to the document and used to find the decoder on
/// import, so it must stay stable once documents exist.
pub trait Payload:
    Constrained + Serialize + DeserializeOwned + fmt::Debug + Send + Sync + 'static
{
    /// Fully-qualified, stable type name.
    const TYPE_NAME: &'static str;

    /// A wrapped domain value whose own constraints are checked too.
    fn wrapped(&self) -> Option<&dyn Constrained> {
        None
    }

    /// Custom checks beyond the declarative rules.
    ///
    /// `carrier` is the owning DTO's header. Each violation is reported as
    /// `(field, message)`.
    fn validate(&self, carrier: &DtoHeader, report: &mut dyn FnMut(&str, &str)) {
        let _ = (carrier, report);
    }
}

/// Object-safe view of a [`Payload`].
pub trait AnyPayload: fmt::Debug + Send + Sync {
    /// The payload's registered type name.
    fn type_name(&self) -> &'static str;

    /// Encodes the payload as JSON.
    fn to_json(&self) -> CoreResult<String>;

    /// Declares the payload's own constraints.
    fn declare(&self, rules: &mut Rules);

    /// The wrapped value object, if any.
    fn wrapped_value(&self) -> Option<&dyn Constrained>;

    /// Runs the custom check.
    fn run_custom(&self, carrier: &DtoHeader, report: &mut dyn FnMut(&str, &str));

    /// Upcast for typed dispatch.
    fn as_any(&self) -> &dyn Any;
}

impl<P: Payload> AnyPayload for P {
    fn type_name(&self) -> &'static str {
        P::TYPE_NAME
    }

    fn to_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    fn declare(&self, rules: &mut Rules) {
        self.constraints(rules);
    }

    fn wrapped_value(&self) -> Option<&dyn Constrained> {
        Payload::wrapped(self)
    }

    fn run_custom(&self, carrier: &DtoHeader, report: &mut dyn FnMut(&str, &str)) {
        Payload::validate(self, carrier, report);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Short form of a type name: the last `::` or `.` segment, ASCII
/// alphanumerics only.
///
/// ```
/// use doclog_core::short_type_name;
///
/// assert_eq!(short_type_name("shop::orders::PlaceOrder"), "PlaceOrder");
/// assert_eq!(short_type_name("Shop.Orders.PlaceOrder`1"), "PlaceOrder1");
/// ```
#[must_use]
pub fn short_type_name(type_name: &str) -> String {
    let last = type_name
        .rsplit(|c: char| c == ':' || c == '.')
        .find(|segment| !segment.is_empty())
        .unwrap_or(type_name);
    let short: String = last.chars().filter(char::is_ascii_alphanumeric).collect();
    if short.is_empty() {
        "Payload".to_string()
    } else {
        short
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Note {
        text: String,
    }

    impl Constrained for Note {
        fn constraints(&self, rules: &mut Rules) {
            rules.max_length("Text", &self.text, 4);
        }
    }

    impl Payload for Note {
        const TYPE_NAME: &'static str = "tests::Note";

        fn validate(&self, _carrier: &DtoHeader, report: &mut dyn FnMut(&str, &str)) {
            if self.text.contains('!') {
                report("Text", "must not shout");
            }
        }
    }

    #[test]
    fn erased_payload_reports_type_and_json() {
        let note = Note { text: "hi".into() };
        let erased: &dyn AnyPayload = &note;
        assert_eq!(erased.type_name(), "tests::Note");
        assert_eq!(erased.to_json().unwrap(), r#"{"text":"hi"}"#);
        assert!(erased.wrapped_value().is_none());
        assert_eq!(erased.as_any().downcast_ref::<Note>(), Some(&note));
    }

    #[test]
    fn erased_payload_forwards_checks() {
        let note = Note {
            text: "hello!".into(),
        };
        let erased: &dyn AnyPayload = &note;

        let mut rules = Rules::new();
        erased.declare(&mut rules);
        assert_eq!(rules.violations().len(), 1);

        let mut reported = Vec::new();
        erased.run_custom(&DtoHeader::new(), &mut |field: &str, message: &str| {
            reported.push(format!("{field}: {message}"));
        });
        assert_eq!(reported, vec!["Text: must not shout"]);
    }

    #[test]
    fn short_type_name_variants() {
        assert_eq!(short_type_name("Note"), "Note");
        assert_eq!(short_type_name("a::b::Note"), "Note");
        assert_eq!(short_type_name("A.B.Note"), "Note");
        assert_eq!(short_type_name("a::Note::"), "Note");
        assert_eq!(short_type_name("::"), "Payload");
    }
}
