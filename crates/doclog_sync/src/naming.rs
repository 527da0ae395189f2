//! File and directory naming in a sync root.
//!
//! ```text
//! <root>/
//! ├─ 20240131.zip                      # archive marker: up to Jan 31 is archived
//! └─ 20240201/
//!    └─ 638423136000000000_PlaceOrder_6f1c...e2.json
//! ```
//!
//! Document files are named `{ticks}_{short type}_{id}.json` and live in a
//! `yyyyMMdd` directory named after their creation day.

use chrono::{DateTime, NaiveDate, Utc};
use doclog_core::time::{self, Ticks};
use doclog_core::{short_type_name, Document, DocumentId};
use once_cell::sync::Lazy;
use regex::Regex;

static ARCHIVE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{8})\.(zip|7z)$").expect("archive marker pattern"));

static DOCUMENT_FILE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+)_([A-Za-z0-9]+)_([0-9A-Fa-f]{8}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{12})\.json$")
        .expect("document file pattern")
});

const DAY_FORMAT: &str = "%Y%m%d";

/// The archived day named by a marker file, if `file_name` is one.
pub fn archive_day(file_name: &str) -> Option<NaiveDate> {
    let caps = ARCHIVE_MARKER.captures(file_name)?;
    NaiveDate::parse_from_str(&caps[1], DAY_FORMAT).ok()
}

/// The last instant covered by an archive of `day`: 23:59:59.999 UTC.
pub fn end_of_day(day: NaiveDate) -> Option<DateTime<Utc>> {
    day.and_hms_milli_opt(23, 59, 59, 999).map(|t| t.and_utc())
}

/// The watermark implied by a set of archived days.
///
/// Falls back to the unset timestamp when there are no markers.
pub fn watermark<I>(days: I) -> DateTime<Utc>
where
    I: IntoIterator<Item = NaiveDate>,
{
    days.into_iter()
        .max()
        .and_then(end_of_day)
        .unwrap_or_else(time::unset_timestamp)
}

/// Fields recovered from a document file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedName {
    /// Creation ticks.
    pub ticks: Ticks,
    /// Document id.
    pub id: DocumentId,
}

/// Parses a document file name.
pub fn parse_document_file_name(file_name: &str) -> Option<ParsedName> {
    let caps = DOCUMENT_FILE.captures(file_name)?;
    let ticks = caps[1].parse::<i64>().ok()?;
    let id = DocumentId::parse(&caps[3])?;
    Some(ParsedName {
        ticks: Ticks::new(ticks),
        id,
    })
}

/// The file name a document is exported under.
pub fn document_file_name(document: &Document) -> String {
    format!(
        "{}_{}_{}.json",
        document.ticks(),
        short_type_name(&document.payload_type_name),
        document.id
    )
}

/// The day directory a document is exported into.
pub fn day_dir_name(document: &Document) -> String {
    time::day_of(document.date_created_utc)
        .format(DAY_FORMAT)
        .to_string()
}
