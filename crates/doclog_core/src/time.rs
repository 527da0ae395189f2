//! Timestamps and tick counts.
//!
//! Document timestamps are UTC instants at 100 ns resolution. The tick count
//! (100 ns intervals since `0001-01-01T00:00:00Z`) is the portable form used
//! in exported file names and version notifications.

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use std::fmt;

/// Ticks between `0001-01-01T00:00:00Z` and the Unix epoch.
pub const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;

/// Ticks per second.
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Seconds between `0001-01-01T00:00:00Z` and the Unix epoch.
const UNIX_EPOCH_SECONDS: i64 = UNIX_EPOCH_TICKS / TICKS_PER_SECOND;

/// A count of 100 ns intervals since `0001-01-01T00:00:00Z`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticks(pub i64);

impl Ticks {
    /// The zero tick count. Marks an unset timestamp.
    pub const ZERO: Ticks = Ticks(0);

    /// Creates a tick count from a raw value.
    #[must_use]
    pub const fn new(ticks: i64) -> Self {
        Self(ticks)
    }

    /// Returns the raw tick value.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }

    /// Converts a UTC instant to ticks. Sub-tick precision is dropped.
    ///
    /// Returns `None` if the instant does not fit in an `i64` tick count.
    #[must_use]
    pub fn checked_from_datetime(value: DateTime<Utc>) -> Option<Self> {
        let sub = i64::from(value.timestamp_subsec_nanos() / 100);
        value
            .timestamp()
            .checked_mul(TICKS_PER_SECOND)?
            .checked_add(sub)?
            .checked_add(UNIX_EPOCH_TICKS)
            .map(Self)
    }

    /// Converts a UTC instant to ticks, saturating at the `i64` bounds.
    #[must_use]
    pub fn from_datetime(value: DateTime<Utc>) -> Self {
        Self::checked_from_datetime(value).unwrap_or(if value.timestamp() < 0 {
            Self(i64::MIN)
        } else {
            Self(i64::MAX)
        })
    }

    /// Converts ticks back to a UTC instant.
    ///
    /// Returns `None` if the tick count is outside the representable range.
    #[must_use]
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        let since_epoch = self.0.checked_sub(UNIX_EPOCH_TICKS)?;
        let secs = since_epoch.div_euclid(TICKS_PER_SECOND);
        let sub = since_epoch.rem_euclid(TICKS_PER_SECOND);
        let nanos = u32::try_from(sub * 100).ok()?;
        DateTime::from_timestamp(secs, nanos)
    }
}

impl fmt::Display for Ticks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<DateTime<Utc>> for Ticks {
    fn from(value: DateTime<Utc>) -> Self {
        Self::from_datetime(value)
    }
}

/// Returns the current UTC time truncated to tick precision.
#[must_use]
pub fn now_utc() -> DateTime<Utc> {
    truncate_to_ticks(Utc::now())
}

/// Drops precision below 100 ns.
#[must_use]
pub fn truncate_to_ticks(value: DateTime<Utc>) -> DateTime<Utc> {
    let nanos = value.nanosecond() / 100 * 100;
    value.with_nanosecond(nanos).unwrap_or(value)
}

/// The unset timestamp, `0001-01-01T00:00:00Z`.
#[must_use]
pub fn unset_timestamp() -> DateTime<Utc> {
    DateTime::from_timestamp(-UNIX_EPOCH_SECONDS, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Returns true if the timestamp is the unset value or earlier.
#[must_use]
pub fn is_unset(value: DateTime<Utc>) -> bool {
    value <= unset_timestamp()
}

/// Returns true if the timestamp has no tick representation.
#[must_use]
pub fn is_out_of_range(value: DateTime<Utc>) -> bool {
    Ticks::checked_from_datetime(value).is_none()
}

/// The UTC calendar day of an instant.
#[must_use]
pub fn day_of(value: DateTime<Utc>) -> NaiveDate {
    value.date_naive()
}
