//! Instants and date-string parsing.
//!
//! Dates are compared as [`Timestamp`]s: milliseconds since the Unix epoch,
//! UTC. A string counts as a date when it parses as one of:
//!
//! - RFC 3339 (`2024-01-29T10:00:00Z`, `2024-01-29T10:00:00.250+02:00`)
//! - ISO 8601 date-time without an offset, taken as UTC
//!   (`2024-01-29T10:00:00`, `2024-01-29 10:00`)
//! - a calendar date, taken as UTC midnight (`2024-01-29`)

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

const NAIVE_DATE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Timestamp value represented as milliseconds since Unix epoch.
///
/// # Example
///
/// ```
/// use ormfilter::Timestamp;
///
/// let ts = Timestamp::parse("2024-01-29").unwrap();
/// assert_eq!(ts, Timestamp::parse("2024-01-29T00:00:00Z").unwrap());
/// assert!(Timestamp(1000) < Timestamp(2000));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Creates a new timestamp from milliseconds since Unix epoch.
    pub fn from_millis(millis: i64) -> Self {
        Timestamp(millis)
    }

    /// Creates a new timestamp from seconds since Unix epoch.
    pub fn from_secs(secs: i64) -> Self {
        Timestamp(secs * 1000)
    }

    /// Returns the timestamp as milliseconds since Unix epoch.
    pub fn as_millis(self) -> i64 {
        self.0
    }

    /// Parses a date-string, returning `None` when it is not one.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(Timestamp(dt.timestamp_millis()));
        }
        for format in NAIVE_DATE_TIME_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
                return Some(Timestamp(naive.and_utc().timestamp_millis()));
            }
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| Timestamp(naive.and_utc().timestamp_millis()))
    }

    /// Formats the instant as RFC 3339 with millisecond precision.
    ///
    /// Returns `None` when the instant is outside chrono's representable range.
    pub fn to_rfc3339(self) -> Option<String> {
        DateTime::<Utc>::from_timestamp_millis(self.0)
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

impl From<i64> for Timestamp {
    fn from(millis: i64) -> Self {
        Timestamp(millis)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Timestamp(dt.timestamp_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_with_offset() {
        let utc = Timestamp::parse("2024-01-29T10:00:00Z").unwrap();
        let offset = Timestamp::parse("2024-01-29T12:00:00+02:00").unwrap();
        assert_eq!(utc, offset);
    }

    #[test]
    fn parses_naive_forms_as_utc() {
        let midnight = Timestamp::parse("2024-01-29").unwrap();
        assert_eq!(Timestamp::parse("2024-01-29T00:00:00").unwrap(), midnight);
        assert_eq!(Timestamp::parse("2024-01-29 00:00").unwrap(), midnight);
        assert_eq!(
            Timestamp::parse("2024-01-29T00:00:00.500").unwrap(),
            Timestamp(midnight.0 + 500)
        );
    }

    #[test]
    fn rejects_non_dates() {
        assert_eq!(Timestamp::parse("hello"), None);
        assert_eq!(Timestamp::parse("2024"), None);
        assert_eq!(Timestamp::parse("42"), None);
        assert_eq!(Timestamp::parse("2024-13-01"), None);
        assert_eq!(Timestamp::parse(""), None);
    }

    #[test]
    fn formats_like_iso_strings() {
        let ts = Timestamp::parse("2024-01-29T10:00:00.250Z").unwrap();
        assert_eq!(ts.to_rfc3339().as_deref(), Some("2024-01-29T10:00:00.250Z"));
    }

    #[test]
    fn timestamp_conversions() {
        assert_eq!(Timestamp::from_secs(1).as_millis(), 1000);
        assert_eq!(Timestamp::from(5000i64), Timestamp::from_millis(5000));
    }
}
