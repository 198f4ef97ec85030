//! Due-date normalization.
//!
//! Every date that enters or leaves the store goes through [`normalize_date`],
//! which yields a single canonical form: an ISO-8601 UTC instant with
//! millisecond precision, e.g. `2024-01-15T00:00:00.000Z`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Utc};

use crate::{TaskStoreError, TaskStoreResult};

/// Naive date-time layouts, interpreted as UTC.
const NAIVE_DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Date-only layouts, interpreted as UTC midnight.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Offset-carrying layouts not covered by RFC 3339 / RFC 2822.
const OFFSET_DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M%:z",
    "%Y-%m-%d %H:%M%z",
];

/// A value that can be read as a point in time.
pub trait DateLike {
    /// Resolves the value to a UTC instant.
    fn to_utc(&self) -> TaskStoreResult<DateTime<Utc>>;
}

impl DateLike for str {
    fn to_utc(&self) -> TaskStoreResult<DateTime<Utc>> {
        parse_date_text(self)
    }
}

impl DateLike for String {
    fn to_utc(&self) -> TaskStoreResult<DateTime<Utc>> {
        parse_date_text(self)
    }
}

impl<Tz: TimeZone> DateLike for DateTime<Tz> {
    fn to_utc(&self) -> TaskStoreResult<DateTime<Utc>> {
        Ok(self.with_timezone(&Utc))
    }
}

impl DateLike for NaiveDateTime {
    fn to_utc(&self) -> TaskStoreResult<DateTime<Utc>> {
        Ok(self.and_utc())
    }
}

impl DateLike for NaiveDate {
    fn to_utc(&self) -> TaskStoreResult<DateTime<Utc>> {
        Ok(self.and_time(NaiveTime::MIN).and_utc())
    }
}

/// Normalizes a date-like value to the canonical stored form.
///
/// Fails with [`TaskStoreError::InvalidDate`] when the input cannot be parsed.
/// The function is idempotent: normalizing an already-normalized string
/// returns it unchanged.
pub fn normalize_date<D: DateLike + ?Sized>(input: &D) -> TaskStoreResult<String> {
    input.to_utc().map(|dt| format_instant(&dt))
}

/// Formats a UTC instant in the canonical stored form.
pub fn format_instant(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_date_text(input: &str) -> TaskStoreResult<DateTime<Utc>> {
    let text = input.trim();
    if text.is_empty() {
        return Err(TaskStoreError::invalid_date(input));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in OFFSET_DATE_TIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, format) {
            return Ok(dt.with_timezone(&Utc));
        }
    }

    // Zulu suffix on a layout RFC 3339 rejects, e.g. `2024-01-15T10:30Z`
    if let Some(dt) = text
        .strip_suffix(&['Z', 'z'][..])
        .and_then(parse_naive_date_time)
    {
        return Ok(dt.and_utc());
    }

    if let Some(dt) = parse_naive_date_time(text) {
        return Ok(dt.and_utc());
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Ok(date.and_time(NaiveTime::MIN).and_utc());
        }
    }

    if let Some(date) = parse_partial_date(text) {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Ok(dt.with_timezone(&Utc));
    }

    Err(TaskStoreError::invalid_date(input))
}

fn parse_naive_date_time(text: &str) -> Option<NaiveDateTime> {
    NAIVE_DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
}

/// Parses `YYYY-MM` (first of the month) and `YYYY` (first of January).
fn parse_partial_date(text: &str) -> Option<NaiveDate> {
    let digits = |s: &str, len: usize| s.len() == len && s.bytes().all(|b| b.is_ascii_digit());
    match text.split_once('-') {
        Some((year, month)) if digits(year, 4) && digits(month, 2) => {
            NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)
        }
        None if digits(text, 4) => NaiveDate::from_ymd_opt(text.parse().ok()?, 1, 1),
        _ => None,
    }
}
