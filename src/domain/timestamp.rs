// Timestamp resolution for feed records - combined field or date + time pair
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// No timestamp candidate on a record could be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no parseable timestamp")]
pub struct NoTimestamp;

// Naive layouts accepted from the feed, all read as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%d-%m-%Y %H:%M:%S%.f",
    "%d-%m-%Y %H:%M",
    "%d/%m/%Y %H:%M:%S%.f",
    "%d/%m/%Y %H:%M",
];

const OFFSET_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];

/// Parse one textual instant. Offsets are honoured, naive inputs are UTC,
/// and a bare date means midnight UTC.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(dt) = OFFSET_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(raw, fmt).ok())
    {
        return Some(dt.with_timezone(&Utc));
    }

    // trailing "Z" without the "T" separator, or a spelled-out UTC zone
    let naive_input = raw
        .strip_suffix(" UTC")
        .or_else(|| raw.strip_suffix('Z'))
        .unwrap_or(raw)
        .trim_end();
    if let Some(naive) = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(naive_input, fmt).ok())
    {
        return Some(naive.and_utc());
    }

    NaiveDate::parse_from_str(naive_input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Resolve a record's instant: the combined field first, then `date time`.
/// A candidate that fails to parse falls through to the next one.
pub fn resolve_timestamp(
    combined: Option<&str>,
    date: Option<&str>,
    time: Option<&str>,
) -> Result<DateTime<Utc>, NoTimestamp> {
    if let Some(ts) = combined.and_then(parse_instant) {
        return Ok(ts);
    }
    match (date, time) {
        (Some(date), Some(time)) if !date.trim().is_empty() && !time.trim().is_empty() => {
            parse_instant(&format!("{} {}", date.trim(), time.trim())).ok_or(NoTimestamp)
        }
        _ => Err(NoTimestamp),
    }
}
