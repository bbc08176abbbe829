// Sensor status inference - staleness, explicit status text and breaches
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// A sensor silent for this long is offline regardless of anything else.
pub const STALE_AFTER_HOURS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Normal,
    Warning,
    Offline,
}

impl Status {
    pub fn label(&self) -> &'static str {
        match self {
            Status::Normal => "Device normal",
            Status::Warning => "Landslide warning",
            Status::Offline => "Device offline",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Status::Normal => "#16a34a",
            Status::Warning => "#dc2626",
            Status::Offline => "#6b7280",
        }
    }
}

/// Classify a sensor at instant `now`.
///
/// Staleness wins over everything: an explicit "ON" or a breach on a sensor
/// not heard from in `stale_hours` still reads as offline.
pub fn infer_status(
    last_seen: Option<DateTime<Utc>>,
    has_breach: bool,
    last_status_text: Option<&str>,
    stale_hours: i64,
    now: DateTime<Utc>,
) -> Status {
    let Some(last_seen) = last_seen else {
        return Status::Offline;
    };
    if now - last_seen >= Duration::hours(stale_hours) {
        return Status::Offline;
    }
    if last_status_text.is_some_and(|s| s.to_uppercase() == "ON") {
        return Status::Warning;
    }
    if has_breach {
        return Status::Warning;
    }
    Status::Normal
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_never_seen_is_offline() {
        assert_eq!(infer_status(None, false, None, 3, now()), Status::Offline);
        assert_eq!(infer_status(None, true, Some("ON"), 3, now()), Status::Offline);
    }

    #[test]
    fn test_staleness_overrides_on_and_breach() {
        let seen = now() - Duration::hours(4);
        assert_eq!(infer_status(Some(seen), true, Some("ON"), 3, now()), Status::Offline);
    }

    #[test]
    fn test_exactly_at_threshold_is_offline() {
        let seen = now() - Duration::hours(3);
        assert_eq!(infer_status(Some(seen), false, None, 3, now()), Status::Offline);
    }

    #[test]
    fn test_fresh_sensor_rules() {
        let seen = now() - Duration::hours(1);
        assert_eq!(infer_status(Some(seen), false, Some("cek"), 3, now()), Status::Normal);
        assert_eq!(infer_status(Some(seen), false, Some("on"), 3, now()), Status::Warning);
        assert_eq!(infer_status(Some(seen), true, Some("CEK"), 3, now()), Status::Warning);
        assert_eq!(infer_status(Some(seen), false, None, 3, now()), Status::Normal);
    }
}
