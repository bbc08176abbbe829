// Threshold breach detection over a sensor series
use super::sensor::{Axis, SensorSeries};
use chrono::{DateTime, Utc};

/// Alert threshold on |delta|, same unit as the feed's deltas.
pub const BREACH_THRESHOLD: f64 = 1.0;

/// Number of most recent samples inspected for the live breach flag.
pub const BREACH_WINDOW: usize = 50;

fn exceeds(value: Option<f64>) -> bool {
    value.is_some_and(|v| v.abs() > BREACH_THRESHOLD)
}

/// True if any of the latest `BREACH_WINDOW` samples breaches on any axis.
pub fn has_recent_breach(series: &SensorSeries) -> bool {
    series
        .tail(BREACH_WINDOW)
        .iter()
        .any(|s| Axis::ALL.iter().any(|axis| exceeds(s.value(*axis))))
}

/// A maximal run of consecutive above-threshold samples on one axis.
#[derive(Debug, Clone, PartialEq)]
pub struct BreachInterval {
    pub axis: Axis,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BreachLogEntry {
    Interval(BreachInterval),
    NoBreaches,
}

/// Scan the full series, axis by axis, for breach runs. A missing value
/// ends a run like a below-threshold one does.
pub fn breach_intervals(series: &SensorSeries) -> Vec<BreachInterval> {
    let mut intervals = Vec::new();

    for axis in Axis::ALL {
        let mut run: Option<(DateTime<Utc>, DateTime<Utc>)> = None;

        for sample in series.samples() {
            if exceeds(sample.value(axis)) {
                run = match run {
                    Some((start, _)) => Some((start, sample.time)),
                    None => Some((sample.time, sample.time)),
                };
            } else if let Some((start, end)) = run.take() {
                intervals.push(BreachInterval { axis, start, end });
            }
        }

        if let Some((start, end)) = run {
            intervals.push(BreachInterval { axis, start, end });
        }
    }

    intervals
}

/// Breach intervals for the log view, or a single placeholder entry.
pub fn breach_log(series: &SensorSeries) -> Vec<BreachLogEntry> {
    let intervals = breach_intervals(series);
    if intervals.is_empty() {
        return vec![BreachLogEntry::NoBreaches];
    }
    intervals.into_iter().map(BreachLogEntry::Interval).collect()
}
