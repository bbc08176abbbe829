// Dashboard view models - what the map, chart, table and log views render
use super::breach::BreachLogEntry;
use super::sensor::{Axis, Sample};
use super::status::Status;
use super::viewport::XAxisLayout;
use chrono::{DateTime, Utc};
use serde::Serialize;

const MINUTE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// "2025-01-01 10:00 UTC", or an em dash when never seen.
pub fn format_last_seen(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(ts) => format!("{} UTC", ts.format(MINUTE_FORMAT)),
        None => "—".to_string(),
    }
}

fn format_minute(ts: DateTime<Utc>) -> String {
    ts.format(MINUTE_FORMAT).to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerView {
    pub id: String,
    pub key: String,
    pub name: String,
    pub site: String,
    pub sid: String,
    pub lat: f64,
    pub lon: f64,
    pub status: Status,
    pub label: &'static str,
    pub color: &'static str,
    pub last_seen: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerBoard {
    pub version: u64,
    pub generated_at: DateTime<Utc>,
    pub markers: Vec<MarkerView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorDetail {
    pub key: String,
    pub name: String,
    pub status: Status,
    pub label: &'static str,
    pub has_breach: bool,
    pub last_seen: String,
    pub last_status: Option<String>,
    pub samples: usize,
    pub no_data: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub time: DateTime<Utc>,
    pub value: Option<f64>,
}

/// Dashed guide line at the breach threshold across the data's time span.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdGuide {
    pub value: f64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartView {
    pub axis: Axis,
    pub title: String,
    pub points: Vec<ChartPoint>,
    pub threshold: Option<ThresholdGuide>,
    pub xaxis: XAxisLayout,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub time: String,
    #[serde(rename = "X")]
    pub x: Option<f64>,
    #[serde(rename = "Y")]
    pub y: Option<f64>,
    #[serde(rename = "Z")]
    pub z: Option<f64>,
}

impl From<&Sample> for TableRow {
    fn from(s: &Sample) -> Self {
        Self {
            time: format_minute(s.time),
            x: s.x,
            y: s.y,
            z: s.z,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreachLogRow {
    pub axis: String,
    pub start: String,
    pub end: String,
}

impl From<&BreachLogEntry> for BreachLogRow {
    fn from(entry: &BreachLogEntry) -> Self {
        match entry {
            BreachLogEntry::Interval(i) => Self {
                axis: i.axis.to_string(),
                start: format_minute(i.start),
                end: format_minute(i.end),
            },
            BreachLogEntry::NoBreaches => Self {
                axis: "-".to_string(),
                start: "-".to_string(),
                end: "-".to_string(),
            },
        }
    }
}
