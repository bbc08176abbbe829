// Sensor domain model - static registry metadata and canonical per-sensor series
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Sensor-local ids are left-padded with zeros to this many characters.
pub const SENSOR_ID_WIDTH: usize = 3;

/// Trim and zero-pad a sensor-local id. Empty ids have no key.
pub fn pad_sensor_id(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(format!("{:0>width$}", trimmed, width = SENSOR_ID_WIDTH))
}

/// Composite `site:paddedLocalId` identifier of one physical sensor.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SensorKey {
    pub site: String,
    pub sid: String,
}

impl SensorKey {
    pub fn new(site: &str, raw_sid: &str) -> Option<Self> {
        let site = site.trim();
        if site.is_empty() {
            return None;
        }
        Some(Self {
            site: site.to_string(),
            sid: pad_sensor_id(raw_sid)?,
        })
    }
}

impl fmt::Display for SensorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.site, self.sid)
    }
}

/// Registry entry, loaded once at startup and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorMeta {
    pub site: String,
    pub local_id: String,
    pub global_id: String,
    pub display_name: String,
    pub lat: f64,
    pub lon: f64,
    key: SensorKey,
}

impl SensorMeta {
    pub fn new(site: &str, local_id: &str, lat: f64, lon: f64, name: Option<String>) -> Option<Self> {
        let key = SensorKey::new(site, local_id)?;
        let local_id = local_id.trim().to_string();
        let display_name = name.unwrap_or_else(|| Self::format_name(&key.site, &local_id));
        Some(Self {
            site: key.site.clone(),
            global_id: format!("{}-{}", key.site.to_uppercase(), local_id),
            local_id,
            display_name,
            lat,
            lon,
            key,
        })
    }

    fn format_name(site: &str, local_id: &str) -> String {
        // "adel_its_01" -> "ADEL ITS 01 • 1"
        format!("{} • {}", site.replace('_', " ").to_uppercase(), local_id)
    }

    /// Key under which this sensor's series is stored; registry ids are
    /// padded exactly like feed ids so "1" and "001" meet.
    pub fn key(&self) -> &SensorKey {
        &self.key
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub time: DateTime<Utc>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

impl Sample {
    pub fn new(time: DateTime<Utc>, x: Option<f64>, y: Option<f64>, z: Option<f64>) -> Self {
        Self { time, x, y, z }
    }

    pub fn value(&self, axis: Axis) -> Option<f64> {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }
}

/// Canonical time series of one sensor.
///
/// `samples` is ascending by time (equal times keep arrival order) and
/// `last_seen` is the time of the final sample whenever samples exist.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SensorSeries {
    samples: Vec<Sample>,
    last_seen: Option<DateTime<Utc>>,
    last_status_text: Option<String>,
}

impl SensorSeries {
    /// Build a series from samples in arrival order. `status_of_latest`
    /// receives the index (in arrival order) of the sample that ends up last
    /// after sorting and returns its raw status text.
    pub fn from_arrivals<F>(arrivals: Vec<Sample>, status_of_latest: F) -> Option<Self>
    where
        F: FnOnce(usize) -> Option<String>,
    {
        let mut indexed: Vec<(usize, Sample)> = arrivals.into_iter().enumerate().collect();
        // stable: ties keep arrival order
        indexed.sort_by_key(|(_, s)| s.time);

        let (latest_idx, latest_time) = indexed.last().map(|(i, s)| (*i, s.time))?;
        let last_status_text = status_of_latest(latest_idx).map(|s| s.to_uppercase());

        Some(Self {
            samples: indexed.into_iter().map(|(_, s)| s).collect(),
            last_seen: Some(latest_time),
            last_status_text,
        })
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn last_seen(&self) -> Option<DateTime<Utc>> {
        self.last_seen
    }

    pub fn last_status_text(&self) -> Option<&str> {
        self.last_status_text.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The most recent `n` samples (fewer if the series is shorter).
    pub fn tail(&self, n: usize) -> &[Sample] {
        let start = self.samples.len().saturating_sub(n);
        &self.samples[start..]
    }
}
