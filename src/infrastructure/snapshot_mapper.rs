// Mapper from store snapshots to the outbound normalized snapshot document
use crate::application::series_store::StoreSnapshot;
use crate::domain::sensor::SensorSeries;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
pub struct SnapshotDocument {
    pub updated_at: Option<String>,
    pub sensors: BTreeMap<String, SeriesDocument>,
}

#[derive(Debug, Serialize)]
pub struct SeriesDocument {
    pub time: Vec<String>,
    #[serde(rename = "X")]
    pub x: Vec<Option<f64>>,
    #[serde(rename = "Y")]
    pub y: Vec<Option<f64>>,
    #[serde(rename = "Z")]
    pub z: Vec<Option<f64>>,
    pub last_seen: Option<String>,
    pub last_status: String,
}

pub fn snapshot_to_document(snapshot: &StoreSnapshot) -> SnapshotDocument {
    let sensors = snapshot
        .sensors()
        .map(|(key, series)| (key.to_string(), series_to_document(series)))
        .collect();

    SnapshotDocument {
        updated_at: snapshot.updated_at.clone(),
        sensors,
    }
}

fn series_to_document(series: &SensorSeries) -> SeriesDocument {
    let samples = series.samples();
    SeriesDocument {
        time: samples.iter().map(|s| s.time.to_rfc3339()).collect(),
        x: samples.iter().map(|s| s.x).collect(),
        y: samples.iter().map(|s| s.y).collect(),
        z: samples.iter().map(|s| s.z).collect(),
        last_seen: series.last_seen().map(|t| t.to_rfc3339()),
        last_status: series.last_status_text().unwrap_or_default().to_string(),
    }
}
