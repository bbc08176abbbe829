// Monitor service - marker board and per-sensor views over one store snapshot
use crate::application::series_store::StoreSnapshot;
use crate::domain::breach::{breach_log, has_recent_breach, BREACH_THRESHOLD};
use crate::domain::dashboard::{
    format_last_seen, BreachLogRow, ChartPoint, ChartView, MarkerBoard, MarkerView, SensorDetail, TableRow,
    ThresholdGuide,
};
use crate::domain::sensor::{Axis, SensorKey, SensorMeta, SensorSeries};
use crate::domain::status::{infer_status, Status, STALE_AFTER_HOURS};
use crate::domain::viewport::{ViewportRange, XAxisLayout};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Rows shown by the table view.
pub const TABLE_ROWS: usize = 50;

#[derive(Clone)]
pub struct MonitorService {
    registry: Arc<Vec<SensorMeta>>,
}

impl MonitorService {
    pub fn new(registry: Vec<SensorMeta>) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &[SensorMeta] {
        &self.registry
    }

    pub fn registry_keys(&self) -> Vec<SensorKey> {
        self.registry.iter().map(|m| m.key().clone()).collect()
    }

    /// Registry lookup by site and (unpadded or padded) local id.
    pub fn find(&self, site: &str, sid: &str) -> Option<&SensorMeta> {
        let key = SensorKey::new(site, sid)?;
        self.find_key(&key)
    }

    pub fn find_key(&self, key: &SensorKey) -> Option<&SensorMeta> {
        self.registry.iter().find(|m| m.key() == key)
    }

    pub fn marker_board(&self, snapshot: &StoreSnapshot, now: DateTime<Utc>) -> MarkerBoard {
        let markers = self
            .registry
            .iter()
            .map(|meta| {
                let series = snapshot.get(meta.key());
                let status = evaluate(series, now);
                MarkerView {
                    id: meta.global_id.clone(),
                    key: meta.key().to_string(),
                    name: meta.display_name.clone(),
                    site: meta.site.clone(),
                    sid: meta.local_id.clone(),
                    lat: meta.lat,
                    lon: meta.lon,
                    status,
                    label: status.label(),
                    color: status.color(),
                    last_seen: format_last_seen(series.and_then(SensorSeries::last_seen)),
                }
            })
            .collect();

        MarkerBoard {
            version: snapshot.version,
            generated_at: now,
            markers,
        }
    }

    pub fn sensor_detail(&self, snapshot: &StoreSnapshot, meta: &SensorMeta, now: DateTime<Utc>) -> SensorDetail {
        let series = snapshot.get(meta.key());
        let status = evaluate(series, now);
        SensorDetail {
            key: meta.key().to_string(),
            name: meta.display_name.clone(),
            status,
            label: status.label(),
            has_breach: series.is_some_and(has_recent_breach),
            last_seen: format_last_seen(series.and_then(SensorSeries::last_seen)),
            last_status: series.and_then(|s| s.last_status_text().map(str::to_string)),
            samples: series.map_or(0, |s| s.samples().len()),
            no_data: series.is_none_or(SensorSeries::is_empty),
        }
    }

    /// One chart per axis, all carrying the shared viewport.
    pub fn charts(&self, snapshot: &StoreSnapshot, meta: &SensorMeta, viewport: &ViewportRange) -> Vec<ChartView> {
        let series = snapshot.get(meta.key());
        Axis::ALL
            .iter()
            .map(|&axis| {
                let samples = series.map_or(&[][..], SensorSeries::samples);
                let threshold = match (samples.first(), samples.last()) {
                    (Some(first), Some(last)) => Some(ThresholdGuide {
                        value: BREACH_THRESHOLD,
                        start: first.time,
                        end: last.time,
                    }),
                    _ => None,
                };
                ChartView {
                    axis,
                    title: meta.display_name.clone(),
                    points: samples
                        .iter()
                        .map(|s| ChartPoint { time: s.time, value: s.value(axis) })
                        .collect(),
                    threshold,
                    xaxis: XAxisLayout::for_viewport(viewport),
                }
            })
            .collect()
    }

    pub fn table(&self, snapshot: &StoreSnapshot, meta: &SensorMeta) -> Vec<TableRow> {
        snapshot
            .get(meta.key())
            .map(|s| s.tail(TABLE_ROWS).iter().map(TableRow::from).collect())
            .unwrap_or_default()
    }

    /// Breach intervals over the full series; `None` when there is no data.
    pub fn breach_log(&self, snapshot: &StoreSnapshot, meta: &SensorMeta) -> Option<Vec<BreachLogRow>> {
        let series = snapshot.get(meta.key()).filter(|s| !s.is_empty())?;
        Some(breach_log(series).iter().map(BreachLogRow::from).collect())
    }
}

fn evaluate(series: Option<&SensorSeries>, now: DateTime<Utc>) -> Status {
    let has_breach = series.is_some_and(has_recent_breach);
    infer_status(
        series.and_then(SensorSeries::last_seen),
        has_breach,
        series.and_then(SensorSeries::last_status_text),
        STALE_AFTER_HOURS,
        now,
    )
}
