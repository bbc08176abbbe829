// Stream normalizer - raw feed message to canonical per-sensor series
use crate::domain::sensor::{Sample, SensorKey, SensorSeries};
use crate::domain::timestamp::{resolve_timestamp, NoTimestamp};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Site tags recognised in table names, checked in this order.
pub const KNOWN_SITES: &[&str] = &["adel_01", "adel_02", "adel_03", "adel_its_01"];

/// Whole-message failures. The store is never touched when these occur.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("malformed stream message: {0}")]
    MalformedMessage(#[from] serde_json::Error),
    #[error("stream message is not a JSON object")]
    NotAnObject,
}

/// Why a single record (or a whole table) was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ItemRejection {
    #[error("table name matches no known site")]
    UnresolvableTable,
    #[error("record has no usable sensor id")]
    UnresolvableItem,
    #[error(transparent)]
    NoTimestamp(#[from] NoTimestamp),
}

#[derive(Debug, Deserialize)]
struct StreamMessage {
    #[serde(default)]
    timestamp: Option<Value>,
    #[serde(default)]
    tables: Map<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
struct TableContent {
    #[serde(default)]
    items: Vec<Value>,
}

/// One feed record with every recognised field and alternate key spelled out.
#[derive(Debug, Default, Deserialize)]
struct RawItem {
    #[serde(rename = "ID", default)]
    id: Option<Value>,
    #[serde(default)]
    direkam: Option<Value>,
    #[serde(default)]
    tanggal: Option<Value>,
    #[serde(default)]
    jam: Option<Value>,
    #[serde(default)]
    delta_x: Option<Value>,
    #[serde(default)]
    delta_y: Option<Value>,
    // present-but-null still shadows the legacy key
    #[serde(default, deserialize_with = "present")]
    delta_z: Option<Value>,
    #[serde(default)]
    delya_z: Option<Value>,
    #[serde(default)]
    status: Option<Value>,
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

impl RawItem {
    fn sensor_id(&self) -> Option<String> {
        self.id.as_ref().and_then(text)
    }

    fn z(&self) -> Option<&Value> {
        match &self.delta_z {
            Some(v) => Some(v),
            None => self.delya_z.as_ref(),
        }
    }

    fn status_text(&self) -> Option<String> {
        self.status.as_ref().and_then(Value::as_str).map(str::to_string)
    }

    fn to_sample(&self) -> Result<Sample, NoTimestamp> {
        let combined = self.direkam.as_ref().and_then(text);
        let date = self.tanggal.as_ref().and_then(text);
        let time = self.jam.as_ref().and_then(text);
        let ts = resolve_timestamp(combined.as_deref(), date.as_deref(), time.as_deref())?;

        Ok(Sample::new(
            ts,
            self.delta_x.as_ref().and_then(to_float),
            self.delta_y.as_ref().and_then(to_float),
            self.z().and_then(to_float),
        ))
    }
}

fn text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Lenient numeric coercion: anything unreadable is simply absent.
pub fn to_float(v: &Value) -> Option<f64> {
    let f = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    f.is_finite().then_some(f)
}

/// First known site tag contained in a table name.
pub fn site_from_table(table: &str) -> Option<&'static str> {
    let lower = table.to_lowercase();
    KNOWN_SITES.iter().copied().find(|tag| lower.contains(tag))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    /// Items seen across every table, including tables with no known site.
    pub items: usize,
    /// Tables skipped whole; counted once per table.
    pub unresolvable_tables: usize,
    /// Items carried by the skipped tables.
    pub skipped_table_items: usize,
    /// Records in a known table with no usable sensor id.
    pub unresolvable_items: usize,
    pub no_timestamp: usize,
    pub empty_buckets: usize,
}

impl NormalizeStats {
    fn reject(&mut self, rejection: ItemRejection) {
        match rejection {
            ItemRejection::UnresolvableTable => self.unresolvable_tables += 1,
            ItemRejection::UnresolvableItem => self.unresolvable_items += 1,
            ItemRejection::NoTimestamp(_) => self.no_timestamp += 1,
        }
    }
}

/// Parse output of one message: a fresh series for every sensor key that
/// produced at least one valid sample.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedMessage {
    pub updated_at: Option<String>,
    pub series: BTreeMap<SensorKey, SensorSeries>,
    pub stats: NormalizeStats,
}

pub fn normalize(raw: &str) -> Result<NormalizedMessage, IngestError> {
    let value: Value = serde_json::from_str(raw)?;
    normalize_value(value)
}

pub fn normalize_value(value: Value) -> Result<NormalizedMessage, IngestError> {
    if !value.is_object() {
        return Err(IngestError::NotAnObject);
    }
    let message: StreamMessage = serde_json::from_value(value)?;
    let mut stats = NormalizeStats::default();

    let mut buckets: BTreeMap<SensorKey, Vec<RawItem>> = BTreeMap::new();
    for (table, content) in message.tables {
        let content: TableContent = serde_json::from_value(content).unwrap_or_default();
        stats.items += content.items.len();

        let Some(site) = site_from_table(&table) else {
            tracing::debug!(table = %table, items = content.items.len(), "{}", ItemRejection::UnresolvableTable);
            stats.reject(ItemRejection::UnresolvableTable);
            stats.skipped_table_items += content.items.len();
            continue;
        };

        for item in content.items {
            match decode_item(site, item) {
                Ok((key, item)) => buckets.entry(key).or_default().push(item),
                Err(rejection) => {
                    tracing::debug!(table = %table, "skipping record: {}", rejection);
                    stats.reject(rejection);
                }
            }
        }
    }

    let mut series = BTreeMap::new();
    for (key, items) in buckets {
        let mut samples = Vec::with_capacity(items.len());
        let mut statuses = Vec::with_capacity(items.len());
        for item in &items {
            match item.to_sample() {
                Ok(sample) => {
                    samples.push(sample);
                    statuses.push(item.status_text());
                }
                Err(e) => {
                    tracing::debug!(sensor = %key, "skipping record: {}", e);
                    stats.reject(e.into());
                }
            }
        }

        match SensorSeries::from_arrivals(samples, |idx| statuses.get_mut(idx).and_then(Option::take)) {
            Some(s) => {
                series.insert(key, s);
            }
            None => stats.empty_buckets += 1,
        }
    }

    Ok(NormalizedMessage {
        updated_at: message.timestamp.as_ref().and_then(|v| match v {
            Value::Null => None,
            other => text(other).or_else(|| Some(other.to_string())),
        }),
        series,
        stats,
    })
}

fn decode_item(site: &str, item: Value) -> Result<(SensorKey, RawItem), ItemRejection> {
    let item: RawItem = serde_json::from_value(item).map_err(|_| ItemRejection::UnresolvableItem)?;
    let sid = item.sensor_id().ok_or(ItemRejection::UnresolvableItem)?;
    let key = SensorKey::new(site, &sid).ok_or(ItemRejection::UnresolvableItem)?;
    Ok((key, item))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn key(site: &str, sid: &str) -> SensorKey {
        SensorKey::new(site, sid).unwrap()
    }

    #[test]
    fn test_site_from_table() {
        assert_eq!(site_from_table("data_ADEL_ITS_01_sensor"), Some("adel_its_01"));
        assert_eq!(site_from_table("adel_02_log"), Some("adel_02"));
        assert_eq!(site_from_table("unrelated"), None);
    }

    #[test]
    fn test_to_float() {
        assert_eq!(to_float(&json!(0.5)), Some(0.5));
        assert_eq!(to_float(&json!(" -1.25 ")), Some(-1.25));
        assert_eq!(to_float(&json!("abc")), None);
        assert_eq!(to_float(&json!("NaN")), None);
        assert_eq!(to_float(&Value::Null), None);
        assert_eq!(to_float(&json!(true)), None);
    }

    #[test]
    fn test_normalize_groups_pads_and_sorts() {
        let msg = json!({
            "timestamp": "2025-09-01T00:00:00Z",
            "tables": {
                "adel_its_01_data": {"items": [
                    {"ID": 7, "direkam": "2025-09-01 02:00:00", "delta_x": "1.5", "delta_y": 0.1, "delta_z": 0.2, "status": "on"},
                    {"ID": "007", "tanggal": "2025-09-01", "jam": "01:00:00", "delta_x": 0.3, "delta_y": "x", "delya_z": 0.4, "status": "cek"},
                    {"ID": " 2 ", "direkam": "2025-09-01 00:30:00", "delta_x": 0.0}
                ]},
                "weather": {"items": [
                    {"ID": 1, "direkam": "2025-09-01 00:00:00"},
                    {"ID": 2, "direkam": "2025-09-01 00:00:00"}
                ]}
            }
        });

        let out = normalize_value(msg).unwrap();
        assert_eq!(out.updated_at.as_deref(), Some("2025-09-01T00:00:00Z"));
        assert_eq!(out.series.len(), 2);
        assert_eq!(out.stats.unresolvable_tables, 1);
        assert_eq!(out.stats.skipped_table_items, 2);

        let s = &out.series[&key("adel_its_01", "7")];
        let times: Vec<_> = s.samples().iter().map(|x| x.time).collect();
        assert_eq!(
            times,
            vec![
                Utc.with_ymd_and_hms(2025, 9, 1, 1, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2025, 9, 1, 2, 0, 0).unwrap(),
            ]
        );
        assert_eq!(s.samples()[0].y, None);
        assert_eq!(s.samples()[0].z, Some(0.4));
        assert_eq!(s.samples()[1].x, Some(1.5));
        assert_eq!(s.last_seen(), Some(times[1]));
        assert_eq!(s.last_status_text(), Some("ON"));

        assert!(out.series.contains_key(&key("adel_its_01", "002")));
    }

    #[test]
    fn test_unparseable_records_are_dropped() {
        let msg = json!({"tables": {"adel_01": {"items": [
            {"ID": 1, "direkam": "garbage", "delta_x": 9.0},
            {"ID": 1, "direkam": "2025-09-01 00:00:00", "delta_x": 0.5},
            {"ID": 1, "delta_x": 0.7}
        ]}}});
        let out = normalize_value(msg).unwrap();
        let s = &out.series[&key("adel_01", "1")];
        assert_eq!(s.samples().len(), 1);
        assert_eq!(s.samples()[0].x, Some(0.5));
        assert_eq!(out.stats.no_timestamp, 2);
    }

    #[test]
    fn test_bucket_without_valid_samples_is_skipped() {
        let msg = json!({"tables": {"adel_its_01": {"items": [{"ID": 1, "direkam": "nope"}]}}});
        let out = normalize_value(msg).unwrap();
        assert!(out.series.is_empty());
        assert_eq!(out.stats.empty_buckets, 1);
    }

    #[test]
    fn test_null_delta_z_shadows_legacy_key() {
        let msg = json!({"tables": {"adel_03": {"items": [
            {"ID": 4, "direkam": "2025-09-01 00:00:00", "delta_z": null, "delya_z": 3.0}
        ]}}});
        let out = normalize_value(msg).unwrap();
        assert_eq!(out.series[&key("adel_03", "4")].samples()[0].z, None);
    }

    #[test]
    fn test_items_without_id_are_discarded() {
        let msg = json!({"tables": {"adel_02": {"items": [
            {"direkam": "2025-09-01 00:00:00"},
            {"ID": "  ", "direkam": "2025-09-01 00:00:00"},
            {"ID": null, "direkam": "2025-09-01 00:00:00"},
            "not an object"
        ]}}});
        let out = normalize_value(msg).unwrap();
        assert!(out.series.is_empty());
        assert_eq!(out.stats.unresolvable_items, 4);
    }

    #[test]
    fn test_malformed_messages_are_rejected() {
        assert!(matches!(normalize("{not json"), Err(IngestError::MalformedMessage(_))));
        assert!(matches!(normalize("[1, 2]"), Err(IngestError::NotAnObject)));
        assert!(matches!(normalize(r#"{"tables": 5}"#), Err(IngestError::MalformedMessage(_))));
    }

    #[test]
    fn test_identical_messages_normalize_identically() {
        let raw = r#"{"timestamp": "t", "tables": {"adel_its_01": {"items": [
            {"ID": 1, "direkam": "2025-09-01 00:00:00", "delta_x": 0.5, "status": "cek"},
            {"ID": 1, "direkam": "2025-09-01 00:00:00", "delta_x": 0.6, "status": "on"}
        ]}}}"#;
        let a = normalize(raw).unwrap();
        let b = normalize(raw).unwrap();
        assert_eq!(a, b);
        // equal times: arrival order kept, last arrival provides the status
        assert_eq!(a.series[&key("adel_its_01", "1")].last_status_text(), Some("ON"));
    }
}
