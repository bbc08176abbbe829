// Shared time-axis viewport for all chart views of the open sensor
use super::timestamp::parse_instant;
use chrono::{DateTime, Utc};
use serde::ser::{Serialize, Serializer};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewportRange {
    #[default]
    Autorange,
    Fixed {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

#[derive(serde::Serialize)]
struct Bounds {
    start: String,
    end: String,
}

// Broadcast shape: `null` for autorange, `{start, end}` otherwise.
impl Serialize for ViewportRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ViewportRange::Autorange => serializer.serialize_none(),
            ViewportRange::Fixed { start, end } => serializer.serialize_some(&Bounds {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            }),
        }
    }
}

/// A user gesture reported by one chart view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeGesture {
    Autorange,
    Explicit {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl RangeGesture {
    /// Decode a chart's relayout payload. Payloads that say nothing about
    /// the x axis (y-axis zoom, legend toggles, ...) yield `None`.
    pub fn from_relayout(relayout: &Value) -> Option<Self> {
        let obj = relayout.as_object()?;

        if obj.get("xaxis.autorange").is_some_and(is_truthy) {
            return Some(RangeGesture::Autorange);
        }

        let (mut r0, mut r1) = (obj.get("xaxis.range[0]"), obj.get("xaxis.range[1]"));
        if r0.is_none() || r1.is_none() {
            if let Some([a, b]) = obj.get("xaxis.range").and_then(Value::as_array).map(Vec::as_slice) {
                r0 = Some(a);
                r1 = Some(b);
            }
        }

        let start = gesture_instant(r0?)?;
        let end = gesture_instant(r1?)?;
        Some(RangeGesture::Explicit { start, end })
    }
}

fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Null => false,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

// Chart axes report either date strings or epoch milliseconds.
fn gesture_instant(v: &Value) -> Option<DateTime<Utc>> {
    match v {
        Value::String(s) => parse_instant(s),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

/// Reconcile one pass of relayout reports, in chart order. The first
/// report carrying a gesture decides; `None` means nothing to rebroadcast.
pub fn reconcile<'a, I>(relayouts: I) -> Option<ViewportRange>
where
    I: IntoIterator<Item = &'a Value>,
{
    relayouts
        .into_iter()
        .find_map(RangeGesture::from_relayout)
        .map(|gesture| match gesture {
            RangeGesture::Autorange => ViewportRange::Autorange,
            RangeGesture::Explicit { start, end } => ViewportRange::Fixed { start, end },
        })
}

/// X-axis layout of a rendered chart.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct XAxisLayout {
    pub autorange: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<[String; 2]>,
}

impl XAxisLayout {
    pub fn for_viewport(viewport: &ViewportRange) -> Self {
        let mut layout = Self { autorange: true, range: None };
        layout.apply(viewport);
        layout
    }

    /// Override this chart's own range with the shared viewport.
    pub fn apply(&mut self, viewport: &ViewportRange) {
        match viewport {
            ViewportRange::Autorange => {
                self.autorange = true;
                self.range = None;
            }
            ViewportRange::Fixed { start, end } => {
                self.autorange = false;
                self.range = Some([start.to_rfc3339(), end.to_rfc3339()]);
            }
        }
    }
}
