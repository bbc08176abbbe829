// HTTP request handlers
use crate::domain::dashboard::{BreachLogRow, ChartView, MarkerBoard, SensorDetail, TableRow};
use crate::domain::selection::{DrawerEvent, DrawerState};
use crate::domain::sensor::SensorMeta;
use crate::domain::viewport::ViewportRange;
use crate::infrastructure::snapshot_mapper::{snapshot_to_document, SnapshotDocument};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use chrono::Utc;
use futures::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio_stream::wrappers::WatchStream;

/// A sensor panel; `no_data` replaces an error when nothing was received.
#[derive(Debug, Serialize)]
pub struct Panel<T> {
    pub no_data: bool,
    pub rows: Vec<T>,
}

#[derive(Debug, Serialize)]
pub struct ChartsResponse {
    pub no_data: bool,
    pub viewport: ViewportRange,
    pub charts: Vec<ChartView>,
}

#[derive(Debug, Deserialize)]
pub struct RelayoutReport {
    #[serde(default)]
    pub relayouts: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct ViewportUpdate {
    pub changed: bool,
    pub viewport: ViewportRange,
}

#[derive(Debug, Deserialize)]
pub struct MarkerClicks {
    #[serde(default)]
    pub clicks: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
pub struct CloseClicks {
    #[serde(default)]
    pub n_clicks: u64,
}

#[derive(Debug, Serialize)]
pub struct DrawerView {
    pub open: bool,
    pub selected: Option<String>,
    pub name: Option<String>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Outbound normalized snapshot
pub async fn get_snapshot(State(state): State<Arc<AppState>>) -> Json<SnapshotDocument> {
    Json(snapshot_to_document(&state.store.snapshot()))
}

/// Map markers with status evaluated now
pub async fn list_sensors(State(state): State<Arc<AppState>>) -> Json<MarkerBoard> {
    Json(state.monitor_service.marker_board(&state.store.snapshot(), Utc::now()))
}

fn lookup<'a>(state: &'a AppState, site: &str, sid: &str) -> Result<&'a SensorMeta, StatusCode> {
    state.monitor_service.find(site, sid).ok_or(StatusCode::NOT_FOUND)
}

pub async fn sensor_detail(
    Path((site, sid)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<SensorDetail>, StatusCode> {
    let meta = lookup(&state, &site, &sid)?;
    let snapshot = state.store.snapshot();
    Ok(Json(state.monitor_service.sensor_detail(&snapshot, meta, Utc::now())))
}

pub async fn sensor_charts(
    Path((site, sid)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ChartsResponse>, StatusCode> {
    let meta = lookup(&state, &site, &sid)?;
    let snapshot = state.store.snapshot();
    let viewport = state.interaction_service.viewport();
    let charts = state.monitor_service.charts(&snapshot, meta, &viewport);
    Ok(Json(ChartsResponse {
        no_data: charts.iter().all(|c| c.points.is_empty()),
        viewport,
        charts,
    }))
}

pub async fn sensor_table(
    Path((site, sid)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Panel<TableRow>>, StatusCode> {
    let meta = lookup(&state, &site, &sid)?;
    let rows = state.monitor_service.table(&state.store.snapshot(), meta);
    Ok(Json(Panel {
        no_data: rows.is_empty(),
        rows,
    }))
}

pub async fn sensor_breaches(
    Path((site, sid)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Panel<BreachLogRow>>, StatusCode> {
    let meta = lookup(&state, &site, &sid)?;
    let panel = match state.monitor_service.breach_log(&state.store.snapshot(), meta) {
        Some(rows) => Panel { no_data: false, rows },
        None => Panel { no_data: true, rows: Vec::new() },
    };
    Ok(Json(panel))
}

pub async fn get_viewport(State(state): State<Arc<AppState>>) -> Json<ViewportRange> {
    Json(state.interaction_service.viewport())
}

/// Relayout reports from the chart views of the open sensor
pub async fn report_relayout(
    State(state): State<Arc<AppState>>,
    Json(report): Json<RelayoutReport>,
) -> Json<ViewportUpdate> {
    let changed = state.interaction_service.report_relayouts(&report.relayouts).is_some();
    Json(ViewportUpdate {
        changed,
        viewport: state.interaction_service.viewport(),
    })
}

fn drawer_view(state: &AppState, drawer: &DrawerState) -> DrawerView {
    let selected = drawer.selected();
    DrawerView {
        open: drawer.is_open(),
        selected: selected.map(|k| k.to_string()),
        name: selected
            .and_then(|k| state.monitor_service.find_key(k))
            .map(|m| m.display_name.clone()),
    }
}

pub async fn get_drawer(State(state): State<Arc<AppState>>) -> Json<DrawerView> {
    Json(drawer_view(&state, &state.interaction_service.drawer()))
}

pub async fn drawer_marker_clicks(
    State(state): State<Arc<AppState>>,
    Json(body): Json<MarkerClicks>,
) -> Json<DrawerView> {
    let drawer = state.interaction_service.handle_drawer(DrawerEvent::MarkerClicks(body.clicks));
    Json(drawer_view(&state, &drawer))
}

pub async fn drawer_close(State(state): State<Arc<AppState>>, Json(body): Json<CloseClicks>) -> Json<DrawerView> {
    let drawer = state.interaction_service.handle_drawer(DrawerEvent::Close(body.n_clicks));
    Json(drawer_view(&state, &drawer))
}

/// Push a raw stream message through the ingest queue
pub async fn ingest_message(State(state): State<Arc<AppState>>, body: String) -> StatusCode {
    match state.ingest_tx.send(body).await {
        Ok(()) => StatusCode::ACCEPTED,
        Err(_) => {
            tracing::error!("Ingest queue is closed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Server-sent marker boards (every store update and tick) and viewport broadcasts
pub async fn events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let boards = WatchStream::new(state.refresh_service.subscribe())
        .map(|board| Event::default().event("board").json_data(&*board));
    let viewports = WatchStream::new(state.interaction_service.subscribe_viewport())
        .map(|range| Event::default().event("viewport").json_data(range));

    Sse::new(stream::select(boards, viewports)).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::interaction_service::InteractionService;
    use crate::application::monitor_service::MonitorService;
    use crate::application::refresh_service::RefreshService;
    use crate::application::series_store::SeriesStore;
    use crate::application::stream_normalizer::normalize;
    use serde_json::json;
    use tokio::sync::mpsc;

    fn state() -> (Arc<AppState>, mpsc::Receiver<String>) {
        let store = SeriesStore::new();
        store.apply(
            normalize(
                r#"{"tables": {"adel_its_01": {"items": [
                {"ID": 1, "direkam": "2025-09-01 00:00:00", "delta_x": 0.2, "delta_y": 1.4},
                {"ID": 1, "direkam": "2025-09-01 00:10:00", "delta_x": 0.3, "delta_y": 0.1}]}}}"#,
            )
            .unwrap(),
        );
        let registry = vec![
            SensorMeta::new("adel_its_01", "1", -7.98, 111.71, None).unwrap(),
            SensorMeta::new("adel_its_01", "2", -7.98, 111.71, None).unwrap(),
        ];
        let monitor_service = MonitorService::new(registry);
        let interaction_service = InteractionService::new(monitor_service.registry_keys());
        let refresh_service = RefreshService::new(monitor_service.clone(), store.clone());
        let (ingest_tx, rx) = mpsc::channel(4);
        let state = AppState {
            store,
            monitor_service,
            interaction_service,
            refresh_service,
            ingest_tx,
        };
        (Arc::new(state), rx)
    }

    fn path(site: &str, sid: &str) -> Path<(String, String)> {
        Path((site.to_string(), sid.to_string()))
    }

    #[tokio::test]
    async fn test_unknown_sensor_is_not_found() {
        let (state, _rx) = state();
        let result = sensor_detail(path("adel_09", "1"), State(state)).await;
        assert_eq!(result.err(), Some(StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn test_sensor_without_data_shows_no_data() {
        let (state, _rx) = state();
        let Json(table) = sensor_table(path("adel_its_01", "2"), State(state.clone())).await.unwrap();
        assert!(table.no_data);
        let Json(log) = sensor_breaches(path("adel_its_01", "002"), State(state)).await.unwrap();
        assert!(log.no_data);
    }

    #[tokio::test]
    async fn test_breach_log_endpoint() {
        let (state, _rx) = state();
        let Json(log) = sensor_breaches(path("adel_its_01", "1"), State(state)).await.unwrap();
        assert!(!log.no_data);
        assert_eq!(log.rows.len(), 1);
        assert_eq!(log.rows[0].axis, "Y");
        assert_eq!(log.rows[0].start, "2025-09-01 00:00");
    }

    #[tokio::test]
    async fn test_relayout_then_charts_use_shared_range() {
        let (state, _rx) = state();
        let report = RelayoutReport {
            relayouts: vec![json!({"xaxis.range": ["2025-09-01 00:00", "2025-09-01 00:05"]})],
        };
        let Json(update) = report_relayout(State(state.clone()), Json(report)).await;
        assert!(update.changed);

        let Json(charts) = sensor_charts(path("adel_its_01", "1"), State(state)).await.unwrap();
        assert!(!charts.no_data);
        assert!(charts.charts.iter().all(|c| c.xaxis.range.is_some()));
    }

    #[tokio::test]
    async fn test_drawer_flow() {
        let (state, _rx) = state();
        let Json(view) =
            drawer_marker_clicks(State(state.clone()), Json(MarkerClicks { clicks: vec![None, Some(1)] })).await;
        assert!(view.open);
        assert_eq!(view.selected.as_deref(), Some("adel_its_01:002"));
        assert_eq!(view.name.as_deref(), Some("ADEL ITS 01 • 2"));

        let Json(view) = drawer_close(State(state), Json(CloseClicks { n_clicks: 1 })).await;
        assert!(!view.open);
        assert_eq!(view.selected.as_deref(), Some("adel_its_01:002"));
    }

    #[tokio::test]
    async fn test_ingest_enqueues_raw_message() {
        let (state, mut rx) = state();
        assert_eq!(ingest_message(State(state), "{}".to_string()).await, StatusCode::ACCEPTED);
        assert_eq!(rx.recv().await.as_deref(), Some("{}"));
    }

    #[tokio::test]
    async fn test_snapshot_endpoint() {
        let (state, _rx) = state();
        let Json(doc) = get_snapshot(State(state)).await;
        assert_eq!(doc.sensors["adel_its_01:001"].time.len(), 2);
    }
}
