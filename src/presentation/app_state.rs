// Application state for HTTP handlers
use crate::application::interaction_service::InteractionService;
use crate::application::monitor_service::MonitorService;
use crate::application::refresh_service::RefreshService;
use crate::application::series_store::SeriesStore;
use tokio::sync::mpsc;

#[derive(Clone)]
pub struct AppState {
    pub store: SeriesStore,
    pub monitor_service: MonitorService,
    pub interaction_service: InteractionService,
    pub refresh_service: RefreshService,
    /// Same queue the WebSocket feed writes to.
    pub ingest_tx: mpsc::Sender<String>,
}
