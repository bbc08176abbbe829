// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use tokio::sync::mpsc;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use crate::application::ingest_service::IngestService;
use crate::application::interaction_service::InteractionService;
use crate::application::monitor_service::MonitorService;
use crate::application::refresh_service::RefreshService;
use crate::application::series_store::SeriesStore;
use crate::application::telemetry_feed::TelemetryFeed;
use crate::infrastructure::config::{load_app_config, load_sensor_registry};
use crate::infrastructure::websocket_feed::WebSocketFeed;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    drawer_close, drawer_marker_clicks, events, get_drawer, get_snapshot, get_viewport, health_check,
    ingest_message, list_sensors, report_relayout, sensor_breaches, sensor_charts, sensor_detail, sensor_table,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_app_config().context("Failed to load config/landslide")?;
    let registry = load_sensor_registry().context("Failed to load config/sensors")?;

    // Store and services (application layer)
    let store = SeriesStore::new();
    let monitor_service = MonitorService::new(registry);
    tracing::info!(sensors = monitor_service.registry().len(), "Loaded sensor registry");
    let interaction_service = InteractionService::new(monitor_service.registry_keys());
    let refresh_service = RefreshService::new(monitor_service.clone(), store.clone());
    let ingest_service = IngestService::new(store.clone());

    // Single ingest queue: feed and HTTP pushes are applied one at a time
    let (ingest_tx, ingest_rx) = mpsc::channel(config.feed.channel_capacity);
    tokio::spawn(ingest_service.run(ingest_rx));
    tokio::spawn(refresh_service.clone().run());

    // Inbound feed (infrastructure layer)
    let feed = WebSocketFeed::new(
        config.feed.resolved_url(),
        Duration::from_secs(config.feed.reconnect_delay_secs),
    );
    let feed_tx = ingest_tx.clone();
    tokio::spawn(async move {
        if let Err(e) = feed.pump(feed_tx).await {
            tracing::error!("Telemetry feed stopped: {:#}", e);
        }
    });

    let state = Arc::new(AppState {
        store,
        monitor_service,
        interaction_service,
        refresh_service,
        ingest_tx,
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/snapshot", get(get_snapshot))
        .route("/sensors", get(list_sensors))
        .route("/sensors/:site/:sid", get(sensor_detail))
        .route("/sensors/:site/:sid/charts", get(sensor_charts))
        .route("/sensors/:site/:sid/table", get(sensor_table))
        .route("/sensors/:site/:sid/breaches", get(sensor_breaches))
        .route("/viewport", get(get_viewport))
        .route("/viewport/relayout", post(report_relayout))
        .route("/drawer", get(get_drawer))
        .route("/drawer/marker-clicks", post(drawer_marker_clicks))
        .route("/drawer/close", post(drawer_close))
        .route("/ingest", post(ingest_message))
        .route("/events", get(events))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.server.bind))?;
    tracing::info!("Starting landslide-telemetry service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
