// Application layer - ingest pipeline, store and view services
pub mod ingest_service;
pub mod interaction_service;
pub mod monitor_service;
pub mod refresh_service;
pub mod series_store;
pub mod stream_normalizer;
pub mod telemetry_feed;
