// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod snapshot_mapper;
pub mod websocket_feed;
