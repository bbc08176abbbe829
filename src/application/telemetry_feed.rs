// Feed trait for the inbound telemetry push channel
use async_trait::async_trait;
use tokio::sync::mpsc;

#[async_trait]
pub trait TelemetryFeed: Send + Sync {
    /// Forward raw stream messages into `sink` until the sink is closed.
    /// Connection failures are retried internally and never end the pump.
    async fn pump(&self, sink: mpsc::Sender<String>) -> anyhow::Result<()>;
}
