// WebSocket client for the telemetry push channel
use crate::application::telemetry_feed::TelemetryFeed;
use anyhow::Context;
use async_trait::async_trait;
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

#[derive(Debug, Clone)]
pub struct WebSocketFeed {
    url: String,
    reconnect_delay: Duration,
}

#[derive(Debug, PartialEq)]
enum SessionEnd {
    Disconnected,
    SinkClosed,
}

impl WebSocketFeed {
    pub fn new(url: String, reconnect_delay: Duration) -> Self {
        Self { url, reconnect_delay }
    }

    async fn run_session(&self, sink: &mpsc::Sender<String>) -> anyhow::Result<SessionEnd> {
        let (mut ws, _response) = connect_async(self.url.as_str())
            .await
            .with_context(|| format!("Failed to connect to telemetry feed at {}", self.url))?;
        tracing::info!(url = %self.url, "Connected to telemetry feed");

        while let Some(frame) = ws.next().await {
            let frame = frame.context("Telemetry feed read failed")?;
            let Some(text) = frame_text(frame) else {
                continue;
            };
            if sink.send(text).await.is_err() {
                return Ok(SessionEnd::SinkClosed);
            }
        }

        Ok(SessionEnd::Disconnected)
    }
}

fn frame_text(frame: Message) -> Option<String> {
    match frame {
        Message::Text(text) => Some(text),
        Message::Binary(bytes) => match String::from_utf8(bytes) {
            Ok(text) => Some(text),
            Err(_) => {
                tracing::debug!("Ignoring non UTF-8 binary frame");
                None
            }
        },
        _ => None,
    }
}

#[async_trait]
impl TelemetryFeed for WebSocketFeed {
    async fn pump(&self, sink: mpsc::Sender<String>) -> anyhow::Result<()> {
        loop {
            match self.run_session(&sink).await {
                Ok(SessionEnd::SinkClosed) => return Ok(()),
                Ok(SessionEnd::Disconnected) => {
                    tracing::warn!(url = %self.url, "Telemetry feed closed the connection");
                }
                Err(e) => {
                    tracing::warn!("{:#}", e);
                }
            }

            if sink.is_closed() {
                return Ok(());
            }
            tracing::info!(delay_secs = self.reconnect_delay.as_secs(), "Reconnecting to telemetry feed");
            tokio::time::sleep(self.reconnect_delay).await;
        }
    }
}
