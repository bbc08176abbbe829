// Ingest service - single-writer pipeline from raw messages to the store
use crate::application::series_store::SeriesStore;
use crate::application::stream_normalizer::{normalize, IngestError};
use tokio::sync::mpsc;

#[derive(Clone)]
pub struct IngestService {
    store: SeriesStore,
}

impl IngestService {
    pub fn new(store: SeriesStore) -> Self {
        Self { store }
    }

    /// Normalize one message and publish it. A rejected message leaves the
    /// store as it was.
    pub fn ingest(&self, raw: &str) -> Result<u64, IngestError> {
        let message = normalize(raw)?;
        let stats = message.stats.clone();
        let sensors = message.series.len();

        let version = self.store.apply(message);
        tracing::debug!(
            version,
            sensors,
            stored = self.store.snapshot().len(),
            items = stats.items,
            unresolvable_tables = stats.unresolvable_tables,
            skipped_table_items = stats.skipped_table_items,
            unresolvable_items = stats.unresolvable_items,
            no_timestamp = stats.no_timestamp,
            empty_buckets = stats.empty_buckets,
            "Applied stream message"
        );
        Ok(version)
    }

    /// Drain the queue one message at a time; each message is fully applied
    /// before the next is read.
    pub async fn run(self, mut rx: mpsc::Receiver<String>) {
        while let Some(raw) = rx.recv().await {
            if let Err(e) = self.ingest(&raw) {
                tracing::warn!("Dropping stream message: {}", e);
            }
        }
        tracing::info!("Ingest queue closed");
    }
}
