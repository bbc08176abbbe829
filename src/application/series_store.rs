// Sensor series store - versioned snapshots swapped atomically per message
use crate::application::stream_normalizer::NormalizedMessage;
use crate::domain::sensor::{SensorKey, SensorSeries};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::watch;

/// Immutable view of every sensor's latest series. Readers hold one of these
/// for a whole render pass.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub version: u64,
    pub updated_at: Option<String>,
    sensors: BTreeMap<SensorKey, Arc<SensorSeries>>,
}

impl StoreSnapshot {
    pub fn get(&self, key: &SensorKey) -> Option<&SensorSeries> {
        self.sensors.get(key).map(Arc::as_ref)
    }

    pub fn sensors(&self) -> impl Iterator<Item = (&SensorKey, &SensorSeries)> {
        self.sensors.iter().map(|(k, v)| (k, v.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }
}

/// Single-writer store. `apply` publishes a new snapshot; entries for keys
/// absent from a message are carried over untouched.
#[derive(Clone)]
pub struct SeriesStore {
    tx: Arc<watch::Sender<Arc<StoreSnapshot>>>,
}

impl SeriesStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(StoreSnapshot::default()));
        Self { tx: Arc::new(tx) }
    }

    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<StoreSnapshot>> {
        self.tx.subscribe()
    }

    /// Replace the entries this message produced series for and return the
    /// new snapshot version.
    pub fn apply(&self, message: NormalizedMessage) -> u64 {
        let mut version = 0;
        self.tx.send_modify(|current| {
            let mut next = (**current).clone();
            next.version += 1;
            if message.updated_at.is_some() {
                next.updated_at = message.updated_at;
            }
            for (key, series) in message.series {
                next.sensors.insert(key, Arc::new(series));
            }
            version = next.version;
            *current = Arc::new(next);
        });
        version
    }
}
