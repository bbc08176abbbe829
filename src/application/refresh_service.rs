// Refresh loop - re-evaluates sensor status on every store update and every tick
use crate::application::monitor_service::MonitorService;
use crate::application::series_store::SeriesStore;
use crate::domain::dashboard::MarkerBoard;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Fixed polling period; the only thing that ages a silent sensor into offline.
pub const STATUS_POLL_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct RefreshService {
    monitor: MonitorService,
    store: SeriesStore,
    board: Arc<watch::Sender<Arc<MarkerBoard>>>,
}

impl RefreshService {
    pub fn new(monitor: MonitorService, store: SeriesStore) -> Self {
        let initial = monitor.marker_board(&store.snapshot(), Utc::now());
        let (board, _) = watch::channel(Arc::new(initial));
        Self {
            monitor,
            store,
            board: Arc::new(board),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<MarkerBoard>> {
        self.board.subscribe()
    }

    /// One render pass over a single snapshot. Status changes against the
    /// previous board are logged.
    pub fn refresh(&self, now: DateTime<Utc>) -> Arc<MarkerBoard> {
        let snapshot = self.store.snapshot();
        let next = Arc::new(self.monitor.marker_board(&snapshot, now));

        let previous = self.board.borrow().clone();
        let before: HashMap<&str, _> = previous.markers.iter().map(|m| (m.key.as_str(), m.status)).collect();
        for marker in &next.markers {
            match before.get(marker.key.as_str()) {
                Some(old) if *old != marker.status => {
                    tracing::info!(
                        sensor = %marker.key,
                        from = ?old,
                        to = ?marker.status,
                        last_seen = %marker.last_seen,
                        "Sensor status changed"
                    );
                }
                _ => {}
            }
        }

        self.board.send_replace(next.clone());
        next
    }

    /// Recompute on every store update and every tick, for the life of the process.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(STATUS_POLL_INTERVAL);
        let mut updates = self.store.subscribe();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tracing::trace!("Status tick");
                }
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
            self.refresh(Utc::now());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::stream_normalizer::normalize;
    use crate::domain::sensor::SensorMeta;
    use crate::domain::status::Status;
    use chrono::{Duration as ChronoDuration, TimeZone};

    fn setup() -> (RefreshService, SeriesStore) {
        let store = SeriesStore::new();
        let monitor = MonitorService::new(vec![SensorMeta::new("adel_01", "5", 0.0, 0.0, None).unwrap()]);
        (RefreshService::new(monitor, store.clone()), store)
    }

    #[test]
    fn test_refresh_ages_sensor_without_new_messages() {
        let (svc, store) = setup();
        store.apply(
            normalize(r#"{"tables": {"adel_01": {"items": [{"ID": 5, "direkam": "2025-09-01 00:00:00"}]}}}"#)
                .unwrap(),
        );
        let t0 = Utc.with_ymd_and_hms(2025, 9, 1, 1, 0, 0).unwrap();

        assert_eq!(svc.refresh(t0).markers[0].status, Status::Normal);
        let aged = svc.refresh(t0 + ChronoDuration::hours(2));
        assert_eq!(aged.markers[0].status, Status::Offline);
        assert_eq!(aged.version, 1);
    }

    #[test]
    fn test_refresh_publishes_board() {
        let (svc, _store) = setup();
        let mut rx = svc.subscribe();
        svc.refresh(Utc::now());
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().markers.len(), 1);
    }

    #[tokio::test]
    async fn test_run_reacts_to_store_updates() {
        let (svc, store) = setup();
        let mut rx = svc.subscribe();
        let handle = tokio::spawn(svc.clone().run());

        let recent = (Utc::now() - ChronoDuration::minutes(5)).format("%Y-%m-%d %H:%M:%S").to_string();
        let raw = format!(r#"{{"tables": {{"adel_01": {{"items": [{{"ID": 5, "direkam": "{recent}"}}]}}}}}}"#);
        store.apply(normalize(&raw).unwrap());

        let board = tokio::time::timeout(std::time::Duration::from_secs(5), async {
            loop {
                rx.changed().await.unwrap();
                let board = rx.borrow_and_update().clone();
                if board.version == 1 {
                    return board;
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(board.markers[0].status, Status::Normal);
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_republishes_on_tick_without_store_updates() {
        let (svc, store) = setup();
        let mut rx = svc.subscribe();
        let handle = tokio::spawn(svc.clone().run());

        // the interval's first tick completes immediately
        rx.changed().await.unwrap();
        rx.borrow_and_update();
        let started = tokio::time::Instant::now();

        tokio::time::advance(STATUS_POLL_INTERVAL).await;
        rx.changed().await.unwrap();

        assert!(started.elapsed() >= STATUS_POLL_INTERVAL);
        assert_eq!(rx.borrow_and_update().version, 0);
        assert_eq!(store.snapshot().version, 0);
        handle.abort();
    }
}
