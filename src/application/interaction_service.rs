// Interaction service - chart gestures and drawer events, rebroadcast to all views
use crate::domain::selection::{DrawerEvent, DrawerState};
use crate::domain::sensor::SensorKey;
use crate::domain::viewport::{reconcile, ViewportRange};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Clone)]
pub struct InteractionService {
    registry: Arc<Vec<SensorKey>>,
    viewport: Arc<watch::Sender<ViewportRange>>,
    drawer: Arc<watch::Sender<DrawerState>>,
}

impl InteractionService {
    pub fn new(registry: Vec<SensorKey>) -> Self {
        let (viewport, _) = watch::channel(ViewportRange::Autorange);
        let (drawer, _) = watch::channel(DrawerState::default());
        Self {
            registry: Arc::new(registry),
            viewport: Arc::new(viewport),
            drawer: Arc::new(drawer),
        }
    }

    pub fn viewport(&self) -> ViewportRange {
        *self.viewport.borrow()
    }

    pub fn subscribe_viewport(&self) -> watch::Receiver<ViewportRange> {
        self.viewport.subscribe()
    }

    /// Reconcile one pass of relayout reports from the chart views. When a
    /// gesture is found the resulting range is broadcast to every view.
    pub fn report_relayouts(&self, relayouts: &[Value]) -> Option<ViewportRange> {
        let next = reconcile(relayouts)?;
        tracing::debug!(?next, "Viewport gesture");
        self.viewport.send_replace(next);
        Some(next)
    }

    pub fn drawer(&self) -> DrawerState {
        self.drawer.borrow().clone()
    }

    /// Feed a drawer event through the state machine. The viewport is left
    /// alone, so the chosen time window survives switching sensors.
    pub fn handle_drawer(&self, event: DrawerEvent) -> DrawerState {
        self.drawer.send_if_modified(|state| state.handle(event, &self.registry));
        self.drawer()
    }
}
