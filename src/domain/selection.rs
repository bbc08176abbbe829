// Sensor drawer state - which sensor's detail panel is open
use super::sensor::SensorKey;

#[derive(Debug, Clone, PartialEq)]
pub enum DrawerState {
    Closed { last: Option<SensorKey> },
    Open(SensorKey),
}

impl Default for DrawerState {
    fn default() -> Self {
        DrawerState::Closed { last: None }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawerEvent {
    /// Click counters of every marker, in registry order.
    MarkerClicks(Vec<Option<u64>>),
    /// Click counter of the drawer's close button.
    Close(u64),
}

impl DrawerState {
    pub fn selected(&self) -> Option<&SensorKey> {
        match self {
            DrawerState::Open(key) => Some(key),
            DrawerState::Closed { last } => last.as_ref(),
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, DrawerState::Open(_))
    }

    /// Apply one event; returns whether the state changed. `registry` maps
    /// marker positions to sensor keys.
    pub fn handle(&mut self, event: DrawerEvent, registry: &[SensorKey]) -> bool {
        match event {
            DrawerEvent::MarkerClicks(counts) => {
                let mut best: Option<(usize, u64)> = None;
                for (idx, count) in counts.iter().enumerate() {
                    let count = count.unwrap_or(0);
                    if count > best.map_or(0, |(_, c)| c) {
                        best = Some((idx, count));
                    }
                }
                let Some(key) = best.and_then(|(idx, _)| registry.get(idx)) else {
                    return false;
                };
                *self = DrawerState::Open(key.clone());
                true
            }
            DrawerEvent::Close(n_clicks) => {
                if n_clicks == 0 || !self.is_open() {
                    return false;
                }
                let last = self.selected().cloned();
                *self = DrawerState::Closed { last };
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Vec<SensorKey> {
        ["1", "2", "3"]
            .iter()
            .map(|sid| SensorKey::new("adel_its_01", sid).unwrap())
            .collect()
    }

    #[test]
    fn test_most_clicked_marker_opens() {
        let mut state = DrawerState::default();
        let changed = state.handle(DrawerEvent::MarkerClicks(vec![Some(1), None, Some(4)]), &registry());
        assert!(changed);
        assert_eq!(state, DrawerState::Open(registry()[2].clone()));
    }

    #[test]
    fn test_ties_pick_first_marker() {
        let mut state = DrawerState::default();
        state.handle(DrawerEvent::MarkerClicks(vec![Some(2), Some(2)]), &registry());
        assert_eq!(state.selected(), Some(&registry()[0]));
    }

    #[test]
    fn test_no_clicks_no_change() {
        let mut state = DrawerState::default();
        assert!(!state.handle(DrawerEvent::MarkerClicks(vec![None, Some(0)]), &registry()));
        assert_eq!(state, DrawerState::Closed { last: None });
    }

    #[test]
    fn test_close_keeps_last_selection() {
        let mut state = DrawerState::Open(registry()[1].clone());
        assert!(!state.handle(DrawerEvent::Close(0), &registry()));
        assert!(state.handle(DrawerEvent::Close(1), &registry()));
        assert!(!state.is_open());
        assert_eq!(state.selected(), Some(&registry()[1]));
    }
}
