//! Event types for the client event loop.

use crate::api_client::ApiClientError;
use crate::controller::EffectResult;
use crate::optimistic::RefreshTicket;
use cinelist_core::ItemSnapshot;
use crossterm::event::{KeyEvent, MouseEvent};
use std::time::{Duration, Instant};

pub const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(400);

#[derive(Debug)]
pub enum ClientEvent {
    Input(KeyEvent),
    Mouse(MouseEvent),
    Tick,
    Resize { width: u16, height: u16 },
    /// A request spawned off the loop finished.
    Effect(EffectResult),
    /// A snapshot refresh finished. `ticket` was taken when it was requested.
    Snapshot {
        ticket: RefreshTicket,
        result: Result<ItemSnapshot, ApiClientError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickKind {
    Single,
    Double,
}

/// Pairs two presses on the same row within [`DOUBLE_CLICK_WINDOW`].
#[derive(Debug, Default)]
pub struct ClickTracker {
    last: Option<(usize, Instant)>,
}

impl ClickTracker {
    pub fn register(&mut self, row: usize, now: Instant) -> ClickKind {
        match self.last {
            Some((last_row, at))
                if last_row == row && now.duration_since(at) <= DOUBLE_CLICK_WINDOW =>
            {
                self.last = None;
                ClickKind::Double
            }
            _ => {
                self.last = Some((row, now));
                ClickKind::Single
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_press_on_same_row_is_double() {
        let mut tracker = ClickTracker::default();
        let t0 = Instant::now();
        assert_eq!(tracker.register(2, t0), ClickKind::Single);
        assert_eq!(
            tracker.register(2, t0 + Duration::from_millis(150)),
            ClickKind::Double
        );
        // A third press starts a new pair.
        assert_eq!(
            tracker.register(2, t0 + Duration::from_millis(200)),
            ClickKind::Single
        );
    }

    #[test]
    fn test_other_row_or_late_press_is_single() {
        let mut tracker = ClickTracker::default();
        let t0 = Instant::now();
        tracker.register(1, t0);
        assert_eq!(
            tracker.register(2, t0 + Duration::from_millis(100)),
            ClickKind::Single
        );
        assert_eq!(
            tracker.register(2, t0 + Duration::from_millis(600)),
            ClickKind::Single
        );
    }
}
