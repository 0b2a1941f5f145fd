//! Fixed-delay debouncing for search input.

use std::time::{Duration, Instant};

pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Holds the latest value until it has been stable for `delay`.
///
/// Every `push` restarts the timer, so of a burst of rapid inputs only the
/// final value is ever released.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.delay));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending value will be released.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at)
    }

    /// Release the pending value once its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, at)) if now >= *at => self.pending.take().map(|(value, _)| value),
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_final_value_is_released() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DEFAULT_SEARCH_DEBOUNCE);

        debouncer.push("t", start);
        debouncer.push("ta", start + Duration::from_millis(100));
        debouncer.push("tas", start + Duration::from_millis(200));

        assert_eq!(debouncer.poll(start + Duration::from_millis(450)), None);
        assert_eq!(
            debouncer.poll(start + Duration::from_millis(500)),
            Some("tas")
        );
        assert!(!debouncer.is_pending());
        assert_eq!(debouncer.poll(start + Duration::from_secs(5)), None);
    }

    #[test]
    fn test_cancel_discards_pending_value() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(10));
        debouncer.push(1, start);
        assert_eq!(debouncer.deadline(), Some(start + Duration::from_millis(10)));
        debouncer.cancel();
        assert_eq!(debouncer.poll(start + Duration::from_secs(1)), None);
    }
}
