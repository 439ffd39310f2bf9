//! Trailing debounce for bursts of drawing changes.
//!
//! The debouncer is driven by explicit timestamps instead of a timer thread:
//! the owner calls [`Debouncer::notify`] for every change and polls
//! [`Debouncer::poll`] from its frame loop. A burst of notifications fires
//! exactly once, `interval` after the last one.

use std::time::{Duration, Instant};

/// Quiet period after the last change before a drawing counts as finished.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Coalesces change notifications into a single trailing signal.
#[derive(Debug, Clone)]
pub struct Debouncer {
    interval: Duration,
    deadline: Option<Instant>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl Debouncer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Record a change at `now`, pushing the deadline out by one interval.
    pub fn notify(&mut self, now: Instant) {
        self.deadline = Some(now + self.interval);
    }

    /// Returns true exactly once per burst, when `now` has reached the deadline.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                log::trace!("Debounce fired after {:?} of inactivity", self.interval);
                true
            }
            _ => false,
        }
    }

    /// Drop any pending signal.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Time left until the pending signal fires, if any.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|deadline| deadline.saturating_duration_since(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn test_idle_debouncer_never_fires() {
        let mut debouncer = Debouncer::default();
        assert!(!debouncer.is_pending());
        assert!(!debouncer.poll(Instant::now() + ms(10_000)));
    }

    #[test]
    fn test_fires_after_interval() {
        let start = Instant::now();
        let mut debouncer = Debouncer::default();
        debouncer.notify(start);

        assert!(!debouncer.poll(start + ms(499)));
        assert!(debouncer.poll(start + ms(500)));
        assert!(!debouncer.poll(start + ms(501)));
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn test_burst_fires_once() {
        let start = Instant::now();
        let mut debouncer = Debouncer::default();
        let mut fired = 0;

        // Continuous changes every 16 ms for two seconds.
        let mut t = start;
        while t < start + ms(2000) {
            debouncer.notify(t);
            if debouncer.poll(t) {
                fired += 1;
            }
            t += ms(16);
        }
        let last_change = t - ms(16);

        // Pause for 600 ms, polling every frame.
        while t <= last_change + ms(600) {
            if debouncer.poll(t) {
                fired += 1;
            }
            t += ms(16);
        }

        assert_eq!(fired, 1);
    }

    #[test]
    fn test_cancel() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(ms(100));
        debouncer.notify(start);
        debouncer.cancel();
        assert!(!debouncer.poll(start + ms(200)));
    }

    #[test]
    fn test_remaining() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(ms(100));
        assert_eq!(debouncer.remaining(start), None);
        debouncer.notify(start);
        assert_eq!(debouncer.remaining(start + ms(40)), Some(ms(60)));
        assert_eq!(debouncer.remaining(start + ms(400)), Some(Duration::ZERO));
    }
}
