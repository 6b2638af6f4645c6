//! Exponential reconnect backoff.

use std::time::Duration;

/// Doubles the delay on each failed attempt, capped at `max`, and resets on
/// success. Used by a transport's reconnect loop between dropped connection
/// and the next `connect` attempt.
#[derive(Debug, Clone)]
pub struct ReconnectBackoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl ReconnectBackoff {
    #[must_use]
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            current: initial,
        }
    }

    /// The delay to wait before the next attempt, then advances the
    /// internal state for the attempt after that.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }

    /// Reset to the initial delay after a successful reconnect.
    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let mut b = ReconnectBackoff::new(Duration::from_millis(100), Duration::from_millis(350));
        assert_eq!(b.next_delay(), Duration::from_millis(100));
        assert_eq!(b.next_delay(), Duration::from_millis(200));
        assert_eq!(b.next_delay(), Duration::from_millis(350), "capped at max");
        assert_eq!(b.next_delay(), Duration::from_millis(350));
    }

    #[test]
    fn test_reset_returns_to_initial() {
        let mut b = ReconnectBackoff::new(Duration::from_millis(100), Duration::from_millis(1000));
        b.next_delay();
        b.next_delay();
        b.reset();
        assert_eq!(b.next_delay(), Duration::from_millis(100));
    }
}
