//! # Fibonacci Backoff
//!
//! Requeue delays for devices whose reconciliation keeps failing. The delay
//! grows along the Fibonacci sequence, more slowly than an exponential backoff,
//! so a Packet API outage does not push retries out by hours.
//!
//! With the controller defaults the sequence is 30s, 30s, 60s, 90s, 150s,
//! 240s, 390s, then 600s (max).

use std::time::Duration;

/// Fibonacci backoff calculator
///
/// Each delay is the sum of the previous two, starting from `min` twice and
/// capped at `max`.
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    min: Duration,
    prev: Duration,
    current: Duration,
    max: Duration,
}

impl FibonacciBackoff {
    /// Create a new Fibonacci backoff between `min` and `max`
    #[must_use]
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            prev: Duration::ZERO,
            current: min,
            max,
        }
    }

    /// Get the next backoff duration and advance the sequence
    pub fn next_backoff(&mut self) -> Duration {
        let result = self.current;
        let next = self.prev + self.current;
        self.prev = self.current;
        self.current = next.min(self.max);
        result
    }

    /// Reset the backoff to the initial state
    pub fn reset(&mut self) {
        self.prev = Duration::ZERO;
        self.current = self.min;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: Duration = Duration::from_secs(30);
    const MAX: Duration = Duration::from_secs(600);

    #[test]
    fn test_fibonacci_backoff_sequence() {
        let mut backoff = FibonacciBackoff::new(MIN, MAX);

        let secs: Vec<u64> = (0..8).map(|_| backoff.next_backoff().as_secs()).collect();
        assert_eq!(secs, vec![30, 30, 60, 90, 150, 240, 390, 600]);
    }

    #[test]
    fn test_fibonacci_backoff_max_cap() {
        let mut backoff = FibonacciBackoff::new(MIN, MAX);
        for _ in 0..8 {
            backoff.next_backoff();
        }

        // 390 + 600 would exceed the cap
        assert_eq!(backoff.next_backoff(), MAX);
        assert_eq!(backoff.next_backoff(), MAX);
    }

    #[test]
    fn test_fibonacci_backoff_reset() {
        let mut backoff = FibonacciBackoff::new(MIN, MAX);
        backoff.next_backoff();
        backoff.next_backoff();
        backoff.next_backoff();

        backoff.reset();

        assert_eq!(backoff.next_backoff(), MIN);
        assert_eq!(backoff.next_backoff(), MIN);
        assert_eq!(backoff.next_backoff(), Duration::from_secs(60));
    }
}
