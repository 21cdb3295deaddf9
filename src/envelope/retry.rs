// Per-call retry accounting with linear-scaled backoff

use std::time::Duration;

/// Attempt counter for a single logical call.
///
/// Owned by the engine for one call and discarded afterwards; never shared
/// across calls. Each granted retry waits `base_delay * attempt_number`, so
/// a budget of 3 yields waits of 1x, 2x, 3x the base delay and
/// `max_retries + 1` total sends.
#[derive(Debug)]
pub struct RetryState {
    attempts: u32,
    max_retries: u32,
    base_delay: Duration,
}

impl RetryState {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self { attempts: 0, max_retries, base_delay }
    }

    /// Retries consumed so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Register a failed send. Returns the delay to wait before resending,
    /// or `None` once the budget is exhausted.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempts >= self.max_retries {
            return None;
        }
        self.attempts += 1;
        Some(self.base_delay * self.attempts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delays_scale_linearly() {
        let mut retry = RetryState::new(3, Duration::from_millis(1000));
        assert_eq!(retry.next_delay(), Some(Duration::from_millis(1000)));
        assert_eq!(retry.next_delay(), Some(Duration::from_millis(2000)));
        assert_eq!(retry.next_delay(), Some(Duration::from_millis(3000)));
        assert_eq!(retry.next_delay(), None);
    }

    #[test]
    fn test_total_sends_is_budget_plus_one() {
        // Simulate the engine's send loop against a permanently-down server
        let mut retry = RetryState::new(3, Duration::from_millis(1));
        let mut sends = 0;
        loop {
            sends += 1; // a send happens, then fails
            if retry.next_delay().is_none() {
                break;
            }
        }
        assert_eq!(sends, 4);
    }

    #[test]
    fn test_zero_budget_never_retries() {
        let mut retry = RetryState::new(0, Duration::from_millis(1000));
        assert_eq!(retry.next_delay(), None);
        assert_eq!(retry.attempts(), 0);
    }
}
