use std::time::Duration;

use tokio::time::Instant;

use crate::time::aligned_window_start;

/// Live fixed window counter for one (rule, scope key) pair
///
/// The counter only moves in two ways: `take` decrements it by permits that
/// were already checked to fit, and `roll` refills it to the maximum once a
/// whole reset period has elapsed since the window start.
#[derive(Debug)]
pub(crate) struct WindowCounter {
    remaining: u32,
    window_start: Instant,
    max_permits: u32,
    reset_period: Duration,
}

impl WindowCounter {
    pub fn new(max_permits: u32, reset_period: Duration, now: Instant) -> Self {
        Self { remaining: max_permits, window_start: now, max_permits, reset_period }
    }

    /// Start a new window if the current one has expired
    #[inline]
    pub fn roll(&mut self, now: Instant) {
        let start = aligned_window_start(self.window_start, now, self.reset_period);
        if start != self.window_start {
            self.window_start = start;
            self.remaining = self.max_permits;
        }
    }

    #[inline]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Back at full permits once rolled to `now`
    pub fn is_idle(&mut self, now: Instant) -> bool {
        self.roll(now);
        self.remaining == self.max_permits
    }

    /// Time left until the current window ends
    #[inline]
    pub fn time_until_reset(&self, now: Instant) -> Duration {
        (self.window_start + self.reset_period).saturating_duration_since(now)
    }

    /// Consume permits that are known to fit
    #[inline]
    pub fn take(&mut self, permits: u32) {
        debug_assert!(permits <= self.remaining, "take called without a capacity check");
        self.remaining = self.remaining.saturating_sub(permits);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_and_roll() {
        let start = Instant::now();
        let mut counter = WindowCounter::new(10, Duration::from_secs(1), start);

        counter.take(4);
        assert_eq!(counter.remaining(), 6);

        // Same window, nothing replenished
        counter.roll(start + Duration::from_millis(900));
        assert_eq!(counter.remaining(), 6);

        counter.roll(start + Duration::from_millis(1_100));
        assert_eq!(counter.remaining(), 10);
    }

    #[test]
    fn test_is_idle() {
        let start = Instant::now();
        let mut counter = WindowCounter::new(3, Duration::from_secs(1), start);
        assert!(counter.is_idle(start));

        counter.take(1);
        assert!(!counter.is_idle(start + Duration::from_millis(500)));
        assert!(counter.is_idle(start + Duration::from_millis(1_000)));
    }

    #[test]
    fn test_time_until_reset() {
        let start = Instant::now();
        let counter = WindowCounter::new(1, Duration::from_secs(1), start);

        assert_eq!(counter.time_until_reset(start + Duration::from_millis(250)), Duration::from_millis(750));
    }

    #[test]
    fn test_roll_after_idle_keeps_boundaries() {
        let start = Instant::now();
        let mut counter = WindowCounter::new(5, Duration::from_secs(1), start);
        counter.take(5);

        let now = start + Duration::from_millis(4_200);
        counter.roll(now);

        assert_eq!(counter.remaining(), 5);
        assert_eq!(counter.time_until_reset(now), Duration::from_millis(800));
    }
}
