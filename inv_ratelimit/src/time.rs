use std::time::Duration;

use tokio::time::Instant;

/// Current monotonic time for window accounting
///
/// Uses tokio's clock so that paused-time tests drive window rollover. Outside
/// a runtime this is the plain std monotonic clock.
#[inline(always)]
pub(crate) fn now() -> Instant {
    Instant::now()
}

/// Start of the window containing `now`, for windows of `period` starting at `window_start`
#[inline]
pub(crate) fn aligned_window_start(window_start: Instant, now: Instant, period: Duration) -> Instant {
    let elapsed = now.saturating_duration_since(window_start);
    if elapsed < period {
        return window_start;
    }

    let period_nanos = period.as_nanos();
    let windows_elapsed = elapsed.as_nanos() / period_nanos;
    window_start + Duration::from_nanos((windows_elapsed * period_nanos) as u64)
}
