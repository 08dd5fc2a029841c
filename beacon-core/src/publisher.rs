/// Fires at most once per interval of the millisecond clock.
///
/// The reference starts at 0, so the first interval ends `interval_ms`
/// after boot.
#[derive(Debug, Copy, Clone)]
pub struct PublishTimer {
    interval_ms: u64,
    last_ms: u64,
}

impl PublishTimer {
    pub const fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_ms: 0,
        }
    }

    /// True when the interval has elapsed, in which case a new window starts at `now`
    pub fn due(&mut self, now: u64) -> bool {
        if now.saturating_sub(self.last_ms) >= self.interval_ms {
            self.last_ms = now;
            true
        } else {
            false
        }
    }
}
