//! Refresh throttling.
//!
//! Queries trigger feed refreshes, but at most one per interval: the first
//! query after the interval has elapsed refreshes, everything else reads the
//! last published snapshot.
//!
//! The throttle runs on the monotonic clock, so a wall clock stepped back by
//! NTP cannot freeze refreshes.

use std::time::Duration;

use tokio::time::Instant;

/// Default minimum time between feed refreshes.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Tracks when the feeds were last fetched.
#[derive(Debug, Clone)]
pub struct RefreshThrottle {
    interval: Duration,
    last_refresh: Option<Instant>,
}

impl Default for RefreshThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_INTERVAL)
    }
}

impl RefreshThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_refresh: None,
        }
    }

    /// When a refresh was last started, `None` if never.
    pub fn last_refresh(&self) -> Option<Instant> {
        self.last_refresh
    }

    /// Whether a refresh at `now` is allowed.
    ///
    /// Always true before the first refresh. An instant earlier than the last
    /// refresh is never due.
    pub fn is_due(&self, now: Instant) -> bool {
        match self.last_refresh {
            None => true,
            Some(last) => now >= last && now.duration_since(last) >= self.interval,
        }
    }

    /// Claim the refresh slot if due.
    ///
    /// The instant is recorded before any fetching happens, so a failed or
    /// slow refresh still holds off the next one for a full interval.
    pub fn try_begin(&mut self, now: Instant) -> bool {
        if !self.is_due(now) {
            return false;
        }
        self.record(now);
        true
    }

    /// Record a refresh started at `now` regardless of the interval.
    pub fn record(&mut self, now: Instant) {
        self.last_refresh = Some(now);
    }
}
