//! # Connect Watchdog
//!
//! Timeout policy for "connecting but the server never answers". The
//! transport gives up silently; the connection flow owns the clock.
//!
//! ```text
//! start(now) ──> poll(now, connected) ──┬─ Connected  (stop polling)
//!                                       ├─ Waiting
//!                                       └─ TimedOut   (disconnect + report)
//! ```

use std::time::{Duration, Instant};

/// Result of one watchdog poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatchdogStatus {
    /// Not armed.
    Idle,
    /// Still within the window.
    Waiting,
    /// The connection came up in time.
    Connected,
    /// The window elapsed without a connection.
    TimedOut,
}

/// Connect timeout tracker.
#[derive(Clone, Copy, Debug)]
pub struct ConnectWatchdog {
    timeout: Duration,
    started: Option<Instant>,
}

impl ConnectWatchdog {
    /// Creates a disarmed watchdog.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            started: None,
        }
    }

    /// Arms the watchdog at `now`.
    pub fn start(&mut self, now: Instant) {
        self.started = Some(now);
    }

    /// Disarms the watchdog.
    pub fn cancel(&mut self) {
        self.started = None;
    }

    /// Returns true while armed.
    #[inline]
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.started.is_some()
    }

    /// Checks the connection against the window. `Connected` and
    /// `TimedOut` disarm the watchdog.
    pub fn poll(&mut self, now: Instant, is_connected: bool) -> WatchdogStatus {
        let Some(started) = self.started else {
            return WatchdogStatus::Idle;
        };
        if is_connected {
            self.started = None;
            return WatchdogStatus::Connected;
        }
        if now.saturating_duration_since(started) > self.timeout {
            self.started = None;
            return WatchdogStatus::TimedOut;
        }
        WatchdogStatus::Waiting
    }
}

impl Default for ConnectWatchdog {
    fn default() -> Self {
        Self::new(Duration::from_millis(crate::config::DEFAULT_CONNECT_TIMEOUT_MS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_until_started() {
        let mut watchdog = ConnectWatchdog::default();
        assert_eq!(watchdog.poll(Instant::now(), false), WatchdogStatus::Idle);
    }

    #[test]
    fn test_times_out_after_window() {
        let mut watchdog = ConnectWatchdog::default();
        let start = Instant::now();
        watchdog.start(start);

        assert_eq!(
            watchdog.poll(start + Duration::from_secs(5), false),
            WatchdogStatus::Waiting
        );
        assert_eq!(
            watchdog.poll(start + Duration::from_millis(5001), false),
            WatchdogStatus::TimedOut
        );
        assert!(!watchdog.is_armed());
    }

    #[test]
    fn test_connected_in_time() {
        let mut watchdog = ConnectWatchdog::new(Duration::from_secs(1));
        let start = Instant::now();
        watchdog.start(start);
        assert_eq!(
            watchdog.poll(start + Duration::from_millis(200), true),
            WatchdogStatus::Connected
        );
        assert_eq!(
            watchdog.poll(start + Duration::from_secs(10), false),
            WatchdogStatus::Idle
        );
    }
}
