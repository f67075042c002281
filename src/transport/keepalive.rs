// ABOUTME: Keep-alive settings and failure tracking for the enquire_link task of a bound session
// ABOUTME: A session is declared dead after a run of consecutive unanswered enquire_link PDUs

use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for the periodic enquire_link sent on every bound session.
///
/// ```rust
/// use smpp_gateway::transport::KeepAliveConfig;
/// use std::time::Duration;
///
/// let config = KeepAliveConfig::new(Duration::from_secs(60))
///     .with_timeout(Duration::from_secs(15))
///     .with_max_failures(5);
/// assert!(config.enabled);
/// ```
#[derive(Debug, Clone)]
pub struct KeepAliveConfig {
    /// Interval between enquire_link PDUs (default: 30 seconds)
    pub interval: Duration,

    /// Timeout for each enquire_link_resp (default: 10 seconds)
    pub timeout: Duration,

    /// Consecutive failures before the session is recorded as failed (default: 3)
    pub max_failures: u32,

    /// When false no enquire_link is sent
    pub enabled: bool,
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            timeout: Duration::from_secs(10),
            max_failures: 3,
            enabled: true,
        }
    }
}

impl KeepAliveConfig {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_failures(mut self, max_failures: u32) -> Self {
        self.max_failures = max_failures.max(1);
        self
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }
}

/// Consecutive failure tracking for one session's keep-alive task.
#[derive(Debug)]
pub(crate) struct KeepAliveTracker {
    max_failures: u32,
    consecutive_failures: u32,
    total_pings: u64,
    total_pongs: u64,
}

impl KeepAliveTracker {
    pub(crate) fn new(config: &KeepAliveConfig) -> Self {
        Self {
            max_failures: config.max_failures,
            consecutive_failures: 0,
            total_pings: 0,
            total_pongs: 0,
        }
    }

    pub(crate) fn on_ping_success(&mut self) {
        self.total_pings += 1;
        self.total_pongs += 1;
        if self.consecutive_failures > 0 {
            debug!(
                failures = self.consecutive_failures,
                "enquire_link answered, resetting failures"
            );
        }
        self.consecutive_failures = 0;
    }

    pub(crate) fn on_ping_failure(&mut self) {
        self.total_pings += 1;
        self.consecutive_failures += 1;
        warn!(
            consecutive_failures = self.consecutive_failures,
            total_pings = self.total_pings,
            total_pongs = self.total_pongs,
            "enquire_link failed"
        );
    }

    pub(crate) fn is_connection_failed(&self) -> bool {
        self.consecutive_failures >= self.max_failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keep_alive_config_defaults() {
        let config = KeepAliveConfig::default();
        assert_eq!(config.interval, Duration::from_secs(30));
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.max_failures, 3);
        assert!(config.enabled);
    }

    #[test]
    fn keep_alive_config_disabled() {
        assert!(!KeepAliveConfig::disabled().enabled);
    }

    #[test]
    fn failure_run_marks_connection_failed() {
        let mut tracker = KeepAliveTracker::new(&KeepAliveConfig::default());

        tracker.on_ping_failure();
        tracker.on_ping_failure();
        assert!(!tracker.is_connection_failed());

        // A single answer resets the run
        tracker.on_ping_success();
        tracker.on_ping_failure();
        tracker.on_ping_failure();
        assert!(!tracker.is_connection_failed());

        tracker.on_ping_failure();
        assert!(tracker.is_connection_failed());
    }
}
