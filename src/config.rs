use core::time::Duration;

use crate::constants::{DEFAULT_SAMPLE_INTERVAL, RECOVERY_DELAY, SETTLE_DELAY};

/// Timing settings for a single S8 client.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Config {
    /// Pause between writing a request and checking for its reply.
    pub settle_delay: Duration,
    /// Pause after reading a reply, before stale output is discarded.
    pub post_read_delay: Duration,
}

impl Config {
    /// Creates a new `Config` instance.
    ///
    /// # Arguments
    ///
    /// * `settle_delay` - Wait after a write before the reply is checked.
    /// * `post_read_delay` - Wait after a reply has been read.
    pub fn new(settle_delay: Duration, post_read_delay: Duration) -> Config {
        Config {
            settle_delay,
            post_read_delay,
        }
    }

    /// Sets the settle delay for the configuration.
    pub fn settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    /// Sets the post-read delay for the configuration.
    pub fn post_read_delay(mut self, post_read_delay: Duration) -> Self {
        self.post_read_delay = post_read_delay;
        self
    }
}

/// The S8 needs roughly 50ms to answer at 9600 baud.
impl Default for Config {
    fn default() -> Config {
        Config {
            settle_delay: SETTLE_DELAY,
            post_read_delay: SETTLE_DELAY,
        }
    }
}

/// Cadence settings for the monitor loop.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Wait between two successful polling cycles.
    pub sample_interval: Duration,
    /// Wait after a cycle that failed with a transient sensor error.
    pub recovery_delay: Duration,
}

impl MonitorConfig {
    /// Creates a new `MonitorConfig` with the default recovery delay.
    ///
    /// # Arguments
    ///
    /// * `sample_interval` - The polling period.
    ///
    /// # Returns
    ///
    /// A new `MonitorConfig` polling every `sample_interval`.
    pub fn new(sample_interval: Duration) -> MonitorConfig {
        MonitorConfig {
            sample_interval,
            recovery_delay: RECOVERY_DELAY,
        }
    }

    /// Sets the sample interval for the configuration.
    pub fn sample_interval(mut self, sample_interval: Duration) -> Self {
        self.sample_interval = sample_interval;
        self
    }

    /// Sets the recovery delay for the configuration.
    pub fn recovery_delay(mut self, recovery_delay: Duration) -> Self {
        self.recovery_delay = recovery_delay;
        self
    }
}

impl Default for MonitorConfig {
    fn default() -> MonitorConfig {
        MonitorConfig::new(DEFAULT_SAMPLE_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.settle_delay, Duration::from_millis(50));
        assert_eq!(config.post_read_delay, Duration::from_millis(50));

        let monitor = MonitorConfig::default();
        assert_eq!(monitor.sample_interval, Duration::from_secs(30));
        assert_eq!(monitor.recovery_delay, Duration::from_secs(5));
    }

    #[test]
    fn test_builder_setters() {
        let config = Config::default()
            .settle_delay(Duration::ZERO)
            .post_read_delay(Duration::from_millis(10));
        assert_eq!(config, Config::new(Duration::ZERO, Duration::from_millis(10)));

        let monitor = MonitorConfig::new(Duration::from_secs(3)).recovery_delay(Duration::from_secs(1));
        assert_eq!(monitor.sample_interval, Duration::from_secs(3));
        assert_eq!(monitor.recovery_delay, Duration::from_secs(1));
    }
}
