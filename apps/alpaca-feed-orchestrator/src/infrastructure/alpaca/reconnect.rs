//! Reconnection Policy
//!
//! Exponential backoff with jitter between reconnect attempts. The
//! orchestrator itself never retries a live session; callers that want a
//! self-healing stream drive this policy (see `ReconnectSupervisor`).

use std::time::Duration;

use rand::Rng;

use crate::infrastructure::config::ReconnectSettings;

/// Configuration for reconnection behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectConfig {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on any delay.
    pub max_delay: Duration,
    /// Growth factor applied after each retry.
    pub multiplier: f64,
    /// Jitter as a fraction of the delay (0.1 = ±10%).
    pub jitter_factor: f64,
    /// Retries allowed before giving up (0 = unlimited).
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            jitter_factor: 0.1,
            max_attempts: 0,
        }
    }
}

impl From<&ReconnectSettings> for ReconnectConfig {
    fn from(settings: &ReconnectSettings) -> Self {
        Self {
            initial_delay: settings.delay_initial,
            max_delay: settings.delay_max,
            multiplier: settings.delay_multiplier,
            max_attempts: settings.max_attempts,
            ..Self::default()
        }
    }
}

/// Backoff state for one reconnecting session.
///
/// # Example
///
/// ```rust
/// use alpaca_feed_orchestrator::infrastructure::alpaca::reconnect::{ReconnectConfig, ReconnectPolicy};
///
/// let mut policy = ReconnectPolicy::new(ReconnectConfig::default());
/// assert!(policy.next_delay().is_some());
///
/// // Authorized again
/// policy.reset();
/// assert_eq!(policy.attempt_count(), 0);
/// ```
#[derive(Debug)]
pub struct ReconnectPolicy {
    config: ReconnectConfig,
    current_delay: Duration,
    attempt_count: u32,
}

impl ReconnectPolicy {
    /// Create a new reconnection policy.
    #[must_use]
    pub const fn new(config: ReconnectConfig) -> Self {
        let current_delay = config.initial_delay;
        Self {
            config,
            current_delay,
            attempt_count: 0,
        }
    }

    /// Delay before the next retry, or `None` once `max_attempts` is used up.
    #[must_use]
    pub fn next_delay(&mut self) -> Option<Duration> {
        if !self.should_retry() {
            return None;
        }
        self.attempt_count += 1;

        let delay = self.apply_jitter(self.current_delay);
        self.current_delay = self.grow(self.current_delay);

        Some(delay)
    }

    /// Start over after a successful connection.
    pub const fn reset(&mut self) {
        self.current_delay = self.config.initial_delay;
        self.attempt_count = 0;
    }

    /// Retries handed out since the last reset.
    #[must_use]
    pub const fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    /// Check if another retry is allowed.
    #[must_use]
    pub const fn should_retry(&self) -> bool {
        self.config.max_attempts == 0 || self.attempt_count < self.config.max_attempts
    }

    fn grow(&self, delay: Duration) -> Duration {
        let multiplier = if self.config.multiplier.is_finite() && self.config.multiplier > 0.0 {
            self.config.multiplier
        } else {
            1.0
        };
        #[allow(clippy::cast_precision_loss)]
        let grown = (delay.as_millis() as f64 * multiplier).round();
        #[allow(clippy::cast_precision_loss)]
        let max_millis = self.config.max_delay.as_millis() as f64;

        if grown >= max_millis {
            return self.config.max_delay;
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let millis = grown as u64;
        Duration::from_millis(millis)
    }

    fn apply_jitter(&self, delay: Duration) -> Duration {
        if self.config.jitter_factor <= 0.0 || delay.is_zero() {
            return delay;
        }

        #[allow(clippy::cast_precision_loss)]
        let base_millis = delay.as_millis() as f64;
        let range = base_millis * self.config.jitter_factor;
        let jitter: f64 = rand::rng().random_range(-range..=range);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let millis = (base_millis + jitter).max(1.0) as u64;
        Duration::from_millis(millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn without_jitter(initial_ms: u64, max_ms: u64, max_attempts: u32) -> ReconnectConfig {
        ReconnectConfig {
            initial_delay: Duration::from_millis(initial_ms),
            max_delay: Duration::from_millis(max_ms),
            multiplier: 2.0,
            jitter_factor: 0.0,
            max_attempts,
        }
    }

    #[test]
    fn delays_double_until_capped() {
        let mut policy = ReconnectPolicy::new(without_jitter(100, 500, 0));

        let delays: Vec<u128> = (0..5)
            .map(|_| policy.next_delay().unwrap().as_millis())
            .collect();
        assert_eq!(delays, vec![100, 200, 400, 500, 500]);
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let mut policy = ReconnectPolicy::new(without_jitter(10, 100, 2));

        assert!(policy.next_delay().is_some());
        assert!(policy.next_delay().is_some());
        assert!(policy.next_delay().is_none());
        assert!(!policy.should_retry());
        assert_eq!(policy.attempt_count(), 2);
    }

    #[test]
    fn reset_restores_initial_delay() {
        let mut policy = ReconnectPolicy::new(without_jitter(100, 1_000, 3));
        let _ = policy.next_delay();
        let _ = policy.next_delay();

        policy.reset();

        assert_eq!(policy.attempt_count(), 0);
        assert_eq!(policy.next_delay(), Some(Duration::from_millis(100)));
    }

    #[test]
    fn jitter_stays_within_bounds() {
        for _ in 0..100 {
            let mut policy = ReconnectPolicy::new(ReconnectConfig {
                initial_delay: Duration::from_millis(1_000),
                jitter_factor: 0.1,
                ..ReconnectConfig::default()
            });
            let millis = policy.next_delay().unwrap().as_millis();
            assert!((900..=1_100).contains(&millis), "delay {millis}ms out of range");
        }
    }

    #[test]
    fn non_positive_multiplier_keeps_delay_flat() {
        let mut policy = ReconnectPolicy::new(ReconnectConfig {
            multiplier: 0.0,
            ..without_jitter(50, 1_000, 0)
        });
        assert_eq!(policy.next_delay(), Some(Duration::from_millis(50)));
        assert_eq!(policy.next_delay(), Some(Duration::from_millis(50)));
    }

    #[test]
    fn built_from_settings() {
        let settings = ReconnectSettings {
            delay_initial: Duration::from_millis(250),
            delay_max: Duration::from_secs(8),
            delay_multiplier: 3.0,
            max_attempts: 4,
        };
        let config = ReconnectConfig::from(&settings);

        assert_eq!(config.initial_delay, Duration::from_millis(250));
        assert_eq!(config.max_delay, Duration::from_secs(8));
        assert!((config.multiplier - 3.0).abs() < f64::EPSILON);
        assert_eq!(config.max_attempts, 4);
        assert!((config.jitter_factor - 0.1).abs() < f64::EPSILON);
    }
}
