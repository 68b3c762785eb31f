use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Delay before the first describe call after a table is created.
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 2_500;

/// Delay between two describe calls.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;

/// Describe calls allowed before giving up on activation.
pub const DEFAULT_MAX_POLLS: u32 = 16;

/// Timing of the wait performed after a table is created on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryPolicy {
    /// Wait after issuing the create call, in milliseconds (default: 2,500)
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Wait between polls while the table is transitioning, in milliseconds (default: 2,000)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Maximum number of describe calls (default: 16)
    #[serde(default = "default_max_polls")]
    pub max_polls: u32,
}

fn default_initial_delay_ms() -> u64 {
    DEFAULT_INITIAL_DELAY_MS
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_max_polls() -> u32 {
    DEFAULT_MAX_POLLS
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self {
            initial_delay_ms: DEFAULT_INITIAL_DELAY_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_polls: DEFAULT_MAX_POLLS,
        }
    }
}

impl RecoveryPolicy {
    /// A policy that never sleeps. Polls are still bounded by `max_polls`.
    pub fn immediate(max_polls: u32) -> Self {
        Self {
            initial_delay_ms: 0,
            poll_interval_ms: 0,
            max_polls: max_polls.max(1),
        }
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Upper bound of the time spent waiting for one table to activate.
    pub fn max_wait(&self) -> Duration {
        let polls = u64::from(self.max_polls.saturating_sub(1));
        Duration::from_millis(
            self.initial_delay_ms
                .saturating_add(self.poll_interval_ms.saturating_mul(polls)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RecoveryPolicy::default();

        assert_eq!(policy.initial_delay(), Duration::from_millis(2_500));
        assert_eq!(policy.poll_interval(), Duration::from_secs(2));
        assert_eq!(policy.max_polls, 16);
    }

    #[test]
    fn test_max_wait() {
        let policy = RecoveryPolicy::default();
        // 2.5s initial + 15 intervals of 2s between the 16 polls
        assert_eq!(policy.max_wait(), Duration::from_millis(32_500));
    }

    #[test]
    fn test_max_wait_saturates() {
        let policy = RecoveryPolicy {
            initial_delay_ms: u64::MAX,
            poll_interval_ms: u64::MAX,
            max_polls: u32::MAX,
        };
        assert_eq!(policy.max_wait(), Duration::from_millis(u64::MAX));
    }

    #[test]
    fn test_immediate_policy_has_at_least_one_poll() {
        let policy = RecoveryPolicy::immediate(0);

        assert_eq!(policy.initial_delay(), Duration::ZERO);
        assert_eq!(policy.poll_interval(), Duration::ZERO);
        assert_eq!(policy.max_polls, 1);
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let policy: RecoveryPolicy = serde_json::from_str(r#"{"max_polls": 4}"#).unwrap();

        assert_eq!(policy.max_polls, 4);
        assert_eq!(policy.initial_delay_ms, DEFAULT_INITIAL_DELAY_MS);
        assert_eq!(policy.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
    }
}
