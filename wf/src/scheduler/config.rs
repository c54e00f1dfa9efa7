//! Scheduler configuration

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Conflict resolution settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Minimum gap between two kept items
    #[serde(rename = "buffer-minutes", default = "default_buffer_minutes")]
    pub buffer_minutes: i64,

    /// Assumed length of an item without a usable end time
    #[serde(rename = "default-duration-minutes", default = "default_duration_minutes")]
    pub default_duration_minutes: i64,
}

fn default_buffer_minutes() -> i64 {
    30
}

fn default_duration_minutes() -> i64 {
    90
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            buffer_minutes: default_buffer_minutes(),
            default_duration_minutes: default_duration_minutes(),
        }
    }
}

impl SchedulerConfig {
    /// Get the buffer as a Duration; negative values count as zero
    pub fn buffer(&self) -> Duration {
        Duration::minutes(self.buffer_minutes.max(0))
    }

    /// Get the assumed item length as a Duration; negative values count as zero
    pub fn default_duration(&self) -> Duration {
        Duration::minutes(self.default_duration_minutes.max(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SchedulerConfig::default();
        assert_eq!(config.buffer_minutes, 30);
        assert_eq!(config.default_duration_minutes, 90);
        assert_eq!(config.buffer(), Duration::minutes(30));
    }

    #[test]
    fn test_negative_values_clamped() {
        let config = SchedulerConfig {
            buffer_minutes: -5,
            default_duration_minutes: -1,
        };
        assert_eq!(config.buffer(), Duration::zero());
        assert_eq!(config.default_duration(), Duration::zero());
    }
}
