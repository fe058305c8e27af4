//! Capacity and timing limits for temporary channels.

use serde::Deserialize;

/// Capacity and timing limits.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Maximum live temporary channels per guild (default: 10).
    /// Slot numbers are drawn from `1..=max_channels_per_guild`.
    #[serde(default = "default_max_channels_per_guild")]
    pub max_channels_per_guild: u32,
    /// Minimum age in seconds before an empty channel may be reclaimed (default: 30).
    #[serde(default = "default_grace_period_seconds")]
    pub grace_period_seconds: u64,
    /// Seconds between sweeper ticks (default: 10).
    #[serde(default = "default_sweep_interval_seconds")]
    pub sweep_interval_seconds: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_channels_per_guild: default_max_channels_per_guild(),
            grace_period_seconds: default_grace_period_seconds(),
            sweep_interval_seconds: default_sweep_interval_seconds(),
        }
    }
}

fn default_max_channels_per_guild() -> u32 {
    10
}

fn default_grace_period_seconds() -> u64 {
    30
}

fn default_sweep_interval_seconds() -> u64 {
    10
}
