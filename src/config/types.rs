//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::limits::LimitsConfig;

/// Placeholder replaced by the slot number in `channels.name_template`.
pub const NUMBER_PLACEHOLDER: &str = "{number}";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Chat platform session settings.
    #[serde(default)]
    pub discord: DiscordConfig,
    /// Lobby and placement of temporary channels.
    pub channels: ChannelsConfig,
    /// Capacity and timing limits.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Prometheus endpoint.
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// Log output.
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Replace the bot token when one is supplied out of band (e.g. `BOT_TOKEN`).
    ///
    /// Empty overrides are ignored so an unset-but-exported variable does not
    /// wipe a token from the file.
    pub fn apply_token_override(&mut self, token: Option<String>) {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.discord.token = token;
        }
    }

    /// Build the immutable view consumed by the lobby handler and sweeper.
    pub fn core(&self) -> Arc<CoreConfig> {
        Arc::new(CoreConfig {
            lobby_channel_id: self.channels.lobby_channel_id.clone(),
            temp_parent_id: self.channels.temp_parent_id.clone(),
            position_reference_id: self.channels.position_reference_id.clone(),
            name_template: self.channels.name_template.clone(),
            max_channels_per_guild: self.limits.max_channels_per_guild,
            grace_period: Duration::from_secs(self.limits.grace_period_seconds),
            sweep_interval: Duration::from_secs(self.limits.sweep_interval_seconds),
        })
    }
}

/// Chat platform session configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiscordConfig {
    /// Bot token. May be left empty in the file and provided via `BOT_TOKEN`.
    #[serde(default)]
    pub token: String,
}

/// Channel placement configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelsConfig {
    /// Voice channel whose entry triggers provisioning.
    pub lobby_channel_id: String,
    /// Category new temporary channels are created under.
    pub temp_parent_id: String,
    /// Channel new temporary channels are placed right after.
    pub position_reference_id: String,
    /// Display name template; `{number}` is replaced by the slot number.
    #[serde(default = "default_name_template")]
    pub name_template: String,
}

fn default_name_template() -> String {
    "Voice #{number}".to_string()
}

/// Prometheus metrics configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// HTTP port for `/metrics` (default: 9090). 0 disables the endpoint.
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            port: default_metrics_port(),
        }
    }
}

fn default_metrics_port() -> u16 {
    9090
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogConfig {
    #[serde(default)]
    pub format: LogFormat,
}

/// Immutable configuration shared by the lifecycle core.
///
/// Built once at startup; handlers never re-read the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub lobby_channel_id: String,
    pub temp_parent_id: String,
    pub position_reference_id: String,
    pub name_template: String,
    pub max_channels_per_guild: u32,
    pub grace_period: Duration,
    pub sweep_interval: Duration,
}

impl CoreConfig {
    /// Display name for the temporary channel holding `number`.
    pub fn channel_name(&self, number: u32) -> String {
        self.name_template
            .replace(NUMBER_PLACEHOLDER, &number.to_string())
    }
}
