//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Core config struct definitions (Config, ChannelsConfig, CoreConfig)
//! - [`limits`]: Capacity and timing limits (LimitsConfig)
//! - [`validation`]: Startup validation returning every error found

mod limits;
mod types;
mod validation;

pub use limits::LimitsConfig;
pub use types::{
    ChannelsConfig, Config, ConfigError, CoreConfig, DiscordConfig, LogConfig, LogFormat,
    MetricsConfig,
};
pub use validation::{ValidationError, validate};

/// Default config file when nothing else is given.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Resolve the config file path.
///
/// Precedence: `--config <path>` / `--config=<path>`, then the first bare
/// argument, then `CONFIG_PATH`, then [`DEFAULT_CONFIG_PATH`]. `args` must not
/// include the program name.
pub fn resolve_path<I>(args: I, env_path: Option<String>) -> String
where
    I: IntoIterator<Item = String>,
{
    let mut positional = None;
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if let Some(value) = arg.strip_prefix("--config=") {
            return value.to_string();
        }
        if arg == "--config" || arg == "-config" {
            if let Some(value) = args.next() {
                return value;
            }
            continue;
        }
        if positional.is_none() && !arg.starts_with('-') {
            positional = Some(arg);
        }
    }

    positional
        .or(env_path.filter(|p| !p.is_empty()))
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
}
