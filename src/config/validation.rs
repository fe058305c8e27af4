//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use super::types::NUMBER_PLACEHOLDER;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("discord.token is required (set it in the file or via BOT_TOKEN)")]
    MissingToken,
    #[error("channels.lobby_channel_id is required")]
    MissingLobbyChannel,
    #[error("channels.temp_parent_id is required")]
    MissingParentCategory,
    #[error("channels.position_reference_id is required")]
    MissingPositionReference,
    #[error("channels.name_template must contain {{number}}, got '{0}'")]
    InvalidNameTemplate(String),
    #[error("limits.max_channels_per_guild must be positive")]
    ZeroMaxChannels,
    #[error("limits.sweep_interval_seconds must be positive")]
    ZeroSweepInterval,
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.discord.token.trim().is_empty() {
        errors.push(ValidationError::MissingToken);
    }

    let channels = &config.channels;
    if channels.lobby_channel_id.trim().is_empty() {
        errors.push(ValidationError::MissingLobbyChannel);
    }
    if channels.temp_parent_id.trim().is_empty() {
        errors.push(ValidationError::MissingParentCategory);
    }
    if channels.position_reference_id.trim().is_empty() {
        errors.push(ValidationError::MissingPositionReference);
    }
    if !channels.name_template.contains(NUMBER_PLACEHOLDER) {
        errors.push(ValidationError::InvalidNameTemplate(
            channels.name_template.clone(),
        ));
    }

    if config.limits.max_channels_per_guild == 0 {
        errors.push(ValidationError::ZeroMaxChannels);
    }
    if config.limits.sweep_interval_seconds == 0 {
        errors.push(ValidationError::ZeroSweepInterval);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
