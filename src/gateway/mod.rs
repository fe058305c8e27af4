//! Platform gateway abstraction.
//!
//! The lifecycle core talks to the chat platform only through [`Gateway`].
//! Every call is fallible and may be slow; callers never hold the lifecycle
//! lock across one.

use crate::error::GatewayResult;
use crate::state::{ChannelId, GuildId, UserId};
use async_trait::async_trait;

#[cfg(feature = "discord")]
pub mod discord;

/// Broad channel type as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Voice,
    Text,
    Category,
    Other,
}

/// Point-in-time view of a platform channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelInfo {
    pub kind: ChannelKind,
    pub position: u32,
}

/// A member currently connected to a voice channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceOccupant {
    pub user_id: UserId,
    pub channel_id: ChannelId,
}

/// A voice presence change delivered by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceStateEvent {
    /// `None` for presence outside a guild.
    pub guild_id: Option<GuildId>,
    pub user_id: UserId,
    /// Channel the member is now in; `None` after disconnecting.
    pub channel_id: Option<ChannelId>,
}

#[async_trait]
pub trait Gateway: Send + Sync {
    /// Create a voice channel under `parent_id` at `position`. Returns its id.
    async fn create_voice_channel(
        &self,
        guild_id: &str,
        name: &str,
        parent_id: &str,
        position: u32,
    ) -> GatewayResult<ChannelId>;

    async fn delete_channel(&self, channel_id: &str) -> GatewayResult<()>;

    /// Move a connected member into `channel_id`.
    async fn move_member(&self, guild_id: &str, user_id: &str, channel_id: &str)
    -> GatewayResult<()>;

    /// Look up a channel. A missing channel is `GatewayError::NotFound`.
    async fn get_channel(&self, channel_id: &str) -> GatewayResult<ChannelInfo>;

    /// Every member currently in a voice channel of the guild.
    async fn guild_voice_occupancy(&self, guild_id: &str) -> GatewayResult<Vec<VoiceOccupant>>;
}
