//! In-memory gateway for exercising the lifecycle core.
//!
//! Models just enough of a chat platform: channels with kind and position,
//! per-guild voice presence, and switchable failures for each operation.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tempvoice::error::{GatewayError, GatewayResult};
use tempvoice::gateway::{ChannelInfo, ChannelKind, Gateway, VoiceOccupant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeChannel {
    pub guild_id: String,
    pub name: String,
    pub kind: ChannelKind,
    pub position: u32,
    pub parent_id: Option<String>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Failures {
    pub create: bool,
    pub delete: bool,
    pub move_member: bool,
    /// `get_channel` fails with a transient error (not `NotFound`).
    pub lookup: bool,
    pub occupancy: bool,
}

#[derive(Default)]
struct FakeState {
    next_id: u64,
    channels: HashMap<String, FakeChannel>,
    /// (guild, user) -> channel
    voice: HashMap<(String, String), String>,
    failures: Failures,
    create_delay: Option<Duration>,
    created: Vec<String>,
    deleted: Vec<String>,
    moves: Vec<(String, String)>,
}

#[derive(Default)]
pub struct FakeGateway {
    state: Mutex<FakeState>,
}

#[allow(dead_code)]
impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pre-existing channel (lobby, reference, category...).
    pub fn add_channel(&self, id: &str, guild_id: &str, kind: ChannelKind, position: u32) {
        self.state.lock().channels.insert(
            id.to_string(),
            FakeChannel {
                guild_id: guild_id.to_string(),
                name: id.to_string(),
                kind,
                position,
                parent_id: None,
            },
        );
    }

    /// Delete a channel behind the service's back.
    pub fn remove_channel(&self, id: &str) {
        let mut state = self.state.lock();
        state.channels.remove(id);
        state.voice.retain(|_, channel| channel != id);
    }

    pub fn join_voice(&self, guild_id: &str, user_id: &str, channel_id: &str) {
        self.state
            .lock()
            .voice
            .insert((guild_id.to_string(), user_id.to_string()), channel_id.to_string());
    }

    pub fn leave_voice(&self, guild_id: &str, user_id: &str) {
        self.state
            .lock()
            .voice
            .remove(&(guild_id.to_string(), user_id.to_string()));
    }

    pub fn set_failures(&self, failures: Failures) {
        self.state.lock().failures = failures;
    }

    /// Make `create_voice_channel` yield for `delay` before answering.
    pub fn set_create_delay(&self, delay: Duration) {
        self.state.lock().create_delay = Some(delay);
    }

    pub fn channel(&self, id: &str) -> Option<FakeChannel> {
        self.state.lock().channels.get(id).cloned()
    }

    pub fn voice_channel_of(&self, guild_id: &str, user_id: &str) -> Option<String> {
        self.state
            .lock()
            .voice
            .get(&(guild_id.to_string(), user_id.to_string()))
            .cloned()
    }

    pub fn created(&self) -> Vec<String> {
        self.state.lock().created.clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.state.lock().deleted.clone()
    }

    pub fn moves(&self) -> Vec<(String, String)> {
        self.state.lock().moves.clone()
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn create_voice_channel(
        &self,
        guild_id: &str,
        name: &str,
        parent_id: &str,
        position: u32,
    ) -> GatewayResult<String> {
        let delay = self.state.lock().create_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();
        if state.failures.create {
            return Err(GatewayError::Http("create refused".into()));
        }
        state.next_id += 1;
        let id = format!("{}", 5000 + state.next_id);
        state.channels.insert(
            id.clone(),
            FakeChannel {
                guild_id: guild_id.to_string(),
                name: name.to_string(),
                kind: ChannelKind::Voice,
                position,
                parent_id: Some(parent_id.to_string()),
            },
        );
        state.created.push(id.clone());
        Ok(id)
    }

    async fn delete_channel(&self, channel_id: &str) -> GatewayResult<()> {
        let mut state = self.state.lock();
        if state.failures.delete {
            return Err(GatewayError::Http("delete refused".into()));
        }
        if state.channels.remove(channel_id).is_none() {
            return Err(GatewayError::NotFound);
        }
        state.deleted.push(channel_id.to_string());
        Ok(())
    }

    async fn move_member(&self, guild_id: &str, user_id: &str, channel_id: &str) -> GatewayResult<()> {
        let mut state = self.state.lock();
        if state.failures.move_member {
            return Err(GatewayError::Http("move refused".into()));
        }
        if !state.channels.contains_key(channel_id) {
            return Err(GatewayError::NotFound);
        }
        state
            .voice
            .insert((guild_id.to_string(), user_id.to_string()), channel_id.to_string());
        state.moves.push((user_id.to_string(), channel_id.to_string()));
        Ok(())
    }

    async fn get_channel(&self, channel_id: &str) -> GatewayResult<ChannelInfo> {
        let state = self.state.lock();
        if state.failures.lookup {
            return Err(GatewayError::Http("lookup timed out".into()));
        }
        state
            .channels
            .get(channel_id)
            .map(|c| ChannelInfo {
                kind: c.kind,
                position: c.position,
            })
            .ok_or(GatewayError::NotFound)
    }

    async fn guild_voice_occupancy(&self, guild_id: &str) -> GatewayResult<Vec<VoiceOccupant>> {
        let state = self.state.lock();
        if state.failures.occupancy {
            return Err(GatewayError::MissingCache(guild_id.to_string()));
        }
        Ok(state
            .voice
            .iter()
            .filter(|((guild, _), _)| guild == guild_id)
            .map(|((_, user), channel)| VoiceOccupant {
                user_id: user.clone(),
                channel_id: channel.clone(),
            })
            .collect())
    }
}
