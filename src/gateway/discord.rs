//! Discord adapter.
//!
//! [`DiscordGateway`] implements [`Gateway`] over serenity's HTTP client and
//! cache. [`VoiceEvents`] receives gateway events, builds the lobby handler
//! once the session is ready, and starts the sweeper.

use crate::config::CoreConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{ChannelInfo, ChannelKind, Gateway, VoiceOccupant, VoiceStateEvent};
use crate::handlers::LobbyHandler;
use crate::services::{Sweeper, spawn_sweeper_task};
use crate::state::Lifecycle;
use async_trait::async_trait;
use serenity::all::{
    Cache, Channel, ChannelId, ChannelType, Client, Context, CreateChannel, EventHandler,
    GatewayIntents, GuildId, Http, Ready, UserId, VoiceState,
};
use std::sync::{Arc, OnceLock};
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Intents the service needs: guild structure and voice presence.
pub fn intents() -> GatewayIntents {
    GatewayIntents::GUILDS | GatewayIntents::GUILD_VOICE_STATES
}

fn parse_snowflake(raw: &str) -> GatewayResult<u64> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .ok_or_else(|| GatewayError::InvalidId(raw.to_string()))
}

fn parse_guild(raw: &str) -> GatewayResult<GuildId> {
    parse_snowflake(raw).map(GuildId::new)
}

fn parse_channel(raw: &str) -> GatewayResult<ChannelId> {
    parse_snowflake(raw).map(ChannelId::new)
}

fn parse_user(raw: &str) -> GatewayResult<UserId> {
    parse_snowflake(raw).map(UserId::new)
}

fn map_err(err: serenity::Error) -> GatewayError {
    if let serenity::Error::Http(http_err) = &err
        && http_err.status_code().is_some_and(|s| s.as_u16() == 404)
    {
        return GatewayError::NotFound;
    }
    GatewayError::Http(err.to_string())
}

fn kind_of(kind: ChannelType) -> ChannelKind {
    match kind {
        ChannelType::Voice => ChannelKind::Voice,
        ChannelType::Text | ChannelType::News => ChannelKind::Text,
        ChannelType::Category => ChannelKind::Category,
        _ => ChannelKind::Other,
    }
}

/// [`Gateway`] backed by the Discord REST API and the session cache.
pub struct DiscordGateway {
    http: Arc<Http>,
    cache: Arc<Cache>,
}

impl DiscordGateway {
    pub fn new(http: Arc<Http>, cache: Arc<Cache>) -> Self {
        Self { http, cache }
    }
}

#[async_trait]
impl Gateway for DiscordGateway {
    async fn create_voice_channel(
        &self,
        guild_id: &str,
        name: &str,
        parent_id: &str,
        position: u32,
    ) -> GatewayResult<String> {
        let guild = parse_guild(guild_id)?;
        let position = u16::try_from(position).unwrap_or(u16::MAX);
        let mut builder = CreateChannel::new(name)
            .kind(ChannelType::Voice)
            .position(position);
        if !parent_id.is_empty() {
            builder = builder.category(parse_channel(parent_id)?);
        }
        let channel = guild
            .create_channel(&*self.http, builder)
            .await
            .map_err(map_err)?;
        Ok(channel.id.to_string())
    }

    async fn delete_channel(&self, channel_id: &str) -> GatewayResult<()> {
        parse_channel(channel_id)?
            .delete(&*self.http)
            .await
            .map_err(map_err)?;
        Ok(())
    }

    async fn move_member(&self, guild_id: &str, user_id: &str, channel_id: &str) -> GatewayResult<()> {
        let guild = parse_guild(guild_id)?;
        let user = parse_user(user_id)?;
        let channel = parse_channel(channel_id)?;
        guild
            .move_member(&*self.http, user, channel)
            .await
            .map_err(map_err)?;
        Ok(())
    }

    async fn get_channel(&self, channel_id: &str) -> GatewayResult<ChannelInfo> {
        let id = parse_channel(channel_id)?;
        let channel = self.http.get_channel(id).await.map_err(map_err)?;
        Ok(match channel {
            Channel::Guild(gc) => ChannelInfo {
                kind: kind_of(gc.kind),
                position: u32::from(gc.position),
            },
            _ => ChannelInfo {
                kind: ChannelKind::Other,
                position: 0,
            },
        })
    }

    async fn guild_voice_occupancy(&self, guild_id: &str) -> GatewayResult<Vec<VoiceOccupant>> {
        let guild = parse_guild(guild_id)?;
        let Some(cached) = self.cache.guild(guild) else {
            return Err(GatewayError::MissingCache(guild_id.to_string()));
        };
        let occupants = cached
            .voice_states
            .values()
            .filter_map(|vs| {
                vs.channel_id.map(|channel| VoiceOccupant {
                    user_id: vs.user_id.to_string(),
                    channel_id: channel.to_string(),
                })
            })
            .collect();
        Ok(occupants)
    }
}

/// Event handler forwarding voice state changes to the lobby handler.
pub struct VoiceEvents {
    lifecycle: Arc<Lifecycle>,
    config: Arc<CoreConfig>,
    shutdown_tx: broadcast::Sender<()>,
    handler: OnceLock<Arc<LobbyHandler>>,
}

impl VoiceEvents {
    pub fn new(
        lifecycle: Arc<Lifecycle>,
        config: Arc<CoreConfig>,
        shutdown_tx: broadcast::Sender<()>,
    ) -> Self {
        Self {
            lifecycle,
            config,
            shutdown_tx,
            handler: OnceLock::new(),
        }
    }
}

#[async_trait]
impl EventHandler for VoiceEvents {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(user = %ready.user.name, guilds = ready.guilds.len(), "Connected to Discord");

        // Reconnects fire `ready` again; wiring happens once.
        if self.handler.get().is_some() {
            return;
        }
        let gateway: Arc<dyn Gateway> =
            Arc::new(DiscordGateway::new(ctx.http.clone(), ctx.cache.clone()));
        let handler = Arc::new(LobbyHandler::new(
            Arc::clone(&self.lifecycle),
            Arc::clone(&gateway),
            Arc::clone(&self.config),
        ));
        if self.handler.set(handler).is_err() {
            return;
        }

        let sweeper = Arc::new(Sweeper::new(
            Arc::clone(&self.lifecycle),
            gateway,
            Arc::clone(&self.config),
        ));
        spawn_sweeper_task(sweeper, self.config.sweep_interval, self.shutdown_tx.subscribe());
        info!(
            interval_secs = self.config.sweep_interval.as_secs(),
            grace_secs = self.config.grace_period.as_secs(),
            "Sweeper task started"
        );
    }

    async fn voice_state_update(&self, _ctx: Context, _old: Option<VoiceState>, new: VoiceState) {
        let Some(handler) = self.handler.get() else {
            debug!("Voice state update before ready, dropping");
            return;
        };
        let event = VoiceStateEvent {
            guild_id: new.guild_id.map(|g| g.to_string()),
            user_id: new.user_id.to_string(),
            channel_id: new.channel_id.map(|c| c.to_string()),
        };
        handler.handle(&event).await;
    }
}

/// Connect to Discord and process events until shutdown is broadcast.
pub async fn run(
    token: &str,
    lifecycle: Arc<Lifecycle>,
    config: Arc<CoreConfig>,
    shutdown_tx: broadcast::Sender<()>,
) -> serenity::Result<()> {
    let events = VoiceEvents::new(lifecycle, config, shutdown_tx.clone());
    let mut client = Client::builder(token, intents())
        .event_handler(events)
        .await?;

    let shard_manager = Arc::clone(&client.shard_manager);
    let mut shutdown_rx = shutdown_tx.subscribe();
    tokio::spawn(async move {
        let _ = shutdown_rx.recv().await;
        info!("Shutting down Discord shards");
        shard_manager.shutdown_all().await;
    });

    client.start().await
}
